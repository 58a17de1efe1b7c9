//! `motionscope inspect`: summarize a trace without replaying it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use motionscope_core::trace::{StepKind, TraceFile};
use serde::Serialize;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    pub trace: PathBuf,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub session_name: Option<String>,
    pub initial_view: Option<String>,
    pub duration_ms: u64,
    pub inputs: BTreeMap<&'static str, usize>,
    pub view_switches: usize,
    pub advances: usize,
}

#[must_use]
pub fn summarize(trace: &TraceFile) -> TraceSummary {
    let mut inputs = BTreeMap::new();
    let mut view_switches = 0;
    let mut advances = 0;
    for step in trace.steps() {
        match step.kind {
            StepKind::Input(input) => *inputs.entry(input.name()).or_insert(0) += 1,
            StepKind::View(_) => view_switches += 1,
            StepKind::Advance => advances += 1,
        }
    }
    TraceSummary {
        session_name: trace.session_name().map(str::to_string),
        initial_view: trace.initial_view().map(|v| v.to_string()),
        duration_ms: trace.duration_ms(),
        inputs,
        view_switches,
        advances,
    }
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let trace = TraceFile::open(&args.trace).map_err(|e| CliError::trace(&args.trace, e))?;
    let summary = summarize(&trace);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!(
        "{} ({}ms, view {})",
        summary.session_name.as_deref().unwrap_or("(unnamed)"),
        summary.duration_ms,
        summary.initial_view.as_deref().unwrap_or("debug"),
    );
    for (name, count) in &summary.inputs {
        println!("  {name:<16} {count}");
    }
    println!("  view switches    {}", summary.view_switches);
    println!("  advances         {}", summary.advances);
    Ok(())
}
