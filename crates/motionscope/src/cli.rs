use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config_cmd::{ConfigArgs, run_config};
use crate::error::Result;
use crate::inspect::{InspectArgs, run_inspect};
use crate::replay::{ReplayArgs, run_replay};

#[derive(Debug, Parser)]
#[command(
    name = "motionscope",
    about = "Replay recorded scroll, zoom and gesture input through the MotionScope engine",
    version
)]
pub struct Cli {
    /// More diagnostics on stderr (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a JSONL input trace and print the resulting log and motions.
    Replay(ReplayArgs),

    /// Summarize a trace without replaying it.
    Inspect(InspectArgs),

    /// Print or validate engine configuration.
    Config(ConfigArgs),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Replay(args) => run_replay(args),
        Commands::Inspect(args) => run_inspect(args),
        Commands::Config(args) => run_config(args),
    }
}
