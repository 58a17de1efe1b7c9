#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = motionscope::run_from_env() {
        eprintln!("motionscope: {error}");
        std::process::exit(error.exit_code());
    }
}
