use clap::Parser;
use rsimacd::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
