use clap::Parser;
use deskbroom::cli::{Cli, run};
use deskbroom::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            OutputFormatter::error(&message);
            ExitCode::FAILURE
        }
    }
}
