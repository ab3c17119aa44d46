use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = cli::Cli::parse();
    match commands::run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::from(commands::exit_code(&err))
        }
    }
}
