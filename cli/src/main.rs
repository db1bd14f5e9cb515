use std::process::ExitCode;

use clap::Parser;
use log::error;
use ols_cli::Cli;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
