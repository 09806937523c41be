use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;

use fl_aitp::fl_cli::Cli;
use fl_aitp::HarnessRunner;

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("logger init failed: {}", e);
    }

    let cli = Cli::parse();

    let (params, scenario) = match cli.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runner = match HarnessRunner::new(params, scenario) {
        Ok(runner) => runner,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match runner.run() {
        Ok(result) => {
            result.print_summary();
            // failed CSV writes are logged, the run still counts
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
