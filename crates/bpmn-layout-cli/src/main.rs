//! bpmn-layout CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use bpmn_layout_cli::{Args, CliError, error_adapter::to_reportables};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    // Exits with code 2 on a usage error
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting bpmn-layout");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = bpmn_layout_cli::run(&args) {
        match &err {
            CliError::Usage(message) => eprintln!("error: {message}"),
            CliError::Run(err) => {
                let reporter = miette::GraphicalReportHandler::new();
                for reportable in to_reportables(err) {
                    let mut writer = String::new();
                    reporter
                        .render_report(&mut writer, &reportable)
                        .expect("Writing to String buffer is infallible");
                    error!("{writer}");
                }
            }
        }
        process::exit(err.exit_code());
    }

    info!("Completed successfully");
}
