//! Settle CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use settle_cli::{Args, error_adapter::to_report};

fn main() {
    miette::set_panic_hook();

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

    info!(log_level:?; "Starting Settle");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = settle_cli::run(&args) {
        let reporter = miette::GraphicalReportHandler::new();
        let mut writer = String::new();
        match reporter.render_report(&mut writer, &to_report(&err)) {
            Ok(()) => error!("{writer}"),
            Err(_) => error!(err:% = err; "Failed"),
        }

        process::exit(1);
    }

    info!("Completed successfully");
}
