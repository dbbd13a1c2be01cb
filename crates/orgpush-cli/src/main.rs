//! orgpush CLI - Main entry point

use clap::Parser;
use orgpush_cli::Cli;
use orgpush_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env entries become environment before clap reads env-backed flags
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(command) = cli.command.as_ref() else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("orgpush-cli")
        .build();

    // LOG_* variables take precedence over the flag-derived defaults
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // Dropping the guard flushes file logs
    let guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = orgpush_cli::commands::execute(&cli, command).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        drop(guard);
        process::exit(1);
    }
}
