//! studentbox CLI - per-user, per-project container environments

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use studentbox_cli::cli::Cli;
use studentbox_cli::commands::error_code;
use studentbox_cli::output::json;

/// Environment variable holding the log filter, e.g. `studentbox=debug`.
const LOG_ENV: &str = "STUDENTBOX_LOG";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let rendered = json_mode
                .then(|| json::format_error(&format!("{e:#}"), error_code(&e)).ok())
                .flatten();
            match rendered {
                Some(doc) => println!("{doc}"),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
