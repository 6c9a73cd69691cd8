//! CLI entry point for the agricultural price crawler.
//!
//! Without arguments, runs the built-in demo scenario. With
//! `--start_time`, `--end_time` and `--product_name`, runs once for those
//! parameters and prints a single JSON result line on stdout. Logs go to
//! stderr so stdout stays machine-readable.

use std::io::{self, Write};
use std::process::ExitCode;

use agri_price_crawler::cli::{self, Cli, ServiceOutcome};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    let crawler = args.crawler();

    let mut stdout = io::stdout().lock();
    let code = match args.service_args() {
        Some(service) => match crawler {
            Ok(crawler) => {
                tracing::debug!(%crawler, "service run");
                cli::run_service(&crawler, &service, &mut stdout)
            }
            Err(e) => {
                let outcome = ServiceOutcome::Error(e.to_string());
                let _ = writeln!(stdout, "{}", outcome.to_line());
                outcome.exit_code()
            }
        },
        None => match crawler {
            Ok(crawler) => {
                tracing::debug!(%crawler, "demo run");
                let today = chrono::Local::now().date_naive();
                cli::run_demo(&crawler, today, &args.run_options(), &mut stdout)
            }
            Err(e) => {
                let _ = writeln!(stdout, "Error: {}", e);
                0
            }
        },
    };

    ExitCode::from(code as u8)
}
