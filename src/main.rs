use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sentry_provider::logging::{init_logging_with_default, DEFAULT_LOG_LEVEL};
use sentry_provider::{serve_with_options, SentryProvider, ServeOptions};

#[derive(Debug, Parser)]
#[command(
    name = "terraform-provider-sentry",
    about = "Provider plugin for Sentry cron monitors and dashboards",
    version
)]
struct Cli {
    /// Listen on a fixed address instead of a random local port.
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, value_name = "FILTER", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging_with_default(&cli.log_level);

    let shutdown_timeout = Duration::from_secs(cli.shutdown_timeout);
    let mut options = ServeOptions::new().with_shutdown_timeout(shutdown_timeout);
    if let Some(addr) = cli.listen {
        options = options.with_listen(addr);
    }

    match serve_with_options(SentryProvider::new(), options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Provider server failed");
            ExitCode::FAILURE
        },
    }
}
