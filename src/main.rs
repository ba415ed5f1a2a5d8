//! pkgscout - Package version tool server
//!
//! Serves the tool catalogue over a line-delimited stdio boundary.
//! Logs go to a rotated file (never stdout, which carries replies);
//! `--log-stderr` mirrors them for interactive debugging.

use clap::Parser;
use pkgscout::cache::TtlCache;
use pkgscout::cli::CliArgs;
use pkgscout::handlers::HandlerContext;
use pkgscout::registry::HttpClient;
use pkgscout::server::{serve_stdio, ToolRegistry};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let log_dir = args.resolved_log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "pkgscout.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false),
    );
    if args.log_stderr {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber.init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "starting pkgscout"
    );

    let http = HttpClient::with_config(
        Duration::from_secs(args.timeout_secs),
        concat!("pkgscout/", env!("CARGO_PKG_VERSION")),
    )?;
    let cache = Arc::new(TtlCache::with_ttl(Duration::from_secs(
        args.ttl_hours * 60 * 60,
    )));
    let registry = ToolRegistry::new(HandlerContext::new(http, cache));

    // A non-compliant catalogue would be rejected by clients anyway;
    // refuse to start instead.
    registry.verify_schemas()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { serve_stdio(&registry).await })?;

    Ok(())
}
