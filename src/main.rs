//! Application entry point for the `omada-traffic-collector` job.
//!
//! One invocation performs a single collection pass:
//! - Loading configuration from `config.env` / `.env` / the environment
//! - Initializing structured logging/tracing
//! - Connecting to InfluxDB (fatal on failure)
//! - Collecting the trailing window from every deployment
//!
//! # Environment Variables
//! See [`omada_traffic_collector::config::load_from_env`] for the full list.
//! Logging:
//! - `COLLECTOR_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `COLLECTOR_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, io::IsTerminal};

use anyhow::Result;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use omada_traffic_collector::{config, Collector, InfluxSink};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenvy::from_filename("config.env").ok();
    dotenvy::dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Connecting to InfluxDB: {}", cfg.sink.url);
    let sink = InfluxSink::connect(&cfg.sink).await?;
    tracing::info!("Successfully connected to InfluxDB");

    let summary = Collector::new(&cfg, &sink).run().await;
    summary.log_summary();

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var
/// - Span event emission mode controlled by `COLLECTOR_SPAN_EVENTS`:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - `"close"`      : emit CLOSE events only
///   - unset or other values: no span events (default)
/// - Log level from `RUST_LOG`, else `COLLECTOR_LOG_LEVEL`
fn init_tracing() {
    // ---
    let span_events = match env::var("COLLECTOR_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        Ok("close") => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("COLLECTOR_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
