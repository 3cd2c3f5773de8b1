//! twemproxy-exporter — Prometheus exporter for twemproxy.
//!
//! Serves the twemproxy stats port as Prometheus metrics. Each scrape of
//! the telemetry path opens one connection to the stats port, decodes the
//! JSON document and renders it; nothing is cached between scrapes.
//!
//! # Usage
//!
//! ```text
//! twemproxy-exporter --twemproxy.stats-address cache-01:22222 --web.listen-address :9151
//! twemproxy-exporter --config /etc/twemproxy-exporter.toml --log-format json
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use twemproxy_metrics::Exporter;

use crate::config::{ExporterConfig, FileConfig, Overrides};

#[derive(Parser)]
#[command(name = "twemproxy-exporter", version, about = "Prometheus exporter for twemproxy")]
struct Cli {
    /// Address of the twemproxy stats port (host:port). [default: localhost:22222]
    #[arg(long = "twemproxy.stats-address", value_name = "ADDR")]
    stats_address: Option<String>,

    /// Timeout for one stats fetch, e.g. 500ms, 2s or 1m30s; no fractions. [default: 2s]
    #[arg(long = "twemproxy.timeout", value_name = "DURATION")]
    timeout: Option<String>,

    /// Address to serve HTTP on. [default: :9151]
    #[arg(long = "web.listen-address", value_name = "ADDR")]
    listen_address: Option<String>,

    /// Path under which metrics are exposed. [default: /metrics]
    #[arg(long = "web.telemetry-path", value_name = "PATH")]
    telemetry_path: Option<String>,

    /// TOML config file. Flags take precedence over its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            stats_address: self.stats_address.clone(),
            timeout: self.timeout.clone(),
            listen_address: self.listen_address.clone(),
            telemetry_path: self.telemetry_path.clone(),
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,twemproxy=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let file = cli
        .config
        .as_deref()
        .map(FileConfig::from_file)
        .transpose()
        .context("loading config file")?;
    let config = ExporterConfig::resolve(cli.overrides(), file)?;

    run(config).await
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "twemproxy exporter starting");

    let exporter = Arc::new(Exporter::new(config.stats_address.clone(), config.timeout));
    info!(
        endpoint = exporter.endpoint(),
        timeout = ?exporter.timeout(),
        "polling twemproxy stats port"
    );

    let router = twemproxy_api::build_router(exporter, &config.telemetry_path);

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("binding {}", config.listen_address))?;
    let addr = listener.local_addr()?;
    info!(%addr, path = %config.telemetry_path, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler: run until the process is killed.
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("twemproxy exporter stopped");
    Ok(())
}
