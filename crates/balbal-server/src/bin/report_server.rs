//! Runs the error report endpoint
//!
//! Configuration comes from `BALBAL_*` environment variables; log output
//! is controlled with `RUST_LOG` (default `info`).

use std::net::SocketAddr;

use anyhow::Context;
use balbal_conf::Settings;
use balbal_report::ErrorReporter;
use balbal_server::{HttpServer, report_service};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let settings = Settings::load().context("failed to load settings")?;
	if settings.reporting.recipient.is_none() && settings.reporting.endpoint_url.is_none() {
		tracing::warn!("no report recipient configured, reports will be rejected");
	}

	let reporter =
		ErrorReporter::from_settings(&settings.reporting).context("failed to set up report delivery")?;
	let addr: SocketAddr = settings
		.server
		.bind_address
		.parse()
		.with_context(|| format!("invalid bind address {}", settings.server.bind_address))?;
	let listener = TcpListener::bind(addr)
		.await
		.with_context(|| format!("failed to bind {}", addr))?;

	HttpServer::new(report_service(&settings, reporter))
		.serve(listener, async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "failed to listen for shutdown signal");
				std::future::pending::<()>().await;
			}
		})
		.await?;
	Ok(())
}
