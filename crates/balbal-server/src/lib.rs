//! # BalBal Server
//!
//! The HTTP endpoint that receives error reports from preview pages and
//! forwards them through an [`ErrorReporter`].
//!
//! - `OPTIONS` answers `204` with permissive CORS headers
//! - `POST` with a report body answers `200` on delivery, `500` otherwise
//! - any other method answers `405`
//!
//! Every response carries CORS headers and an `X-Request-ID`.
//!
//! ```rust,ignore
//! use balbal_server::{HttpServer, report_service};
//!
//! let settings = balbal_conf::Settings::load()?;
//! let reporter = balbal_report::ErrorReporter::from_settings(&settings.reporting)?;
//! let addr = settings.server.bind_address.parse()?;
//! HttpServer::new(report_service(&settings, reporter)).listen(addr).await?;
//! ```

use std::sync::Arc;

use balbal_conf::Settings;
use balbal_report::ErrorReporter;

pub mod cors;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod server;

pub use cors::{CorsConfig, CorsMiddleware, RequestIdMiddleware};
pub use error::{ServerError, ServerResult};
pub use handler::ReportHandler;
pub use http::{REQUEST_ID_HEADER, Request, Response};
pub use logging::LoggingMiddleware;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use router::Router;
pub use server::HttpServer;

/// The complete endpoint: report handler on every configured path behind
/// request-id, logging and CORS middleware
pub fn report_service(settings: &Settings, reporter: ErrorReporter) -> MiddlewareChain {
	let handler = Arc::new(ReportHandler::new(
		reporter,
		settings.reporting.environment,
	));
	let router = Router::new().routes(settings.server.report_paths.iter().cloned(), handler);

	MiddlewareChain::new(Arc::new(router))
		.with_middleware(Arc::new(RequestIdMiddleware::new()))
		.with_middleware(Arc::new(LoggingMiddleware::new()))
		.with_middleware(Arc::new(CorsMiddleware::permissive()))
}
