//! HTTP/1.1 server
//!
//! Buffers each request body (bounded), passes the request to a
//! [`Handler`] and writes the response back. Handler errors become a JSON
//! `500`. Shutdown stops accepting connections and waits, up to a timeout,
//! for in-flight ones to finish.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use serde_json::json;
use tokio::net::TcpListener;

use crate::error::{ServerError, ServerResult};
use crate::http::{Request, Response};
use crate::middleware::Handler;

/// Default maximum request body size (1 MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpServer {
	handler: Arc<dyn Handler>,
	max_body_size: usize,
	shutdown_timeout: Duration,
}

impl HttpServer {
	pub fn new<H: Handler + 'static>(handler: H) -> Self {
		Self {
			handler: Arc::new(handler),
			max_body_size: DEFAULT_MAX_BODY_SIZE,
			shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
		}
	}

	pub fn with_max_body_size(mut self, bytes: usize) -> Self {
		self.max_body_size = bytes;
		self
	}

	pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
		self.shutdown_timeout = timeout;
		self
	}

	/// Bind `addr` and serve until the process is stopped
	pub async fn listen(self, addr: SocketAddr) -> ServerResult<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, std::future::pending()).await
	}

	/// Serve connections from `listener` until `shutdown` completes
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
	where
		F: Future<Output = ()>,
	{
		let local_addr = listener.local_addr()?;
		tracing::info!(address = %local_addr, "report server listening");

		let graceful = GracefulShutdown::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, peer) = match accepted {
						Ok(accepted) => accepted,
						Err(e) => {
							tracing::warn!(error = %e, "failed to accept connection");
							continue;
						}
					};
					let service = RequestService {
						handler: self.handler.clone(),
						max_body_size: self.max_body_size,
					};
					let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
					let connection = graceful.watch(connection);
					tokio::spawn(async move {
						if let Err(e) = connection.await {
							tracing::debug!(peer = %peer, error = %e, "connection closed with error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, draining connections");
					break;
				}
			}
		}

		drop(listener);
		tokio::select! {
			_ = graceful.shutdown() => tracing::info!("report server stopped"),
			_ = tokio::time::sleep(self.shutdown_timeout) => {
				tracing::warn!(timeout_secs = self.shutdown_timeout.as_secs(), "connections still open after shutdown timeout");
			}
		}
		Ok(())
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	max_body_size: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = ServerError;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let max_body_size = self.max_body_size;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = match Limited::new(body, max_body_size).collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(_) => {
					let response = Response::new(StatusCode::PAYLOAD_TOO_LARGE).with_json(&json!({
						"success": false,
						"error": "Request body too large",
					}))?;
					return into_hyper(response);
				}
			};

			let request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body);
			let response = match handler.handle(request).await {
				Ok(response) => response,
				Err(e) => {
					tracing::error!(error = %e, "handler failed");
					Response::internal_server_error().with_json(&json!({
						"success": false,
						"error": e.to_string(),
					}))?
				}
			};
			into_hyper(response)
		})
	}
}

fn into_hyper(response: Response) -> ServerResult<hyper::Response<Full<Bytes>>> {
	let mut builder = hyper::Response::builder().status(response.status);
	if let Some(headers) = builder.headers_mut() {
		headers.extend(response.headers);
	}
	Ok(builder.body(Full::new(response.body))?)
}
