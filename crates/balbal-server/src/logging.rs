use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ServerResult;
use crate::http::{Request, Response};
use crate::middleware::{Handler, Middleware};

/// Logs method, path, status and duration of every request
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for LoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> ServerResult<Response> {
		let start = Utc::now();
		let method = request.method.clone();
		let path = request.path().to_string();
		let request_id = request.request_id().map(str::to_string);

		let result = next.handle(request).await;
		let elapsed_ms = Utc::now()
			.signed_duration_since(start)
			.num_milliseconds();

		match &result {
			Ok(response) => tracing::info!(
				%method,
				%path,
				status = response.status.as_u16(),
				elapsed_ms,
				request_id = request_id.as_deref().unwrap_or("-"),
				"request handled"
			),
			Err(e) => tracing::error!(
				%method,
				%path,
				elapsed_ms,
				error = %e,
				"request failed"
			),
		}
		result
	}
}
