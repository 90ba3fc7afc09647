//! CORS and request-id middleware

use std::sync::Arc;

use async_trait::async_trait;
use balbal_core::generate_request_id;
use http::Method;
use http::header::{
	ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
	ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, HeaderName, HeaderValue,
};

use crate::error::ServerResult;
use crate::http::{REQUEST_ID_HEADER, Request, Response};
use crate::middleware::{Handler, Middleware};

/// CORS middleware configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
	pub allow_origins: Vec<String>,
	pub allow_methods: Vec<String>,
	pub allow_headers: Vec<String>,
	pub allow_credentials: bool,
	pub max_age: Option<u64>,
}

impl Default for CorsConfig {
	/// Any origin may post reports
	fn default() -> Self {
		Self {
			allow_origins: vec!["*".to_string()],
			allow_methods: vec!["POST".to_string(), "OPTIONS".to_string()],
			allow_headers: vec!["*".to_string()],
			allow_credentials: false,
			max_age: Some(86_400),
		}
	}
}

/// Answers preflight requests and adds CORS headers to every response
pub struct CorsMiddleware {
	config: CorsConfig,
}

impl CorsMiddleware {
	pub fn new(config: CorsConfig) -> Self {
		Self { config }
	}

	pub fn permissive() -> Self {
		Self::new(CorsConfig::default())
	}

	pub fn config(&self) -> &CorsConfig {
		&self.config
	}

	fn apply(&self, response: &mut Response) -> ServerResult<()> {
		response.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, &self.config.allow_origins.join(", "))?;
		response.set_header(ACCESS_CONTROL_ALLOW_METHODS, &self.config.allow_methods.join(", "))?;
		response.set_header(ACCESS_CONTROL_ALLOW_HEADERS, &self.config.allow_headers.join(", "))?;
		if let Some(max_age) = self.config.max_age {
			response.set_header(ACCESS_CONTROL_MAX_AGE, &max_age.to_string())?;
		}
		if self.config.allow_credentials {
			response
				.headers
				.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
		}
		Ok(())
	}
}

#[async_trait]
impl Middleware for CorsMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> ServerResult<Response> {
		let mut response = if request.method == Method::OPTIONS {
			tracing::debug!(path = %request.path(), "answering preflight request");
			Response::no_content()
		} else {
			next.handle(request).await?
		};
		self.apply(&mut response)?;
		Ok(response)
	}
}

/// Makes sure every request carries an `X-Request-ID` and echoes it on the
/// response unless the handler answered with its own. A missing id is
/// generated.
#[derive(Debug, Default)]
pub struct RequestIdMiddleware;

impl RequestIdMiddleware {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for RequestIdMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> ServerResult<Response> {
		let request_id = match request.request_id() {
			Some(id) => id.to_string(),
			None => {
				let id = generate_request_id();
				request = request.with_header(REQUEST_ID_HEADER, &id)?;
				id
			}
		};

		let mut response = next.handle(request).await?;
		if response.header(REQUEST_ID_HEADER).is_none() {
			response.set_header(HeaderName::from_static(REQUEST_ID_HEADER), &request_id)?;
		}
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::StatusCode;
	use rstest::rstest;

	struct Echo;

	#[async_trait]
	impl Handler for Echo {
		async fn handle(&self, request: Request) -> ServerResult<Response> {
			Ok(Response::ok().with_body(request.request_id().unwrap_or("none").to_string()))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_preflight_is_answered_without_the_handler() {
		// Arrange
		let middleware = CorsMiddleware::permissive();

		// Act
		let response = middleware
			.process(Request::simple(Method::OPTIONS, "/report-error"), Arc::new(Echo))
			.await
			.unwrap();

		// Assert
		assert_eq!(response.status, StatusCode::NO_CONTENT);
		assert!(response.body.is_empty());
		assert_eq!(response.header("access-control-allow-origin"), Some("*"));
		assert_eq!(response.header("access-control-allow-methods"), Some("POST, OPTIONS"));
		assert_eq!(response.header("access-control-allow-headers"), Some("*"));
		assert_eq!(response.header("access-control-max-age"), Some("86400"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_cors_headers_on_regular_responses() {
		let middleware = CorsMiddleware::new(CorsConfig {
			allow_origins: vec!["https://balbal.io".to_string()],
			allow_credentials: true,
			..Default::default()
		});

		let response = middleware
			.process(Request::simple(Method::POST, "/report-error"), Arc::new(Echo))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(
			response.header("access-control-allow-origin"),
			Some("https://balbal.io")
		);
		assert_eq!(response.header("access-control-allow-credentials"), Some("true"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_request_id_is_propagated() {
		let request = Request::simple(Method::POST, "/")
			.with_header(REQUEST_ID_HEADER, "req_given")
			.unwrap();

		let response = RequestIdMiddleware::new()
			.process(request, Arc::new(Echo))
			.await
			.unwrap();

		assert_eq!(response.header("x-request-id"), Some("req_given"));
		assert_eq!(response.body, "req_given");
	}

	#[rstest]
	#[tokio::test]
	async fn test_handler_request_id_is_kept() {
		struct Answered;

		#[async_trait]
		impl Handler for Answered {
			async fn handle(&self, _request: Request) -> ServerResult<Response> {
				Response::ok().with_header(HeaderName::from_static(REQUEST_ID_HEADER), "req_from_body")
			}
		}
		let request = Request::simple(Method::POST, "/")
			.with_header(REQUEST_ID_HEADER, "req_given")
			.unwrap();

		let response = RequestIdMiddleware::new()
			.process(request, Arc::new(Answered))
			.await
			.unwrap();

		assert_eq!(response.header("x-request-id"), Some("req_from_body"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_request_id_is_generated() {
		let response = RequestIdMiddleware::new()
			.process(Request::simple(Method::POST, "/"), Arc::new(Echo))
			.await
			.unwrap();

		let id = response.header("x-request-id").unwrap();
		assert!(id.starts_with("req_"));
		assert_eq!(response.body, id.as_bytes());
	}
}
