//! Exact-path routing

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::ServerResult;
use crate::http::{Request, Response};
use crate::middleware::Handler;

#[derive(Default)]
pub struct Router {
	routes: Vec<(String, Arc<dyn Handler>)>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	/// Serve `path` with `handler`. A trailing slash on either side is ignored.
	pub fn route(mut self, path: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		self.routes.push((normalize(&path.into()).to_string(), handler));
		self
	}

	/// Serve every path in `paths` with the same handler
	pub fn routes<I, P>(mut self, paths: I, handler: Arc<dyn Handler>) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<String>,
	{
		for path in paths {
			self = self.route(path, handler.clone());
		}
		self
	}

	pub fn paths(&self) -> impl Iterator<Item = &str> {
		self.routes.iter().map(|(path, _)| path.as_str())
	}

	fn find(&self, path: &str) -> Option<&Arc<dyn Handler>> {
		let path = normalize(path);
		self.routes
			.iter()
			.find(|(route, _)| route == path)
			.map(|(_, handler)| handler)
	}
}

fn normalize(path: &str) -> &str {
	match path.trim_end_matches('/') {
		"" => "/",
		trimmed => trimmed,
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, request: Request) -> ServerResult<Response> {
		match self.find(request.path()) {
			Some(handler) => handler.handle(request).await,
			None => {
				tracing::debug!(path = %request.path(), "no route");
				Response::not_found().with_json(&json!({
					"success": false,
					"error": "Not Found",
				}))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::{Method, StatusCode};
	use rstest::rstest;

	struct Named(&'static str);

	#[async_trait]
	impl Handler for Named {
		async fn handle(&self, _request: Request) -> ServerResult<Response> {
			Ok(Response::ok().with_body(self.0))
		}
	}

	#[rstest]
	#[case("/report-error", StatusCode::OK)]
	#[case("/report-error/", StatusCode::OK)]
	#[case("/api/report-error", StatusCode::OK)]
	#[case("/report-error?x=1", StatusCode::OK)]
	#[case("/other", StatusCode::NOT_FOUND)]
	#[tokio::test]
	async fn test_routing(#[case] path: &'static str, #[case] status: StatusCode) {
		// Arrange
		let router = Router::new().routes(
			["/report-error", "/api/report-error"],
			Arc::new(Named("report")),
		);

		// Act
		let response = router
			.handle(Request::simple(Method::POST, path))
			.await
			.unwrap();

		// Assert
		assert_eq!(response.status, status);
	}

	#[rstest]
	fn test_paths_are_normalized() {
		let router = Router::new()
			.route("/a/", Arc::new(Named("a")))
			.route("/", Arc::new(Named("root")));

		assert_eq!(router.paths().collect::<Vec<_>>(), vec!["/a", "/"]);
	}
}
