//! Handler and middleware traits
//!
//! A [`Handler`] turns a [`Request`] into a [`Response`]. [`Middleware`]
//! wraps the next handler to add cross-cutting behavior, and a
//! [`MiddlewareChain`] composes any number of them around a handler.
//! Middleware runs in the order it was added: the first one added sees the
//! request first and the response last.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServerResult;
use crate::http::{Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> ServerResult<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> ServerResult<Response> {
		(**self).handle(request).await
	}
}

#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> ServerResult<Response>;

	/// Whether this middleware applies to `request`. Skipped middleware is
	/// bypassed entirely.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}

	pub fn len(&self) -> usize {
		self.middlewares.len()
	}

	pub fn is_empty(&self) -> bool {
		self.middlewares.is_empty()
	}
}

/// One link of the chain: a middleware and everything after it
struct Link {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Link {
	async fn handle(&self, request: Request) -> ServerResult<Response> {
		if !self.middleware.should_continue(&request) {
			return self.next.handle(request).await;
		}
		self.middleware.process(request, self.next.clone()).await
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> ServerResult<Response> {
		let mut next = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			next = Arc::new(Link {
				middleware: middleware.clone(),
				next,
			});
		}
		next.handle(request).await
	}
}
