//! Request and response types handled by the endpoint

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ServerError, ServerResult};

/// Request header carrying the caller's request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A fully buffered HTTP request
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
		}
	}

	/// Request without headers or body, for tests and internal dispatch
	pub fn simple(method: Method, path: &'static str) -> Self {
		Self::new(
			method,
			Uri::from_static(path),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn with_header(mut self, name: &'static str, value: &str) -> ServerResult<Self> {
		self.headers
			.insert(HeaderName::from_static(name), header_value(name, value)?);
		Ok(self)
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Header value as text; `None` when missing or not valid text
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn request_id(&self) -> Option<&str> {
		self.header(REQUEST_ID_HEADER).filter(|id| !id.is_empty())
	}

	/// Parse the body as JSON
	pub fn json<T: DeserializeOwned>(&self) -> ServerResult<T> {
		Ok(serde_json::from_slice(&self.body)?)
	}
}

/// An HTTP response with a buffered body
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header, replacing any previous value
	pub fn with_header(mut self, name: HeaderName, value: &str) -> ServerResult<Self> {
		self.set_header(name, value)?;
		Ok(self)
	}

	pub fn set_header(&mut self, name: HeaderName, value: &str) -> ServerResult<()> {
		let value = header_value(name.as_str(), value)?;
		self.headers.insert(name, value);
		Ok(())
	}

	/// Serialize `data` as the body and set the JSON content type
	pub fn with_json<T: Serialize>(mut self, data: &T) -> ServerResult<Self> {
		self.body = Bytes::from(serde_json::to_vec(data)?);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// Parse the body as JSON
	pub fn json<T: DeserializeOwned>(&self) -> ServerResult<T> {
		Ok(serde_json::from_slice(&self.body)?)
	}
}

fn header_value(name: &str, value: &str) -> ServerResult<HeaderValue> {
	HeaderValue::from_str(value).map_err(|_| ServerError::InvalidHeader {
		name: name.to_string(),
		value: value.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::{Value, json};

	#[rstest]
	fn test_json_response_sets_content_type() {
		// Arrange
		let body = json!({ "success": true });

		// Act
		let response = Response::ok().with_json(&body).unwrap();

		// Assert
		assert_eq!(response.header("content-type"), Some("application/json"));
		assert_eq!(response.json::<Value>().unwrap(), body);
	}

	#[rstest]
	#[case(Some("req_1_abc"), Some("req_1_abc"))]
	#[case(Some(""), None)]
	#[case(None, None)]
	fn test_request_id_header(#[case] header: Option<&str>, #[case] expected: Option<&str>) {
		let mut request = Request::simple(Method::POST, "/report-error");
		if let Some(value) = header {
			request = request.with_header(REQUEST_ID_HEADER, value).unwrap();
		}

		assert_eq!(request.request_id(), expected);
	}

	#[rstest]
	fn test_invalid_header_value_is_an_error() {
		let result = Response::ok().with_header(HeaderName::from_static("x-test"), "bad\nvalue");

		assert!(matches!(result, Err(ServerError::InvalidHeader { .. })));
	}
}
