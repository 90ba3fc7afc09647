//! Server errors

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("HTTP error: {0}")]
	Http(#[from] http::Error),

	#[error("Connection error: {0}")]
	Hyper(#[from] hyper::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid header value for {name}: {value}")]
	InvalidHeader { name: String, value: String },
}
