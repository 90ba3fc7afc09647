//! Delivery errors

/// Result type for report delivery
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Why a report could not be delivered.
///
/// These never escape into the preview's own error path; callers log them
/// and move on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
	#[error("No recipient email configured")]
	MissingRecipient,

	#[error("No sender email configured")]
	MissingSender,

	#[error("Invalid email address: {0}")]
	InvalidAddress(String),

	/// Network, TLS or authentication failure
	#[error("Transport error: {0}")]
	Transport(String),

	/// The remote side answered but refused the report
	#[error("Report rejected with status {status}: {message}")]
	Rejected { status: u16, message: String },

	/// The outgoing message could not be built
	#[error("Failed to build report message: {0}")]
	Message(String),
}
