//! Session errors

use balbal_bundler::BuildError;
use balbal_preview::PreviewError;

pub type SessionResult<T> = Result<T, SessionError>;
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failures of the code generation collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
	#[error("AI generation is not configured")]
	NotConfigured,

	#[error("Failed to generate code: {0}")]
	Request(String),

	#[error("Failed to generate code: HTTP {status}: {message}")]
	Status { status: u16, message: String },

	#[error("The AI response did not contain any code")]
	EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
	/// A build or render is already running
	#[error("A build is already in progress")]
	Busy,

	/// A generation request is already in flight
	#[error("Code generation is already in progress")]
	AlreadyGenerating,

	#[error("The prompt is empty")]
	EmptyPrompt,

	#[error(transparent)]
	Build(#[from] BuildError),

	#[error(transparent)]
	Preview(#[from] PreviewError),

	#[error(transparent)]
	Generation(#[from] GenerationError),
}
