//! Preview errors

use balbal_report::{DeliveryError, DeliveryReceipt, ErrorDetails};
use serde::{Deserialize, Serialize};

/// Result type for the headless surface
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Failures of the embedded engine itself, as opposed to failures of the
/// code it runs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
	#[error("Preview surface initialization failed: {0}")]
	Init(String),

	#[error("Preview surface is not available: {0}")]
	Unavailable(String),

	#[error("Evaluation failed: {0}")]
	Eval(String),

	#[error("Malformed surface output: {0}")]
	Output(String),
}

/// The bundle threw while being evaluated or mounted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{name}: {message}")]
pub struct RuntimeEvaluationError {
	pub name: String,
	pub message: String,
	#[serde(default)]
	pub stack: Option<String>,
}

impl RuntimeEvaluationError {
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
			stack: None,
		}
	}

	/// Split an engine message of the form `Name: message`
	pub fn from_engine_message(text: &str) -> Self {
		match text.split_once(": ") {
			Some((name, message)) if is_error_name(name) => Self::new(name, message),
			_ => Self::new("Error", text),
		}
	}
}

fn is_error_name(name: &str) -> bool {
	!name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl From<RuntimeEvaluationError> for ErrorDetails {
	fn from(error: RuntimeEvaluationError) -> Self {
		ErrorDetails {
			name: error.name,
			message: error.message,
			stack: error.stack,
		}
	}
}

/// Why a preview could not be shown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
	/// The bundle failed at runtime. The failure was handed to the error
	/// reporter; `delivery` is how that went.
	#[error("{error}")]
	Runtime {
		error: RuntimeEvaluationError,
		delivery: Result<DeliveryReceipt, DeliveryError>,
	},

	#[error(transparent)]
	Surface(#[from] SurfaceError),
}

impl PreviewError {
	pub fn runtime_error(&self) -> Option<&RuntimeEvaluationError> {
		match self {
			Self::Runtime { error, .. } => Some(error),
			Self::Surface(_) => None,
		}
	}
}
