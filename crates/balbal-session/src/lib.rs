//! # BalBal Session
//!
//! The editor session: owns the project, runs builds and previews one at a
//! time, and merges AI-generated code into the project.
//!
//! - [`EditorSession`]: the orchestrator and its [`SessionPhase`]s
//! - [`GenerationClient`]: boundary to the code generation service, with
//!   [`ChatCompletionClient`] for OpenAI-style chat completion endpoints
//! - [`parse_generation`]: best-effort reading of model output
//!
//! ```rust,ignore
//! use balbal_session::EditorSession;
//!
//! let session = EditorSession::from_settings(&settings, reporter)?;
//! session.set_prompt("A counter with a reset button");
//! session.generate().await?;
//! let frame = session.run().await?;
//! ```

pub mod error;
pub mod generation;
pub mod parse;
pub mod session;

pub use error::{GenerationError, GenerationResult, SessionError, SessionResult};
pub use generation::{ChatCompletionClient, GenerationClient, GenerationRequest};
pub use parse::{
	ParsedGeneration, clean_response, decode_escapes, dedupe_imports, normalize_generated_path,
	parse_generation, prepare_generated_source, strip_trailing_commas,
};
pub use session::{EditorSession, GenerationOutcome, SessionPhase, SessionState};
