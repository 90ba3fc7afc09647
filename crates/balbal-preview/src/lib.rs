//! # BalBal Preview
//!
//! Shows a [`Bundle`](balbal_core::Bundle) to the user and catches what it
//! throws.
//!
//! - [`ExecutionScope`]: the named bindings every bundle may assume
//! - [`build_preview_document`]: bundle to full HTML page, a pure function
//! - [`SandboxedFrame`] / [`FrameHost`]: the isolated frame and its lifecycle
//! - [`PreviewSurface`]: headless mounting in an embedded ECMAScript engine
//! - [`PreviewRenderer`]: ties the above together and files runtime failures
//!   with the error reporter
//!
//! ## Example
//!
//! ```rust,ignore
//! use balbal_preview::PreviewRenderer;
//!
//! let renderer = PreviewRenderer::from_settings(&settings, reporter)?;
//! match renderer.render(&bundle, &files, Some("src/App.tsx")).await {
//!     Ok(frame) => println!("{}", frame.mount_html),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod document;
pub mod error;
pub mod frame;
pub mod renderer;
pub mod scope;
pub mod surface;

pub use document::{PREVIEW_ERROR_MESSAGE, build_preview_document, escape_inline_script};
pub use error::{PreviewError, RuntimeEvaluationError, SurfaceError, SurfaceResult};
pub use frame::{FrameHost, SandboxedFrame};
pub use renderer::{PreviewFrame, PreviewRenderer, preview_context};
pub use scope::{BindingKind, ExecutionScope, SCOPE_VERSION, ScopeBinding};
pub use surface::{ConsoleEntry, MountOutcome, PreviewSurface};
