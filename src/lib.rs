//! # BalBal
//!
//! The build-and-preview pipeline behind the BalBal.io app builder.
//!
//! A project is a set of in-memory source files. On every run the entry
//! file and everything it imports are rewritten for the web, compiled and
//! concatenated into one bundle, which is then mounted in an isolated
//! preview. Anything the bundle throws is turned into an error report and
//! delivered out of band.
//!
//! ## Feature Flags
//!
//! - `minimal` - bundling and previewing
//! - `full` (default) - everything below
//! - `bundler` - [`bundler`]: import rewriting, module resolution, bundling
//! - `preview` - [`preview`]: preview documents and headless mounting
//! - `report` - [`report`]: error reports and their transports
//! - `server` - [`server`]: the error report HTTP endpoint
//! - `session` - [`session`]: the editor session and AI code generation
//!
//! [`conf`] and [`core`] are always available.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use balbal::prelude::*;
//!
//! let settings = Settings::load()?;
//! let reporter = ErrorReporter::from_settings(&settings.reporting)?;
//! let session = EditorSession::from_settings(&settings, reporter)?;
//!
//! session.update_file("src/App.tsx", "export default function App() { return <p>Hi</p>; }");
//! let frame = session.run().await?;
//! println!("{}", frame.mount_html);
//! ```

pub mod conf;
pub mod core;

#[cfg(feature = "bundler")]
pub mod bundler;
#[cfg(feature = "preview")]
pub mod preview;
#[cfg(feature = "report")]
pub mod report;
#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "session")]
pub mod session;

pub use balbal_conf::{Env, EnvError, Settings};
pub use balbal_core::{Bundle, ConsoleLog, ConsoleMessage, VirtualFileStore};

#[cfg(feature = "bundler")]
pub use balbal_bundler::{BuildError, BuildResult, BundleEngine, ImportRewriter, ModuleResolver};

#[cfg(feature = "preview")]
pub use balbal_preview::{ExecutionScope, PreviewError, PreviewFrame, PreviewRenderer};

#[cfg(feature = "report")]
pub use balbal_report::{DeliveryError, ErrorDetails, ErrorReporter, ReportContext};

#[cfg(feature = "server")]
pub use balbal_server::{HttpServer, report_service};

#[cfg(feature = "session")]
pub use balbal_session::{EditorSession, GenerationClient, SessionError, SessionPhase};

/// Common imports
pub mod prelude {
	pub use crate::{Bundle, ConsoleLog, Settings, VirtualFileStore};

	#[cfg(feature = "bundler")]
	pub use crate::{BuildError, BundleEngine};

	#[cfg(feature = "preview")]
	pub use crate::{PreviewError, PreviewFrame, PreviewRenderer};

	#[cfg(feature = "report")]
	pub use crate::{ErrorDetails, ErrorReporter, ReportContext};

	#[cfg(feature = "session")]
	pub use crate::{EditorSession, SessionError, SessionPhase};
}
