//! # BalBal Core
//!
//! Types shared by every stage of the build-and-preview pipeline:
//!
//! - [`VirtualFileStore`]: the in-memory project, path to source text
//! - [`ConsoleLog`]: append-only, user-facing status lines
//! - [`Bundle`]: compiled output of one build
//! - [`SourceDialect`]: TypeScript+JSX or JavaScript+JSX, derived from an extension
//! - [`globals`]: the package specifiers the preview runtime supplies as globals

pub mod bundle;
pub mod console;
pub mod dialect;
pub mod globals;
pub mod id;
pub mod vfs;

pub use bundle::Bundle;
pub use console::{ConsoleLog, ConsoleMessage};
pub use dialect::{SUPPORTED_EXTENSIONS, SourceDialect};
pub use globals::{NAVIGATION_SHIM, RUNTIME_GLOBALS, RuntimeGlobal, WEB_PRIMITIVES, global_for};
pub use id::{generate_request_id, generate_unique_id};
pub use vfs::VirtualFileStore;

pub use balbal_conf::OutputFormat;
