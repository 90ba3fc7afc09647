//! # BalBal Bundler
//!
//! Turns a [`VirtualFileStore`](balbal_core::VirtualFileStore) into a single
//! executable [`Bundle`](balbal_core::Bundle).
//!
//! ## Pipeline
//!
//! 1. [`ImportRewriter`] retargets mobile-framework imports at their browser
//!    counterparts (`react-native` to `react-native-web`, navigation packages
//!    to the navigation shim) and binds `require` calls to runtime globals.
//! 2. [`ModuleResolver`] classifies each import as virtual (a file in the
//!    store, probed with `.tsx`, `.ts`, `.js`, `.jsx`) or external (left to
//!    the preview runtime).
//! 3. [`Compiler`] strips TypeScript and lowers JSX to `React.createElement`.
//! 4. The linker registers every module with a small registry runtime and
//!    [`BundleEngine`] concatenates them behind the entry.
//!
//! ```ignore
//! use balbal_bundler::BundleEngine;
//! use balbal_core::VirtualFileStore;
//!
//! let mut files = VirtualFileStore::new();
//! files.set("src/App.tsx", "export default function App() { return <div />; }");
//!
//! let bundle = BundleEngine::default().build("src/App.tsx", &files).await?;
//! assert_eq!(bundle.modules, vec!["src/App.tsx"]);
//! ```

pub mod compiler;
mod edit;
pub mod engine;
pub mod error;
pub mod format;
pub mod linker;
pub mod resolver;
pub mod rewrite;

pub use compiler::{Compiler, JsxPragma};
pub use engine::BundleEngine;
pub use error::{BuildError, BuildResult};
pub use format::format_source;
pub use linker::{LinkedModule, ModuleTarget};
pub use resolver::{LoadedModule, ModuleResolution, ModuleResolver, Namespace, parent_dir};
pub use rewrite::{ImportRewriter, RewritePolicy, RewriteRule, SpecifierPattern, default_rules};
