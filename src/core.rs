//! Shared pipeline types: the virtual file store, the console log, bundles
//! and the table of runtime-provided packages.
//!
//! ```rust
//! use balbal::core::VirtualFileStore;
//!
//! let mut files = VirtualFileStore::new();
//! files.set("src/App.tsx", "export default function App() { return null; }");
//! assert!(files.contains("src/App.tsx"));
//! ```

pub use balbal_core::*;
