//! Import rewriting, module resolution and bundling.

pub use balbal_bundler::*;
