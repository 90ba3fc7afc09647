//! Preview documents, the sandboxed frame and headless mounting.

pub use balbal_preview::*;
