//! The editor session and AI code generation.

pub use balbal_session::*;
