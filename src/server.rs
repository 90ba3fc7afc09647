//! The HTTP endpoint that receives error reports from the browser.

pub use balbal_server::*;
