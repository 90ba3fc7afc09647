//! Error reports and their delivery.

pub use balbal_report::*;
