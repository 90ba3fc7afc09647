//! Settings for every stage, read from `BALBAL_`-prefixed environment variables.

pub use balbal_conf::*;
