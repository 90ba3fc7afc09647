//! # BalBal Conf
//!
//! Configuration for the build-and-preview pipeline.
//!
//! Settings are read from `BALBAL_`-prefixed environment variables; every
//! value has a development default, so an empty environment yields a
//! working local setup (minus error-report delivery, which needs a recipient).
//!
//! ```ignore
//! use balbal_conf::Settings;
//!
//! let settings = Settings::load()?;
//! assert_eq!(settings.bundler.default_entry, "src/App.tsx");
//! ```

pub mod env;
pub mod settings;

pub use env::{Env, EnvError};
pub use settings::{
	BundlerSettings, ENV_PREFIX, Environment, GenerationSettings, OutputFormat, PreviewSettings,
	ReportingSettings, ServerSettings, Settings,
};
