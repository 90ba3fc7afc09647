//! Typed settings for every stage of the pipeline
//!
//! Each stage reads its own section. [`Settings::from_env`] fills all of them
//! from an [`Env`]; `Default` gives the values used in development.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::env::{Env, EnvError};

/// Default prefix for all BalBal.io environment variables
pub const ENV_PREFIX: &str = "BALBAL_";

/// Output format of the produced bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	/// Immediately-invoked function assigning the entry exports to a global
	Iife,
	/// ES module re-exporting the entry's default export
	Esm,
}

impl OutputFormat {
	fn parse(key: String, value: &str) -> Result<Self, EnvError> {
		match value.trim().to_ascii_lowercase().as_str() {
			"iife" => Ok(Self::Iife),
			"esm" => Ok(Self::Esm),
			_ => Err(EnvError::ParseError {
				key,
				value_len: value.len(),
				error: "expected `iife` or `esm`".to_string(),
			}),
		}
	}
}

/// Bundler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlerSettings {
	/// Prefix marking project-root relative specifiers (e.g. `src/`)
	pub source_root: String,
	/// Entry file used when no other file is selected
	pub default_entry: String,
	/// Function JSX elements compile to
	pub jsx_factory: String,
	/// Expression JSX fragments compile to
	pub jsx_fragment: String,
	/// Global the entry module's exports are assigned to
	pub global_name: String,
	/// Value of `process.env.NODE_ENV` inside the bundle
	pub node_env: String,
	pub format: OutputFormat,
}

impl Default for BundlerSettings {
	fn default() -> Self {
		Self {
			source_root: "src/".to_string(),
			default_entry: "src/App.tsx".to_string(),
			jsx_factory: "React.createElement".to_string(),
			jsx_fragment: "React.Fragment".to_string(),
			global_name: "AppBundle".to_string(),
			node_env: "development".to_string(),
			format: OutputFormat::Iife,
		}
	}
}

/// Preview document and headless surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
	/// Id of the element the root component is mounted into
	pub mount_element_id: String,
	pub title: String,
	/// Pinned address of the UI runtime
	pub react_url: String,
	/// Pinned address of the DOM-rendering binding
	pub react_dom_url: String,
	/// Utility CSS framework, omitted from the document when `None`
	pub tailwind_url: Option<String>,
	/// `sandbox` attribute of the preview frame
	pub sandbox: String,
	/// Loop iteration limit for the headless surface
	pub loop_iteration_limit: u64,
	/// Recursion limit for the headless surface
	pub recursion_limit: usize,
}

impl Default for PreviewSettings {
	fn default() -> Self {
		Self {
			mount_element_id: "root".to_string(),
			title: "BalBal.io Preview".to_string(),
			react_url: "https://unpkg.com/react@18.2.0/umd/react.development.js".to_string(),
			react_dom_url: "https://unpkg.com/react-dom@18.2.0/umd/react-dom.development.js"
				.to_string(),
			tailwind_url: Some("https://cdn.tailwindcss.com".to_string()),
			sandbox: "allow-scripts".to_string(),
			loop_iteration_limit: 1_000_000,
			recursion_limit: 512,
		}
	}
}

/// Deployment environment reported alongside error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	Development,
	Production,
}

impl Environment {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Development => "development",
			Self::Production => "production",
		}
	}
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error report delivery settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingSettings {
	pub app_name: String,
	pub environment: Environment,
	pub smtp_host: String,
	pub smtp_port: u16,
	pub smtp_user: Option<String>,
	pub smtp_password: Option<String>,
	/// Sender address, falls back to `smtp_user`
	pub from: Option<String>,
	/// Report recipient; delivery fails locally when missing
	pub recipient: Option<String>,
	/// Endpoint used by the HTTP transport
	pub endpoint_url: Option<String>,
}

impl ReportingSettings {
	/// Sender address: explicit `from`, then the SMTP user
	pub fn sender(&self) -> Option<&str> {
		self.from.as_deref().or(self.smtp_user.as_deref())
	}
}

impl Default for ReportingSettings {
	fn default() -> Self {
		Self {
			app_name: "BalBal.io".to_string(),
			environment: Environment::Development,
			smtp_host: "smtp.gmail.com".to_string(),
			smtp_port: 587,
			smtp_user: None,
			smtp_password: None,
			from: None,
			recipient: None,
			endpoint_url: None,
		}
	}
}

impl fmt::Debug for ReportingSettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReportingSettings")
			.field("app_name", &self.app_name)
			.field("environment", &self.environment)
			.field("smtp_host", &self.smtp_host)
			.field("smtp_port", &self.smtp_port)
			.field("smtp_user", &self.smtp_user)
			.field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
			.field("from", &self.from)
			.field("recipient", &self.recipient)
			.field("endpoint_url", &self.endpoint_url)
			.finish()
	}
}

/// Error report endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
	pub bind_address: String,
	/// Paths answered by the report endpoint
	pub report_paths: Vec<String>,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			bind_address: "127.0.0.1:8888".to_string(),
			report_paths: vec![
				"/report-error".to_string(),
				"/api/report-error".to_string(),
				"/.netlify/functions/report-error".to_string(),
			],
		}
	}
}

/// AI code generation settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
	/// Chat completions endpoint
	pub api_url: String,
	/// Generation is disabled when `None`
	pub api_key: Option<String>,
	pub model: String,
	pub temperature: f64,
	pub max_tokens: u32,
}

impl Default for GenerationSettings {
	fn default() -> Self {
		Self {
			api_url: "https://api.openai.com/v1/chat/completions".to_string(),
			api_key: None,
			model: "gpt-3.5-turbo".to_string(),
			temperature: 0.7,
			max_tokens: 4000,
		}
	}
}

impl fmt::Debug for GenerationSettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenerationSettings")
			.field("api_url", &self.api_url)
			.field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
			.field("model", &self.model)
			.field("temperature", &self.temperature)
			.field("max_tokens", &self.max_tokens)
			.finish()
	}
}

/// All settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	pub bundler: BundlerSettings,
	pub preview: PreviewSettings,
	pub reporting: ReportingSettings,
	pub server: ServerSettings,
	pub generation: GenerationSettings,
}

impl Settings {
	/// Load settings from the process environment using [`ENV_PREFIX`]
	pub fn load() -> Result<Self, EnvError> {
		Self::from_env(&Env::new().with_prefix(ENV_PREFIX))
	}

	/// Load settings from `env`, falling back to defaults for unset variables
	pub fn from_env(env: &Env) -> Result<Self, EnvError> {
		let defaults = Self::default();

		let format_key = "BUNDLE_FORMAT";
		let format = match env.optional_str(format_key)? {
			Some(value) => OutputFormat::parse(env.key_name(format_key), &value)?,
			None => defaults.bundler.format,
		};
		let bundler = BundlerSettings {
			source_root: env
				.str_with_default("SOURCE_ROOT", Some(&defaults.bundler.source_root))?,
			default_entry: env
				.str_with_default("DEFAULT_ENTRY", Some(&defaults.bundler.default_entry))?,
			jsx_factory: env.str_with_default("JSX_FACTORY", Some(&defaults.bundler.jsx_factory))?,
			jsx_fragment: env
				.str_with_default("JSX_FRAGMENT", Some(&defaults.bundler.jsx_fragment))?,
			global_name: env.str_with_default("GLOBAL_NAME", Some(&defaults.bundler.global_name))?,
			node_env: env.str_with_default("NODE_ENV", Some(&defaults.bundler.node_env))?,
			format,
		};

		let tailwind = env.bool_with_default("PREVIEW_TAILWIND", Some(true))?;
		let preview = PreviewSettings {
			mount_element_id: env
				.str_with_default("MOUNT_ELEMENT_ID", Some(&defaults.preview.mount_element_id))?,
			title: env.str_with_default("PREVIEW_TITLE", Some(&defaults.preview.title))?,
			react_url: env.str_with_default("REACT_URL", Some(&defaults.preview.react_url))?,
			react_dom_url: env
				.str_with_default("REACT_DOM_URL", Some(&defaults.preview.react_dom_url))?,
			tailwind_url: if tailwind {
				env.optional_str("TAILWIND_URL")?
					.or(defaults.preview.tailwind_url)
			} else {
				None
			},
			sandbox: env.str_with_default("PREVIEW_SANDBOX", Some(&defaults.preview.sandbox))?,
			loop_iteration_limit: non_negative(
				env,
				"PREVIEW_LOOP_LIMIT",
				defaults.preview.loop_iteration_limit as i64,
			)? as u64,
			recursion_limit: non_negative(
				env,
				"PREVIEW_RECURSION_LIMIT",
				defaults.preview.recursion_limit as i64,
			)? as usize,
		};

		let environment_key = "ENVIRONMENT";
		let environment = match env.optional_str(environment_key)?.as_deref() {
			None => defaults.reporting.environment,
			Some(value) if value.eq_ignore_ascii_case("production") => Environment::Production,
			Some(value) if value.eq_ignore_ascii_case("development") => Environment::Development,
			Some(value) => {
				return Err(EnvError::ParseError {
					key: env.key_name(environment_key),
					value_len: value.len(),
					error: "expected `development` or `production`".to_string(),
				});
			}
		};
		let port_key = "SMTP_PORT";
		let port = env.int_with_default(port_key, Some(i64::from(defaults.reporting.smtp_port)))?;
		let smtp_port = u16::try_from(port).map_err(|e| EnvError::ParseError {
			key: env.key_name(port_key),
			value_len: port.to_string().len(),
			error: e.to_string(),
		})?;
		let reporting = ReportingSettings {
			app_name: env.str_with_default("APP_NAME", Some(&defaults.reporting.app_name))?,
			environment,
			smtp_host: env.str_with_default("SMTP_HOST", Some(&defaults.reporting.smtp_host))?,
			smtp_port,
			smtp_user: env.optional_str("SMTP_USER")?,
			smtp_password: env.optional_str("SMTP_PASS")?,
			from: env.optional_str("REPORT_FROM")?,
			recipient: env.optional_str("ERROR_REPORT_RECIPIENT")?,
			endpoint_url: env.optional_str("REPORT_ENDPOINT")?,
		};

		let server = ServerSettings {
			bind_address: env
				.str_with_default("BIND_ADDRESS", Some(&defaults.server.bind_address))?,
			report_paths: env
				.list_with_default("REPORT_PATHS", Some(defaults.server.report_paths))?,
		};

		let temperature_key = "AI_TEMPERATURE";
		let temperature = match env.optional_str(temperature_key)? {
			Some(value) => value.trim().parse::<f64>().map_err(|e| EnvError::ParseError {
				key: env.key_name(temperature_key),
				value_len: value.len(),
				error: e.to_string(),
			})?,
			None => defaults.generation.temperature,
		};
		let max_tokens_key = "AI_MAX_TOKENS";
		let max_tokens = non_negative(
			env,
			max_tokens_key,
			i64::from(defaults.generation.max_tokens),
		)?;
		let generation = GenerationSettings {
			api_url: env.str_with_default("AI_API_URL", Some(&defaults.generation.api_url))?,
			api_key: env.optional_str("AI_API_KEY")?,
			model: env.str_with_default("AI_MODEL", Some(&defaults.generation.model))?,
			temperature,
			max_tokens: u32::try_from(max_tokens).map_err(|e| EnvError::ParseError {
				key: env.key_name(max_tokens_key),
				value_len: max_tokens.to_string().len(),
				error: e.to_string(),
			})?,
		};

		Ok(Self {
			bundler,
			preview,
			reporting,
			server,
			generation,
		})
	}
}

fn non_negative(env: &Env, key: &str, default: i64) -> Result<i64, EnvError> {
	let value = env.int_with_default(key, Some(default))?;
	if value < 0 {
		return Err(EnvError::ParseError {
			key: env.key_name(key),
			value_len: value.to_string().len(),
			error: "value must not be negative".to_string(),
		});
	}
	Ok(value)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_reporting_debug_redacts_password() {
		// Arrange
		let settings = ReportingSettings {
			smtp_password: Some("hunter2".to_string()),
			..Default::default()
		};

		// Act
		let rendered = format!("{:?}", settings);

		// Assert
		assert!(!rendered.contains("hunter2"));
		assert!(rendered.contains("[REDACTED]"));
	}

	#[rstest]
	#[case(Some("noreply@balbal.io"), Some("user@gmail.com"), Some("noreply@balbal.io"))]
	#[case(None, Some("user@gmail.com"), Some("user@gmail.com"))]
	#[case(None, None, None)]
	fn test_sender_fallback(
		#[case] from: Option<&str>,
		#[case] user: Option<&str>,
		#[case] expected: Option<&str>,
	) {
		let settings = ReportingSettings {
			from: from.map(str::to_string),
			smtp_user: user.map(str::to_string),
			..Default::default()
		};

		assert_eq!(settings.sender(), expected);
	}

	#[rstest]
	fn test_defaults_match_development_setup() {
		let settings = Settings::default();

		assert_eq!(settings.bundler.default_entry, "src/App.tsx");
		assert_eq!(settings.bundler.format, OutputFormat::Iife);
		assert_eq!(settings.preview.mount_element_id, "root");
		assert_eq!(settings.preview.sandbox, "allow-scripts");
		assert_eq!(settings.reporting.smtp_port, 587);
		assert!(settings.reporting.recipient.is_none());
	}
}
