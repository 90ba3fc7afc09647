//! Environment variable handling
//!
//! Typed accessors over process environment variables with an optional
//! prefix. An [`Env`] can also be seeded from an explicit map, which keeps
//! settings tests independent of the process environment.

use std::collections::HashMap;
use std::env;

/// Environment variable reader with prefix support
#[derive(Debug, Clone, Default)]
pub struct Env {
	/// Optional prefix for environment variables (e.g., "BALBAL_")
	pub prefix: Option<String>,

	/// When set, lookups read this map instead of the process environment
	overrides: Option<HashMap<String, String>>,
}

impl Env {
	/// Create a new Env instance reading the process environment
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an Env that reads only from the given variables.
	///
	/// Keys are full variable names, including any prefix.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			prefix: None,
			overrides: Some(
				vars.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	/// Set a prefix for all environment variable lookups
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Full variable name for `key`, prefix included
	pub fn key_name(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	fn lookup(&self, key: &str) -> Result<(String, Option<String>), EnvError> {
		let full_key = self.key_name(key);
		validate_env_var_name(&full_key)?;

		let value = match &self.overrides {
			Some(vars) => vars.get(&full_key).cloned(),
			None => env::var(&full_key).ok(),
		};
		Ok((full_key, value))
	}

	/// Read a string value from environment
	pub fn str(&self, key: &str) -> Result<String, EnvError> {
		self.str_with_default(key, None)
	}

	/// Read a string value with a default
	pub fn str_with_default(&self, key: &str, default: Option<&str>) -> Result<String, EnvError> {
		match self.lookup(key)? {
			(_, Some(val)) => Ok(val),
			(full_key, None) => match default {
				Some(d) => Ok(d.to_string()),
				None => Err(EnvError::MissingVariable(full_key)),
			},
		}
	}

	/// Read an optional string value. Empty values count as absent.
	pub fn optional_str(&self, key: &str) -> Result<Option<String>, EnvError> {
		let (_, value) = self.lookup(key)?;
		Ok(value.filter(|v| !v.trim().is_empty()))
	}

	/// Read a boolean value with a default
	pub fn bool_with_default(&self, key: &str, default: Option<bool>) -> Result<bool, EnvError> {
		match self.lookup(key)? {
			(full_key, Some(val)) => parse_bool(&val).map_err(|e| EnvError::ParseError {
				key: full_key,
				value_len: val.len(),
				error: e,
			}),
			(full_key, None) => match default {
				Some(d) => Ok(d),
				None => Err(EnvError::MissingVariable(full_key)),
			},
		}
	}

	/// Read an integer value with a default
	pub fn int_with_default(&self, key: &str, default: Option<i64>) -> Result<i64, EnvError> {
		match self.lookup(key)? {
			(full_key, Some(val)) => val.trim().parse::<i64>().map_err(|e| EnvError::ParseError {
				key: full_key,
				value_len: val.len(),
				error: e.to_string(),
			}),
			(full_key, None) => match default {
				Some(d) => Ok(d),
				None => Err(EnvError::MissingVariable(full_key)),
			},
		}
	}

	/// Read a list value with a default (comma-separated)
	pub fn list_with_default(
		&self,
		key: &str,
		default: Option<Vec<String>>,
	) -> Result<Vec<String>, EnvError> {
		match self.lookup(key)? {
			(_, Some(val)) => Ok(parse_list(&val)),
			(full_key, None) => match default {
				Some(d) => Ok(d),
				None => Err(EnvError::MissingVariable(full_key)),
			},
		}
	}
}

/// Parse common boolean spellings
pub fn parse_bool(value: &str) -> Result<bool, String> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" | "" => Ok(false),
		other => Err(format!("invalid boolean value: {}", other)),
	}
}

/// Split a comma-separated list, dropping empty items
pub fn parse_list(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(|item| item.trim())
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

/// Rejects names that are empty, contain control characters, or contain `=`.
pub fn validate_env_var_name(name: &str) -> Result<(), EnvError> {
	if name.is_empty() {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: "environment variable name must not be empty".to_string(),
		});
	}

	if let Some(pos) = name.find(|c: char| c.is_control()) {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: format!(
				"environment variable name contains control character at position {}",
				pos
			),
		});
	}

	if name.contains('=') {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: "environment variable name must not contain '='".to_string(),
		});
	}

	Ok(())
}

/// Environment variable errors
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
	#[error("Missing environment variable: {0}")]
	MissingVariable(String),

	#[error("Failed to parse environment variable '{key}' (value length: {value_len}): {error}")]
	ParseError {
		key: String,
		/// Length of the original value, kept instead of the value so secrets stay out of logs
		value_len: usize,
		error: String,
	},

	#[error("Invalid environment variable name '{name}': {reason}")]
	InvalidVariableName { name: String, reason: String },
}
