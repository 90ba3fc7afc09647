//! Build errors

/// Result type for bundling operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Why a build failed. A build either returns a complete bundle or one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
	/// A virtual import (or the entry itself) matched no file in the store
	#[error("Module not found: '{specifier}'{}", imported_from(.importer))]
	ModuleNotFound {
		specifier: String,
		importer: Option<String>,
	},

	/// The compiler rejected a module; `message` is its diagnostics verbatim
	#[error("Failed to compile {path}: {message}")]
	Compile { path: String, message: String },

	/// The compiler could not be brought up
	#[error("Compiler initialization failed: {0}")]
	Init(String),

	/// The build task died before producing a result
	#[error("Build aborted: {0}")]
	Aborted(String),
}

fn imported_from(importer: &Option<String>) -> String {
	match importer {
		Some(importer) => format!(" (imported from {})", importer),
		None => String::new(),
	}
}

impl BuildError {
	pub fn module_not_found(specifier: impl Into<String>, importer: Option<&str>) -> Self {
		Self::ModuleNotFound {
			specifier: specifier.into(),
			importer: importer.map(str::to_string),
		}
	}

	pub fn compile<I, S>(path: &str, diagnostics: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: ToString,
	{
		let message = diagnostics
			.into_iter()
			.map(|d| d.to_string())
			.collect::<Vec<_>>()
			.join("\n");
		Self::Compile {
			path: path.to_string(),
			message,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_module_not_found_message_names_importer() {
		let err = BuildError::module_not_found("./Header", Some("src/App.tsx"));

		assert_eq!(
			err.to_string(),
			"Module not found: './Header' (imported from src/App.tsx)"
		);
	}

	#[rstest]
	fn test_compile_error_joins_diagnostics() {
		let err = BuildError::compile("src/App.tsx", ["Unexpected token", "Expected `;`"]);

		assert_eq!(
			err.to_string(),
			"Failed to compile src/App.tsx: Unexpected token\nExpected `;`"
		);
	}
}
