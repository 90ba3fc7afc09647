//! Compiled output of one build

use balbal_conf::OutputFormat;
use serde::Serialize;

/// Start of the trailing statement an ES module bundle adds to its script
pub const ESM_EXPORT_PREFIX: &str = "export default ";

/// A single executable text produced from an entry file and its module graph.
///
/// Bundles are produced fresh on every run and never cached across edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
	pub code: String,
	pub format: OutputFormat,
	/// Entry path the bundle was built from
	pub entry: String,
	/// Virtual modules included, in load order
	pub modules: Vec<String>,
	/// Global holding the entry exports (IIFE bundles)
	pub global_name: String,
}

impl Bundle {
	pub fn size(&self) -> usize {
		self.code.len()
	}

	/// The bundle as a classic script. ES module bundles drop their
	/// trailing default export; the entry stays reachable through the global.
	pub fn classic_script(&self) -> &str {
		match self.format {
			OutputFormat::Iife => &self.code,
			OutputFormat::Esm => match self.code.rfind(ESM_EXPORT_PREFIX) {
				Some(idx) => &self.code[..idx],
				None => &self.code,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn bundle(code: &str, format: OutputFormat) -> Bundle {
		Bundle {
			code: code.to_string(),
			format,
			entry: "src/App.tsx".to_string(),
			modules: vec!["src/App.tsx".to_string()],
			global_name: "AppBundle".to_string(),
		}
	}

	#[rstest]
	fn test_classic_script_of_esm_bundle_drops_export() {
		let esm = bundle(
			"(function () {})();\nexport default globalThis[\"AppBundle\"][\"default\"];\n",
			OutputFormat::Esm,
		);

		assert_eq!(esm.classic_script(), "(function () {})();\n");
	}

	#[rstest]
	fn test_classic_script_of_iife_bundle_is_the_code() {
		let iife = bundle("(function () {})();\n", OutputFormat::Iife);

		assert_eq!(iife.classic_script(), iife.code);
	}
}
