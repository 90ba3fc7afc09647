//! Source dialects

/// Extensions probed for extensionless virtual imports, in priority order
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".tsx", ".ts", ".js", ".jsx"];

/// Parsing dialect of a virtual file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceDialect {
	/// `.ts` and `.tsx`
	TypeScriptJsx,
	/// everything else, JSX allowed
	JavaScriptJsx,
}

impl SourceDialect {
	/// Derive the dialect from the path's extension alone
	pub fn from_path(path: &str) -> Self {
		if path.ends_with(".ts") || path.ends_with(".tsx") {
			Self::TypeScriptJsx
		} else {
			Self::JavaScriptJsx
		}
	}

	pub fn is_typescript(&self) -> bool {
		matches!(self, Self::TypeScriptJsx)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("src/App.tsx", SourceDialect::TypeScriptJsx)]
	#[case("src/util.ts", SourceDialect::TypeScriptJsx)]
	#[case("src/Header.jsx", SourceDialect::JavaScriptJsx)]
	#[case("src/legacy.js", SourceDialect::JavaScriptJsx)]
	#[case("src/types.d.ts.bak", SourceDialect::JavaScriptJsx)]
	fn test_dialect_from_extension(#[case] path: &str, #[case] expected: SourceDialect) {
		assert_eq!(SourceDialect::from_path(path), expected);
	}
}
