//! AI response recovery
//!
//! Generated answers are supposed to be a JSON object mapping file paths to
//! contents but often arrive wrapped in Markdown fences, with trailing
//! commas, or as bare code. [`parse_generation`] tries, in order:
//!
//! 1. a strict JSON parse of the cleaned text
//! 2. the same after removing trailing commas
//! 3. a lenient scrape of `"path": "content"` pairs
//!
//! and otherwise classifies the text as a single file (bare code) or as
//! unparseable (it looked like an object but nothing could be recovered).

use std::fmt;
use std::sync::LazyLock;

use balbal_bundler::format_source;
use balbal_core::SourceDialect;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("valid fence pattern")
});

static TRAILING_COMMA: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma pattern"));

static FILE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#""((?:[^"\\\n]|\\.)+)"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid entry pattern")
});

static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"^import\s.+?from\s+['"](.+?)['"]"#).expect("valid import pattern")
});

/// Result of interpreting an AI response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedGeneration {
	/// Path to content pairs, in the order the response listed them
	Map(Vec<(String, String)>),
	/// The response is the code of one file
	SingleFile(String),
	/// The response looked like a file map but could not be read
	Unparseable(String),
}

impl ParsedGeneration {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Map(_) => "map",
			Self::SingleFile(_) => "single_file",
			Self::Unparseable(_) => "unparseable",
		}
	}
}

/// JSON object of string values, keeping key order
struct OrderedFiles(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedFiles {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct FilesVisitor;

		impl<'de> Visitor<'de> for FilesVisitor {
			type Value = OrderedFiles;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("an object mapping file paths to file contents")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
				let mut files: Vec<(String, String)> = Vec::new();
				while let Some((path, content)) = map.next_entry::<String, String>()? {
					match files.iter_mut().find(|(existing, _)| *existing == path) {
						Some(entry) => entry.1 = content,
						None => files.push((path, content)),
					}
				}
				if files.is_empty() {
					return Err(de::Error::invalid_length(0, &self));
				}
				Ok(OrderedFiles(files))
			}
		}

		deserializer.deserialize_map(FilesVisitor)
	}
}

/// Interpret a raw AI response
pub fn parse_generation(raw: &str) -> ParsedGeneration {
	let cleaned = clean_response(raw);

	if let Some(files) = parse_strict(&cleaned) {
		return ParsedGeneration::Map(files);
	}
	if let Some(files) = parse_strict(&strip_trailing_commas(&cleaned)) {
		tracing::debug!("AI response parsed after removing trailing commas");
		return ParsedGeneration::Map(files);
	}

	let scraped = scrape_entries(&cleaned);
	if !scraped.is_empty() {
		tracing::debug!(files = scraped.len(), "AI response recovered by lenient scrape");
		return ParsedGeneration::Map(scraped);
	}

	if cleaned.starts_with('{') {
		tracing::warn!("AI response could not be parsed as a file map");
		ParsedGeneration::Unparseable(cleaned)
	} else {
		ParsedGeneration::SingleFile(cleaned)
	}
}

fn parse_strict(text: &str) -> Option<Vec<(String, String)>> {
	let OrderedFiles(files) = serde_json::from_str::<OrderedFiles>(text).ok()?;
	files
		.iter()
		.all(|(path, _)| looks_like_file(path))
		.then_some(files)
}

/// Drop a byte-order mark and surrounding whitespace, and unwrap the first
/// fenced code block if there is one
pub fn clean_response(raw: &str) -> String {
	let text = raw.trim_start_matches('\u{feff}').trim();
	match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
		Some(body) => body.as_str().trim().to_string(),
		None => text.to_string(),
	}
}

pub fn strip_trailing_commas(text: &str) -> String {
	TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// `"path": "content"` pairs whose key looks like a file name
fn scrape_entries(text: &str) -> Vec<(String, String)> {
	let mut files: Vec<(String, String)> = Vec::new();
	for captures in FILE_ENTRY.captures_iter(text) {
		let (Some(key), Some(value)) = (captures.get(1), captures.get(2)) else {
			continue;
		};
		let path = decode_escapes(key.as_str());
		if !looks_like_file(&path) {
			continue;
		}
		let content = decode_escapes(value.as_str());
		match files.iter_mut().find(|(existing, _)| *existing == path) {
			Some(entry) => entry.1 = content,
			None => files.push((path, content)),
		}
	}
	files
}

fn looks_like_file(path: &str) -> bool {
	let name = path.rsplit('/').next().unwrap_or(path);
	matches!(name.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty())
		&& !path.contains(char::is_whitespace)
}

/// Decode JSON string escapes, keeping unknown ones verbatim
pub fn decode_escapes(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('n') => out.push('\n'),
			Some('r') => out.push('\r'),
			Some('t') => out.push('\t'),
			Some('"') => out.push('"'),
			Some('\\') => out.push('\\'),
			Some('/') => out.push('/'),
			Some('u') => {
				let hex: String = chars.clone().take(4).collect();
				match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
					Some(decoded) if hex.len() == 4 => {
						out.push(decoded);
						for _ in 0..4 {
							chars.next();
						}
					}
					_ => out.push_str("\\u"),
				}
			}
			Some(other) => {
				out.push('\\');
				out.push(other);
			}
			None => out.push('\\'),
		}
	}
	out
}

/// Place a generated path under the source root. An empty root leaves
/// paths at the top of the project.
pub fn normalize_generated_path(path: &str, source_root: &str) -> String {
	let trimmed = path.trim().trim_start_matches("./").trim_start_matches('/');
	let root = source_root.trim_end_matches('/');
	if root.is_empty() || trimmed.starts_with(&format!("{}/", root)) {
		trimmed.to_string()
	} else {
		format!("{}/{}", root, trimmed)
	}
}

/// Format a generated file for `path`, then drop repeated imports. Text
/// that does not parse is only deduplicated.
pub fn prepare_generated_source(path: &str, content: &str) -> String {
	dedupe_imports(&format_source(content, SourceDialect::from_path(path)))
}

/// Remove repeated `import ... from '...'` lines, keeping the first
pub fn dedupe_imports(code: &str) -> String {
	let mut seen: Vec<&str> = Vec::new();
	code.split('\n')
		.filter(|line| match IMPORT_LINE.find(*line) {
			Some(found) if seen.contains(&found.as_str()) => false,
			Some(found) => {
				seen.push(found.as_str());
				true
			}
			None => true,
		})
		.collect::<Vec<_>>()
		.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn map(entries: &[(&str, &str)]) -> ParsedGeneration {
		ParsedGeneration::Map(
			entries
				.iter()
				.map(|(p, c)| (p.to_string(), c.to_string()))
				.collect(),
		)
	}

	#[rstest]
	fn test_strict_json_keeps_order() {
		// Arrange
		let raw = r#"{"screens/Home.tsx": "export const Home = 1;", "App.tsx": "export default 1;"}"#;

		// Act
		let parsed = parse_generation(raw);

		// Assert
		assert_eq!(
			parsed,
			map(&[
				("screens/Home.tsx", "export const Home = 1;"),
				("App.tsx", "export default 1;"),
			])
		);
	}

	#[rstest]
	#[case("```json\n{\"App.tsx\": \"a\"}\n```")]
	#[case("Here you go:\n```\n{\"App.tsx\": \"a\"}\n```\nEnjoy!")]
	#[case("\u{feff}{\"App.tsx\": \"a\"}")]
	#[case("{\"App.tsx\": \"a\",}")]
	#[case("  {\n  \"App.tsx\": \"a\",\n}\n")]
	fn test_wrapped_responses_are_recovered(#[case] raw: &str) {
		assert_eq!(parse_generation(raw), map(&[("App.tsx", "a")]));
	}

	#[rstest]
	fn test_lenient_scrape_decodes_escapes() {
		let raw = "{\"App.tsx\": \"import x from 'y';\\nconst s = \\\"q\\\";\", \"broken\": [1, }";

		let parsed = parse_generation(raw);

		assert_eq!(
			parsed,
			map(&[("App.tsx", "import x from 'y';\nconst s = \"q\";")])
		);
	}

	#[rstest]
	fn test_bare_code_is_a_single_file() {
		let raw = "```tsx\nexport default function App() { return null; }\n```";

		assert_eq!(
			parse_generation(raw),
			ParsedGeneration::SingleFile("export default function App() { return null; }".to_string())
		);
	}

	#[rstest]
	#[case("{ this is not json }")]
	#[case("{\"title\": \"no files here\"}")]
	#[case("{}")]
	fn test_unreadable_objects_are_unparseable(#[case] raw: &str) {
		assert_eq!(parse_generation(raw).kind(), "unparseable");
	}

	#[rstest]
	#[case("Header.tsx", "src/Header.tsx")]
	#[case("src/App.tsx", "src/App.tsx")]
	#[case("./screens/Home.tsx", "src/screens/Home.tsx")]
	#[case("/utils/format.ts", "src/utils/format.ts")]
	#[case("srcery/x.ts", "src/srcery/x.ts")]
	fn test_normalize_generated_path(#[case] path: &str, #[case] expected: &str) {
		assert_eq!(normalize_generated_path(path, "src/"), expected);
	}

	#[rstest]
	#[case("", "Header.tsx", "Header.tsx")]
	#[case("/", "./screens/Home.tsx", "screens/Home.tsx")]
	#[case("app", "/App.tsx", "app/App.tsx")]
	fn test_normalize_generated_path_with_other_roots(
		#[case] root: &str,
		#[case] path: &str,
		#[case] expected: &str,
	) {
		assert_eq!(normalize_generated_path(path, root), expected);
	}

	#[rstest]
	fn test_prepared_source_is_formatted_and_deduplicated() {
		let raw = "import React from \"react\"\nimport { View } from 'react-native'\nimport React from 'react'\nexport default function App(){return <View />}";

		let prepared = prepare_generated_source("src/App.tsx", raw);

		assert_eq!(prepared.matches("import React from 'react';").count(), 1);
		assert!(prepared.contains("import { View } from 'react-native';"));
		assert!(prepared.contains("\treturn <View />;\n"));
	}

	#[rstest]
	fn test_prepared_source_keeps_unparseable_text() {
		let raw = "import React from 'react';\nimport React from 'react';\nexport default function App() { return <div>; }";

		let prepared = prepare_generated_source("src/App.tsx", raw);

		assert_eq!(
			prepared,
			"import React from 'react';\nexport default function App() { return <div>; }"
		);
	}

	#[rstest]
	fn test_dedupe_imports_keeps_first() {
		let code = "import React from 'react';\nimport { View } from 'react-native';\nimport React from 'react';\n\nexport default 1;";

		assert_eq!(
			dedupe_imports(code),
			"import React from 'react';\nimport { View } from 'react-native';\n\nexport default 1;"
		);
	}

	#[rstest]
	#[case("\\u00e9t\\u00e9", "été")]
	#[case("a\\qb", "a\\qb")]
	#[case("trailing\\", "trailing\\")]
	#[case("\\u12", "\\u12")]
	fn test_decode_escapes(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(decode_escapes(input), expected);
	}
}
