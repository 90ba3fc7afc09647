//! Source formatting
//!
//! Re-prints sources through the code generator: tab indentation, single
//! quotes, one statement per line. Used on AI-generated files before they
//! are merged into a project.

use balbal_core::SourceDialect;
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

fn source_type(dialect: SourceDialect) -> SourceType {
	match dialect {
		SourceDialect::TypeScriptJsx => SourceType::tsx(),
		SourceDialect::JavaScriptJsx => SourceType::jsx(),
	}
}

/// Format `content` parsed as `dialect`.
///
/// Text that does not parse, or that holds nothing but bare expressions, is
/// returned as written.
pub fn format_source(content: &str, dialect: SourceDialect) -> String {
	let allocator = Allocator::default();
	let parsed = Parser::new(&allocator, content, source_type(dialect)).parse();
	if parsed.panicked || !parsed.errors.is_empty() {
		tracing::debug!(
			errors = parsed.errors.len(),
			"source does not parse, keeping it as written"
		);
		return content.to_string();
	}
	let has_code = parsed
		.program
		.body
		.iter()
		.any(|statement| !matches!(statement, Statement::ExpressionStatement(_)));
	if !has_code {
		return content.to_string();
	}

	Codegen::new()
		.with_options(CodegenOptions {
			single_quote: true,
			..CodegenOptions::default()
		})
		.build(&parsed.program)
		.code
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_component_is_reprinted() {
		// Arrange
		let source = "import React from \"react\"\nexport default function App(){return <p>hi</p>}";

		// Act
		let formatted = format_source(source, SourceDialect::TypeScriptJsx);

		// Assert
		assert!(formatted.contains("import React from 'react';"));
		assert!(formatted.contains("export default function App() {"));
		assert!(formatted.contains("\treturn <p>hi</p>;\n"));
	}

	#[rstest]
	fn test_type_annotations_survive() {
		let source = "export function label(count: number): string { return `${count} items` }";

		let formatted = format_source(source, SourceDialect::TypeScriptJsx);

		assert!(formatted.contains("count: number"));
		assert!(formatted.contains("): string {"));
	}

	#[rstest]
	#[case("export default function App() { return <div>; }")]
	#[case("{ \"App.tsx\": broken")]
	#[case("H")]
	#[case("")]
	fn test_unformattable_text_is_kept(#[case] source: &str) {
		assert_eq!(format_source(source, SourceDialect::TypeScriptJsx), source);
	}
}
