//! Span-based source edits

use oxc_span::Span;

#[derive(Debug)]
struct Edit {
	start: usize,
	end: usize,
	text: String,
}

/// Replacements collected against one source text and applied in a single pass
#[derive(Debug, Default)]
pub(crate) struct TextEdits {
	edits: Vec<Edit>,
}

impl TextEdits {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn replace(&mut self, span: Span, text: impl Into<String>) {
		self.replace_range(span.start as usize, span.end as usize, text);
	}

	pub(crate) fn replace_range(&mut self, start: usize, end: usize, text: impl Into<String>) {
		self.edits.push(Edit {
			start,
			end,
			text: text.into(),
		});
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.edits.is_empty()
	}

	/// Apply all edits. Edits overlapping an earlier one are dropped.
	pub(crate) fn apply(mut self, source: &str) -> String {
		self.edits.sort_by_key(|e| (e.start, e.end));

		let mut out = String::with_capacity(source.len());
		let mut cursor = 0;
		for edit in self.edits {
			if edit.start < cursor || edit.end > source.len() {
				continue;
			}
			out.push_str(&source[cursor..edit.start]);
			out.push_str(&edit.text);
			cursor = edit.end;
		}
		out.push_str(&source[cursor..]);
		out
	}
}

/// Quote `value` as a JavaScript string literal
pub(crate) fn js_string(value: &str) -> String {
	serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
