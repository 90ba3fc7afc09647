//! Sandboxed frame lifecycle
//!
//! A [`SandboxedFrame`] is the markup of one preview surface. [`FrameHost`]
//! owns the current frame and replaces it wholesale on every run.

use balbal_conf::PreviewSettings;
use balbal_report::escape_html;

const SAME_ORIGIN: &str = "allow-same-origin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedFrame {
	document: String,
	sandbox: String,
	title: String,
}

impl SandboxedFrame {
	/// Wrap `document`. Same-origin access is never granted, whatever the
	/// configured sandbox says.
	pub fn new(document: String, settings: &PreviewSettings) -> Self {
		let tokens: Vec<&str> = settings
			.sandbox
			.split_whitespace()
			.filter(|token| {
				let same_origin = token.eq_ignore_ascii_case(SAME_ORIGIN);
				if same_origin {
					tracing::warn!("ignoring {} in preview sandbox", SAME_ORIGIN);
				}
				!same_origin
			})
			.collect();
		Self {
			document,
			sandbox: tokens.join(" "),
			title: settings.title.clone(),
		}
	}

	pub fn document(&self) -> &str {
		&self.document
	}

	pub fn sandbox(&self) -> &str {
		&self.sandbox
	}

	/// `<iframe>` element carrying the document as `srcdoc`
	pub fn to_html(&self) -> String {
		format!(
			"<iframe title=\"{}\" sandbox=\"{}\" srcdoc=\"{}\"></iframe>",
			escape_html(&self.title),
			escape_html(&self.sandbox),
			escape_html(&self.document)
		)
	}
}

/// Holds the live frame. Each replacement bumps the generation so stale
/// messages from an earlier frame can be told apart.
#[derive(Debug, Default)]
pub struct FrameHost {
	current: Option<SandboxedFrame>,
	generation: u64,
}

impl FrameHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Swap in `frame`, returning the new generation
	pub fn replace(&mut self, frame: SandboxedFrame) -> u64 {
		self.generation += 1;
		self.current = Some(frame);
		tracing::debug!(generation = self.generation, "preview frame replaced");
		self.generation
	}

	pub fn current(&self) -> Option<&SandboxedFrame> {
		self.current.as_ref()
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_mounted(&self) -> bool {
		self.current.is_some()
	}

	/// Drop the current frame
	pub fn dispose(&mut self) -> Option<SandboxedFrame> {
		self.current.take()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("allow-scripts", "allow-scripts")]
	#[case("allow-scripts allow-same-origin", "allow-scripts")]
	#[case("allow-same-origin", "")]
	#[case("allow-scripts  allow-forms", "allow-scripts allow-forms")]
	fn test_same_origin_is_never_granted(#[case] configured: &str, #[case] expected: &str) {
		// Arrange
		let settings = PreviewSettings {
			sandbox: configured.to_string(),
			..Default::default()
		};

		// Act
		let frame = SandboxedFrame::new(String::new(), &settings);

		// Assert
		assert_eq!(frame.sandbox(), expected);
	}

	#[rstest]
	fn test_srcdoc_is_attribute_escaped() {
		let frame = SandboxedFrame::new(
			"<p class=\"x\">a & b</p>".to_string(),
			&PreviewSettings::default(),
		);

		let html = frame.to_html();

		assert!(html.contains("sandbox=\"allow-scripts\""));
		assert!(html.contains("srcdoc=\"&lt;p class=&quot;x&quot;&gt;a &amp; b&lt;/p&gt;\""));
	}

	#[rstest]
	fn test_frames_are_replaced_wholesale() {
		let settings = PreviewSettings::default();
		let mut host = FrameHost::new();

		let first = host.replace(SandboxedFrame::new("one".to_string(), &settings));
		let second = host.replace(SandboxedFrame::new("two".to_string(), &settings));

		assert_eq!((first, second), (1, 2));
		assert_eq!(host.current().map(|f| f.document()), Some("two"));
		assert_eq!(host.dispose().map(|f| f.document().to_string()), Some("two".to_string()));
		assert!(!host.is_mounted());
		assert_eq!(host.generation(), 2);
	}
}
