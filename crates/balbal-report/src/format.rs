//! Plain-text and HTML rendering of error reports

use std::fmt::Write;

use balbal_conf::{Environment, ReportingSettings};
use serde::Serialize;
use serde_json::Value;

use crate::report::{ErrorReport, ReportContext};

const RULE: &str = "========================================";

/// Subject line plus the two body renderings of one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedReport {
	pub subject: String,
	pub text: String,
	pub html: String,
}

#[derive(Debug, Clone)]
pub struct ReportFormatter {
	app_name: String,
	environment: Environment,
}

impl Default for ReportFormatter {
	fn default() -> Self {
		Self::from_settings(&ReportingSettings::default())
	}
}

impl ReportFormatter {
	pub fn new(app_name: impl Into<String>, environment: Environment) -> Self {
		Self {
			app_name: app_name.into(),
			environment,
		}
	}

	pub fn from_settings(settings: &ReportingSettings) -> Self {
		Self::new(settings.app_name.clone(), settings.environment)
	}

	pub fn environment(&self) -> Environment {
		self.environment
	}

	pub fn render(&self, report: &ErrorReport) -> RenderedReport {
		let text = self.text(report);
		RenderedReport {
			subject: self.subject(report),
			html: text_to_html(&text),
			text,
		}
	}

	/// `[App] Error Report - {name} ({request id})`
	pub fn subject(&self, report: &ErrorReport) -> String {
		format!(
			"[{}] Error Report - {} ({})",
			self.app_name, report.error.name, report.request_id
		)
	}

	pub fn text(&self, report: &ErrorReport) -> String {
		let mut out = String::new();
		let _ = writeln!(out, "Error Report - {}", report.timestamp_iso());
		let _ = writeln!(out, "{}", RULE);
		let _ = writeln!(out);
		let _ = writeln!(out, "Request ID: {}", report.request_id);
		let _ = writeln!(out, "Environment: {}", self.environment);
		let _ = writeln!(out);
		let _ = writeln!(out, "Error Details:");
		let _ = writeln!(out, "-------------");
		let _ = writeln!(out, "Name: {}", report.error.name);
		let _ = writeln!(out, "Message: {}", report.error.message);
		let _ = writeln!(
			out,
			"Stack: {}",
			report
				.error
				.stack
				.as_deref()
				.unwrap_or("No stack trace available")
		);
		if let Some(context) = &report.context {
			write_context(&mut out, context);
		}
		out
	}
}

fn write_context(out: &mut String, context: &ReportContext) {
	let _ = writeln!(out);
	let _ = writeln!(out, "Context:");
	let _ = writeln!(out, "--------");
	let _ = writeln!(out, "Component: {}", context.component.as_deref().unwrap_or("N/A"));
	let _ = writeln!(out, "Action: {}", context.action.as_deref().unwrap_or("N/A"));
	let _ = writeln!(out, "User Info: {}", pretty(context.user_info.as_ref()));
	let _ = writeln!(out, "Additional Data: {}", pretty(context.additional_data.as_ref()));

	let code = context
		.additional_data
		.as_ref()
		.and_then(|data| data.get("generatedCode"))
		.and_then(Value::as_str)
		.unwrap_or("No code available");
	let _ = writeln!(out);
	let _ = writeln!(out, "Generated Code:");
	let _ = writeln!(out, "-------------");
	let _ = writeln!(out, "{}", code);
}

fn pretty(value: Option<&Value>) -> String {
	let empty = Value::Object(Default::default());
	serde_json::to_string_pretty(value.unwrap_or(&empty)).unwrap_or_else(|_| "{}".to_string())
}

/// Escape `text` for HTML and turn line breaks into `<br>`
pub fn text_to_html(text: &str) -> String {
	escape_html(text).replace('\n', "<br>")
}

pub fn escape_html(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			other => out.push(other),
		}
	}
	out
}
