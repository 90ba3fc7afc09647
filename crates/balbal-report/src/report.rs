//! Error report model
//!
//! An [`ErrorReport`] is created once per captured failure and never
//! modified afterwards. [`ReportSubmission`] is the looser shape accepted
//! over the wire, where the request id and timestamp may be absent.

use balbal_core::generate_request_id;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, message and stack of a captured error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
	pub name: String,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl ErrorDetails {
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
			stack: None,
		}
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		let stack = stack.into();
		self.stack = (!stack.is_empty()).then_some(stack);
		self
	}
}

/// Where the failure happened and anything else worth attaching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub component: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_info: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub additional_data: Option<Value>,
}

impl ReportContext {
	pub fn new(component: impl Into<String>, action: impl Into<String>) -> Self {
		Self {
			component: Some(component.into()),
			action: Some(action.into()),
			..Default::default()
		}
	}

	pub fn with_user_info(mut self, user_info: Value) -> Self {
		self.user_info = Some(user_info);
		self
	}

	pub fn with_additional_data(mut self, data: Value) -> Self {
		self.additional_data = Some(data);
		self
	}
}

/// A captured failure ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
	pub error: ErrorDetails,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<ReportContext>,
	pub request_id: String,
	pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
	/// Create a report, generating a request id when none is given
	pub fn new(
		error: ErrorDetails,
		context: Option<ReportContext>,
		request_id: Option<String>,
	) -> Self {
		Self {
			error,
			context,
			request_id: request_id
				.filter(|id| !id.is_empty())
				.unwrap_or_else(generate_request_id),
			timestamp: Utc::now(),
		}
	}

	/// Timestamp as an ISO-8601 string with millisecond precision
	pub fn timestamp_iso(&self) -> String {
		self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
	}
}

/// Body of a report POSTed to the delivery endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSubmission {
	pub error: ErrorDetails,
	#[serde(default)]
	pub context: Option<ReportContext>,
	#[serde(default)]
	pub request_id: Option<String>,
}

impl ReportSubmission {
	/// Turn the submission into a report. The submission's own request id
	/// wins over `fallback_request_id`.
	pub fn into_report(self, fallback_request_id: Option<String>) -> ErrorReport {
		let request_id = self
			.request_id
			.filter(|id| !id.is_empty())
			.or(fallback_request_id);
		ErrorReport::new(self.error, self.context, request_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_request_id_is_generated_when_missing() {
		// Act
		let report = ErrorReport::new(ErrorDetails::new("TypeError", "boom"), None, None);

		// Assert
		assert!(report.request_id.starts_with("req_"));
	}

	#[rstest]
	fn test_supplied_request_id_is_kept() {
		let report = ErrorReport::new(
			ErrorDetails::new("TypeError", "boom"),
			None,
			Some("req_1_abc".to_string()),
		);

		assert_eq!(report.request_id, "req_1_abc");
	}

	#[rstest]
	fn test_serializes_with_camel_case_keys() {
		let report = ErrorReport::new(
			ErrorDetails::new("ReferenceError", "styles is not defined"),
			Some(
				ReportContext::new("Preview", "Code Execution")
					.with_additional_data(json!({ "files": ["src/App.tsx"] })),
			),
			Some("req_1_abc".to_string()),
		);

		let value = serde_json::to_value(&report).unwrap();

		assert_eq!(value["requestId"], "req_1_abc");
		assert_eq!(value["context"]["additionalData"]["files"][0], "src/App.tsx");
		assert!(value["error"].get("stack").is_none());
	}

	#[rstest]
	fn test_submission_without_error_is_rejected() {
		let parsed = serde_json::from_str::<ReportSubmission>("{}");

		assert!(parsed.is_err());
	}

	#[rstest]
	#[case(Some("req_body"), Some("req_header"), "req_body")]
	#[case(None, Some("req_header"), "req_header")]
	#[case(Some(""), Some("req_header"), "req_header")]
	fn test_submission_request_id_precedence(
		#[case] body: Option<&str>,
		#[case] fallback: Option<&str>,
		#[case] expected: &str,
	) {
		let submission = ReportSubmission {
			error: ErrorDetails::new("Error", "x"),
			context: None,
			request_id: body.map(str::to_string),
		};

		let report = submission.into_report(fallback.map(str::to_string));

		assert_eq!(report.request_id, expected);
	}

	#[rstest]
	fn test_empty_stack_is_dropped() {
		let details = ErrorDetails::new("Error", "x").with_stack("");

		assert_eq!(details.stack, None);
	}
}
