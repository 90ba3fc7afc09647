use std::sync::Arc;

use balbal_conf::Environment;
use balbal_report::{
	DeliveryError, ErrorDetails, ErrorReporter, MemoryTransport, ReportContext, ReportFormatter,
	ReportSubmission,
};
use rstest::rstest;
use serde_json::json;

/// Test: a submission received over the wire is delivered with both renderings
#[rstest]
#[tokio::test]
async fn test_submission_is_delivered_with_text_and_html() {
	// Arrange
	let transport = MemoryTransport::new();
	let reporter = ErrorReporter::new(
		ReportFormatter::new("BalBal.io", Environment::Production),
		Arc::new(transport.clone()),
	);
	let submission: ReportSubmission = serde_json::from_value(json!({
		"error": { "name": "TypeError", "message": "x is not a function", "stack": "at <App>" },
		"context": { "component": "Preview", "additionalData": { "entry": "src/App.tsx" } },
		"requestId": "req_7_abcdefg"
	}))
	.unwrap();

	// Act
	let receipt = reporter.submit(submission.into_report(None)).await.unwrap();

	// Assert
	assert_eq!(receipt.request_id, "req_7_abcdefg");
	let delivered = &transport.delivered()[0];
	assert_eq!(
		delivered.rendered.subject,
		"[BalBal.io] Error Report - TypeError (req_7_abcdefg)"
	);
	assert!(delivered.rendered.text.contains("Environment: production"));
	assert!(delivered.rendered.text.contains("Stack: at <App>"));
	assert!(delivered.rendered.html.contains("Stack: at &lt;App&gt;<br>"));
}

/// Test: each report gets its own request id
#[rstest]
#[tokio::test]
async fn test_reports_get_distinct_request_ids() {
	let transport = MemoryTransport::new();
	let reporter = ErrorReporter::new(ReportFormatter::default(), Arc::new(transport.clone()));

	for _ in 0..3 {
		reporter
			.report(
				ErrorDetails::new("Error", "boom"),
				Some(ReportContext::new("Preview", "Mount")),
			)
			.await
			.unwrap();
	}

	let mut ids: Vec<String> = transport.reports().into_iter().map(|r| r.request_id).collect();
	ids.sort();
	ids.dedup();
	assert_eq!(ids.len(), 3);
}

/// Test: missing recipient is a local failure the caller can log
#[rstest]
#[tokio::test]
async fn test_missing_recipient_is_reported_to_the_caller() {
	let reporter = ErrorReporter::new(
		ReportFormatter::default(),
		Arc::new(MemoryTransport::failing(DeliveryError::MissingRecipient)),
	);

	let err = reporter
		.report(ErrorDetails::new("Error", "boom"), None)
		.await
		.unwrap_err();

	assert_eq!(err.to_string(), "No recipient email configured");
}
