//! Error reporter
//!
//! Turns a captured failure into an [`ErrorReport`], renders it and hands it
//! to a [`ReportTransport`]. The outcome is returned so the caller can log
//! it, but a failed delivery is never turned into a new preview error.

use std::sync::Arc;

use balbal_conf::ReportingSettings;

use crate::error::DeliveryResult;
use crate::format::ReportFormatter;
use crate::report::{ErrorDetails, ErrorReport, ReportContext};
use crate::transport::{DeliveryReceipt, HttpTransport, MailTransport, ReportTransport};

#[derive(Clone)]
pub struct ErrorReporter {
	formatter: ReportFormatter,
	transport: Arc<dyn ReportTransport>,
}

impl std::fmt::Debug for ErrorReporter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ErrorReporter")
			.field("formatter", &self.formatter)
			.field("transport", &self.transport.name())
			.finish()
	}
}

impl ErrorReporter {
	pub fn new(formatter: ReportFormatter, transport: Arc<dyn ReportTransport>) -> Self {
		Self {
			formatter,
			transport,
		}
	}

	/// Reporter for `settings`: the HTTP endpoint when one is configured,
	/// SMTP otherwise
	pub fn from_settings(settings: &ReportingSettings) -> DeliveryResult<Self> {
		let transport: Arc<dyn ReportTransport> = match &settings.endpoint_url {
			Some(endpoint) => Arc::new(HttpTransport::new(endpoint.clone())?),
			None => Arc::new(MailTransport::new(settings)?),
		};
		Ok(Self::new(ReportFormatter::from_settings(settings), transport))
	}

	pub fn formatter(&self) -> &ReportFormatter {
		&self.formatter
	}

	/// Report `error` under a freshly generated request id
	pub async fn report(
		&self,
		error: ErrorDetails,
		context: Option<ReportContext>,
	) -> DeliveryResult<DeliveryReceipt> {
		self.submit(ErrorReport::new(error, context, None)).await
	}

	/// Render and deliver a report that already carries its request id
	pub async fn submit(&self, report: ErrorReport) -> DeliveryResult<DeliveryReceipt> {
		let rendered = self.formatter.render(&report);
		match self.transport.deliver(&report, &rendered).await {
			Ok(receipt) => {
				tracing::info!(
					request_id = %report.request_id,
					transport = self.transport.name(),
					error_name = %report.error.name,
					"error report delivered"
				);
				Ok(receipt)
			}
			Err(e) => {
				tracing::error!(
					request_id = %report.request_id,
					transport = self.transport.name(),
					error = %e,
					"failed to deliver error report"
				);
				Err(e)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::DeliveryError;
	use crate::transport::MemoryTransport;
	use balbal_conf::Environment;
	use rstest::rstest;
	use serde_json::json;

	fn reporter(transport: MemoryTransport) -> ErrorReporter {
		ErrorReporter::new(
			ReportFormatter::new("BalBal.io", Environment::Development),
			Arc::new(transport),
		)
	}

	#[rstest]
	#[tokio::test]
	async fn test_report_reaches_the_transport_rendered() {
		// Arrange
		let transport = MemoryTransport::new();
		let reporter = reporter(transport.clone());
		let context = ReportContext::new("Preview", "Code Execution")
			.with_additional_data(json!({ "files": ["src/App.tsx"] }));

		// Act
		let receipt = reporter
			.report(
				ErrorDetails::new("ReferenceError", "styles is not defined"),
				Some(context),
			)
			.await
			.unwrap();

		// Assert
		let delivered = transport.delivered();
		assert_eq!(delivered.len(), 1);
		assert_eq!(delivered[0].report.request_id, receipt.request_id);
		assert!(receipt.request_id.starts_with("req_"));
		assert!(delivered[0].rendered.subject.contains("ReferenceError"));
		assert!(delivered[0].rendered.text.contains("Component: Preview"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_delivery_failure_is_returned_not_raised() {
		let reporter = reporter(MemoryTransport::failing(DeliveryError::Transport(
			"connection refused".to_string(),
		)));

		let outcome = reporter
			.report(ErrorDetails::new("Error", "boom"), None)
			.await;

		assert!(matches!(outcome, Err(DeliveryError::Transport(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_submit_keeps_the_supplied_request_id() {
		let transport = MemoryTransport::new();
		let reporter = reporter(transport.clone());
		let report = ErrorReport::new(
			ErrorDetails::new("Error", "boom"),
			None,
			Some("req_42_abcdefg".to_string()),
		);

		reporter.submit(report).await.unwrap();

		assert_eq!(transport.reports()[0].request_id, "req_42_abcdefg");
	}

	#[rstest]
	fn test_endpoint_setting_selects_http_transport() {
		let settings = ReportingSettings {
			endpoint_url: Some("http://127.0.0.1:8888/report-error".to_string()),
			..Default::default()
		};

		let reporter = ErrorReporter::from_settings(&settings).unwrap();

		assert_eq!(reporter.transport.name(), "http");
	}
}
