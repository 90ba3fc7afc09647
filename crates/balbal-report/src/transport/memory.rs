//! In-memory delivery for tests and local development

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{DeliveryReceipt, ReportTransport};
use crate::error::{DeliveryError, DeliveryResult};
use crate::format::RenderedReport;
use crate::report::ErrorReport;

/// A report as it reached the transport
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredReport {
	pub report: ErrorReport,
	pub rendered: RenderedReport,
}

/// Keeps every delivered report in memory.
///
/// Clones share the same storage, so a test can keep one handle and give
/// another to the reporter.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
	delivered: Arc<RwLock<Vec<DeliveredReport>>>,
	failure: Option<DeliveryError>,
}

impl MemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// A transport whose every delivery fails with `error`
	pub fn failing(error: DeliveryError) -> Self {
		Self {
			failure: Some(error),
			..Self::default()
		}
	}

	pub fn delivered(&self) -> Vec<DeliveredReport> {
		self.delivered.read().clone()
	}

	pub fn reports(&self) -> Vec<ErrorReport> {
		self.delivered
			.read()
			.iter()
			.map(|d| d.report.clone())
			.collect()
	}

	pub fn count(&self) -> usize {
		self.delivered.read().len()
	}

	pub fn clear(&self) {
		self.delivered.write().clear();
	}
}

#[async_trait]
impl ReportTransport for MemoryTransport {
	fn name(&self) -> &'static str {
		"memory"
	}

	async fn deliver(
		&self,
		report: &ErrorReport,
		rendered: &RenderedReport,
	) -> DeliveryResult<DeliveryReceipt> {
		if let Some(error) = &self.failure {
			return Err(error.clone());
		}
		self.delivered.write().push(DeliveredReport {
			report: report.clone(),
			rendered: rendered.clone(),
		});
		Ok(DeliveryReceipt {
			request_id: report.request_id.clone(),
			message: "Error report stored".to_string(),
		})
	}
}
