//! Delivery transports
//!
//! A transport accepts a structured report plus its rendering and either
//! hands it off or says why it could not.

mod http;
mod mail;
mod memory;

pub use http::HttpTransport;
pub use mail::{MailTransport, compose_message};
pub use memory::{DeliveredReport, MemoryTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeliveryResult;
use crate::format::RenderedReport;
use crate::report::ErrorReport;

/// Acknowledgement from a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
	pub request_id: String,
	pub message: String,
}

#[async_trait]
pub trait ReportTransport: Send + Sync {
	/// Short name used in logs
	fn name(&self) -> &'static str;

	async fn deliver(
		&self,
		report: &ErrorReport,
		rendered: &RenderedReport,
	) -> DeliveryResult<DeliveryReceipt>;
}
