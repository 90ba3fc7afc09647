//! Delivery through the report endpoint over HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{DeliveryReceipt, ReportTransport};
use crate::error::{DeliveryError, DeliveryResult};
use crate::format::RenderedReport;
use crate::report::ErrorReport;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response body of the report endpoint
#[derive(Debug, Deserialize)]
struct EndpointResponse {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: Option<String>,
}

/// POSTs the report as JSON to a report endpoint
pub struct HttpTransport {
	endpoint: String,
	client: Client,
}

impl HttpTransport {
	pub fn new(endpoint: impl Into<String>) -> DeliveryResult<Self> {
		let client = Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| DeliveryError::Transport(e.to_string()))?;
		Ok(Self::with_client(endpoint, client))
	}

	pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
		Self {
			endpoint: endpoint.into(),
			client,
		}
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

#[async_trait]
impl ReportTransport for HttpTransport {
	fn name(&self) -> &'static str {
		"http"
	}

	async fn deliver(
		&self,
		report: &ErrorReport,
		_rendered: &RenderedReport,
	) -> DeliveryResult<DeliveryReceipt> {
		let response = self
			.client
			.post(&self.endpoint)
			.header("X-Request-ID", &report.request_id)
			.json(report)
			.send()
			.await
			.map_err(|e| DeliveryError::Transport(e.to_string()))?;

		let status = response.status();
		let body: Option<EndpointResponse> = response.json().await.ok();
		if !status.is_success() {
			return Err(DeliveryError::Rejected {
				status: status.as_u16(),
				message: body
					.and_then(|b| b.error)
					.unwrap_or_else(|| "Failed to send error report".to_string()),
			});
		}

		Ok(DeliveryReceipt {
			request_id: report.request_id.clone(),
			message: body
				.and_then(|b| b.message)
				.unwrap_or_else(|| "Error report sent successfully".to_string()),
		})
	}
}
