//! Error report endpoint
//!
//! Accepts `POST` bodies of the form
//! `{ "error": { "name", "message", "stack"? }, "context"?, "requestId"? }`
//! and hands them to an [`ErrorReporter`]. Every answer is JSON with a
//! `success` flag, the request id and a timestamp.

use async_trait::async_trait;
use balbal_conf::{Environment, ReportingSettings};
use balbal_core::generate_request_id;
use balbal_report::{DeliveryResult, ErrorReporter, ReportSubmission};
use chrono::{SecondsFormat, Utc};
use http::{HeaderName, Method};
use serde::Serialize;

use crate::error::ServerResult;
use crate::http::{REQUEST_ID_HEADER, Request, Response};
use crate::middleware::Handler;

pub const SUCCESS_MESSAGE: &str = "Error report sent successfully";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportReply<'a> {
	success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<&'a str>,
	request_id: &'a str,
	timestamp: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	environment: Option<&'a str>,
}

pub struct ReportHandler {
	reporter: ErrorReporter,
	environment: Environment,
}

impl ReportHandler {
	pub fn new(reporter: ErrorReporter, environment: Environment) -> Self {
		Self {
			reporter,
			environment,
		}
	}

	pub fn from_settings(settings: &ReportingSettings) -> DeliveryResult<Self> {
		Ok(Self::new(
			ErrorReporter::from_settings(settings)?,
			settings.environment,
		))
	}

	/// Answer with `reply`, echoing its request id on the header
	fn reply(&self, response: Response, reply: ReportReply<'_>) -> ServerResult<Response> {
		response
			.with_header(HeaderName::from_static(REQUEST_ID_HEADER), reply.request_id)?
			.with_json(&reply)
	}
}

fn timestamp() -> String {
	Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl Handler for ReportHandler {
	async fn handle(&self, request: Request) -> ServerResult<Response> {
		let request_id = request
			.request_id()
			.map(str::to_string)
			.unwrap_or_else(generate_request_id);

		if request.method != Method::POST {
			tracing::debug!(method = %request.method, request_id = %request_id, "rejected method");
			return self.reply(
				Response::method_not_allowed(),
				ReportReply {
					success: false,
					message: None,
					error: Some(METHOD_NOT_ALLOWED),
					request_id: &request_id,
					timestamp: timestamp(),
					environment: None,
				},
			);
		}

		let environment = self.environment.as_str();
		let submission: ReportSubmission = match request.json() {
			Ok(submission) => submission,
			Err(e) => {
				let message = e.to_string();
				tracing::warn!(request_id = %request_id, error = %message, "unreadable report body");
				return self.reply(
					Response::internal_server_error(),
					ReportReply {
						success: false,
						message: None,
						error: Some(&message),
						request_id: &request_id,
						timestamp: timestamp(),
						environment: Some(environment),
					},
				);
			}
		};

		// an id carried in the body wins over the header
		let report = submission.into_report(Some(request_id));
		let request_id = report.request_id.clone();
		match self.reporter.submit(report).await {
			Ok(_) => self.reply(
				Response::ok(),
				ReportReply {
					success: true,
					message: Some(SUCCESS_MESSAGE),
					error: None,
					request_id: &request_id,
					timestamp: timestamp(),
					environment: Some(environment),
				},
			),
			Err(e) => {
				let message = e.to_string();
				self.reply(
					Response::internal_server_error(),
					ReportReply {
						success: false,
						message: None,
						error: Some(&message),
						request_id: &request_id,
						timestamp: timestamp(),
						environment: Some(environment),
					},
				)
			}
		}
	}
}
