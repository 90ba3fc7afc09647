//! SMTP delivery

use async_trait::async_trait;
use balbal_conf::ReportingSettings;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{DeliveryReceipt, ReportTransport};
use crate::error::{DeliveryError, DeliveryResult};
use crate::format::RenderedReport;
use crate::report::ErrorReport;

/// Sends reports as multipart (plain text + HTML) mail over STARTTLS
pub struct MailTransport {
	settings: ReportingSettings,
	mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl MailTransport {
	/// Configure the relay. No connection is made until the first delivery.
	pub fn new(settings: &ReportingSettings) -> DeliveryResult<Self> {
		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
			.map_err(|e| DeliveryError::Transport(e.to_string()))?
			.port(settings.smtp_port);
		if let (Some(user), Some(password)) = (&settings.smtp_user, &settings.smtp_password) {
			builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
		}
		Ok(Self {
			settings: settings.clone(),
			mailer: builder.build(),
		})
	}
}

/// Build the outgoing mail for `rendered`.
///
/// Fails with [`DeliveryError::MissingRecipient`] before anything else when
/// no recipient is configured.
pub fn compose_message(
	settings: &ReportingSettings,
	rendered: &RenderedReport,
) -> DeliveryResult<Message> {
	let recipient = settings
		.recipient
		.as_deref()
		.ok_or(DeliveryError::MissingRecipient)?;
	let sender = settings.sender().ok_or(DeliveryError::MissingSender)?;

	Message::builder()
		.from(parse_mailbox(sender)?)
		.to(parse_mailbox(recipient)?)
		.subject(rendered.subject.clone())
		.multipart(MultiPart::alternative_plain_html(
			rendered.text.clone(),
			rendered.html.clone(),
		))
		.map_err(|e| DeliveryError::Message(e.to_string()))
}

fn parse_mailbox(address: &str) -> DeliveryResult<Mailbox> {
	address
		.parse::<Mailbox>()
		.map_err(|e| DeliveryError::InvalidAddress(format!("{}: {}", address, e)))
}

#[async_trait]
impl ReportTransport for MailTransport {
	fn name(&self) -> &'static str {
		"smtp"
	}

	async fn deliver(
		&self,
		report: &ErrorReport,
		rendered: &RenderedReport,
	) -> DeliveryResult<DeliveryReceipt> {
		let message = compose_message(&self.settings, rendered)?;
		self.mailer
			.send(message)
			.await
			.map_err(|e| DeliveryError::Transport(e.to_string()))?;

		Ok(DeliveryReceipt {
			request_id: report.request_id.clone(),
			message: "Error report sent successfully".to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn rendered() -> RenderedReport {
		RenderedReport {
			subject: "[BalBal.io] Error Report - TypeError (req_1_abcdefg)".to_string(),
			text: "Name: TypeError".to_string(),
			html: "Name: TypeError".to_string(),
		}
	}

	fn settings(recipient: Option<&str>, user: Option<&str>) -> ReportingSettings {
		ReportingSettings {
			recipient: recipient.map(str::to_string),
			smtp_user: user.map(str::to_string),
			..Default::default()
		}
	}

	#[rstest]
	fn test_message_is_addressed_from_the_smtp_user() {
		// Arrange
		let settings = settings(Some("ops@balbal.io"), Some("bot@balbal.io"));

		// Act
		let message = compose_message(&settings, &rendered()).unwrap();

		// Assert
		let raw = String::from_utf8(message.formatted()).unwrap();
		assert!(raw.contains("To: ops@balbal.io"));
		assert!(raw.contains("From: bot@balbal.io"));
		assert!(raw.contains("Subject: [BalBal.io] Error Report - TypeError (req_1_abcdefg)"));
		assert!(raw.contains("multipart/alternative"));
	}

	#[rstest]
	#[case(settings(None, Some("bot@balbal.io")), DeliveryError::MissingRecipient)]
	#[case(settings(Some("ops@balbal.io"), None), DeliveryError::MissingSender)]
	fn test_missing_configuration(#[case] settings: ReportingSettings, #[case] expected: DeliveryError) {
		let err = compose_message(&settings, &rendered()).unwrap_err();

		assert_eq!(err, expected);
	}

	#[rstest]
	fn test_invalid_recipient() {
		let settings = settings(Some("not an address"), Some("bot@balbal.io"));

		let err = compose_message(&settings, &rendered()).unwrap_err();

		assert!(matches!(err, DeliveryError::InvalidAddress(_)));
	}
}
