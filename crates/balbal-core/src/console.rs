//! User-facing console log

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::id::generate_unique_id;

/// One status or diagnostic line shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleMessage {
	pub id: String,
	pub text: String,
	pub timestamp: DateTime<Utc>,
}

/// Append-only sequence of [`ConsoleMessage`]s in arrival order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConsoleLog {
	messages: Vec<ConsoleMessage>,
}

impl ConsoleLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a line and return the stored message
	pub fn push(&mut self, text: impl Into<String>) -> &ConsoleMessage {
		self.messages.push(ConsoleMessage {
			id: generate_unique_id(),
			text: text.into(),
			timestamp: Utc::now(),
		});
		&self.messages[self.messages.len() - 1]
	}

	pub fn messages(&self) -> &[ConsoleMessage] {
		&self.messages
	}

	pub fn texts(&self) -> impl Iterator<Item = &str> {
		self.messages.iter().map(|m| m.text.as_str())
	}

	pub fn last(&self) -> Option<&ConsoleMessage> {
		self.messages.last()
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}
}
