//! AI code generation client boundary

use std::time::Duration;

use async_trait::async_trait;
use balbal_conf::GenerationSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You write small React Native apps that run in a web preview. \
Answer with a single JSON object and nothing else. Each key is a file path relative to the \
project source directory, without a leading `src/` (for example `App.tsx` or \
`screens/HomeScreen.tsx`). Each value is the complete content of that file. \
Use TypeScript, function components and the `react-native` primitives (View, Text, \
TouchableOpacity, StyleSheet). Use `@react-navigation/native` for navigation between screens. \
`App.tsx` must default-export the root component named `App`.";

/// Prompt plus the context the model gets with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
	pub prompt: String,
	/// Code of the selected file, sent for follow-up requests
	pub current_code: Option<String>,
	/// No generation has succeeded in this session yet
	pub first_request: bool,
}

impl GenerationRequest {
	pub fn new(prompt: impl Into<String>) -> Self {
		Self {
			prompt: prompt.into(),
			current_code: None,
			first_request: true,
		}
	}

	pub fn with_current_code(mut self, code: impl Into<String>) -> Self {
		self.current_code = Some(code.into());
		self.first_request = false;
		self
	}

	/// Text of the user message
	pub fn user_message(&self) -> String {
		let mut message = if self.first_request {
			format!("Create a mobile app with the following requirements:\n\n{}", self.prompt.trim())
		} else {
			format!("Update the app with the following changes:\n\n{}", self.prompt.trim())
		};
		if let Some(code) = self.current_code.as_deref().filter(|c| !c.trim().is_empty()) {
			message.push_str("\n\nCurrent code of the selected file:\n```tsx\n");
			message.push_str(code);
			message.push_str("\n```");
		}
		message
	}
}

/// Anything that turns a prompt into raw model output
#[async_trait]
pub trait GenerationClient: Send + Sync {
	/// Raw response text; parsing is the caller's job
	async fn generate(&self, request: &GenerationRequest) -> GenerationResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
	role: &'static str,
	content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
	model: &'a str,
	messages: Vec<ChatMessage<'a>>,
	temperature: f64,
	max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
	#[serde(default)]
	choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
	message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
	#[serde(default)]
	content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
	message: String,
}

/// Client for an OpenAI-style chat completions endpoint
pub struct ChatCompletionClient {
	settings: GenerationSettings,
	client: Client,
}

impl ChatCompletionClient {
	pub fn new(settings: GenerationSettings) -> GenerationResult<Self> {
		let client = Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| GenerationError::Request(e.to_string()))?;
		Ok(Self::with_client(settings, client))
	}

	pub fn with_client(settings: GenerationSettings, client: Client) -> Self {
		Self { settings, client }
	}

	/// Client for `settings`, or `None` when no API key is set
	pub fn from_settings(settings: &GenerationSettings) -> GenerationResult<Option<Self>> {
		match settings.api_key.as_deref() {
			Some(key) if !key.trim().is_empty() => Self::new(settings.clone()).map(Some),
			_ => Ok(None),
		}
	}

	pub fn settings(&self) -> &GenerationSettings {
		&self.settings
	}
}

#[async_trait]
impl GenerationClient for ChatCompletionClient {
	async fn generate(&self, request: &GenerationRequest) -> GenerationResult<String> {
		let api_key = self
			.settings
			.api_key
			.as_deref()
			.filter(|k| !k.trim().is_empty())
			.ok_or(GenerationError::NotConfigured)?;

		let user_message = request.user_message();
		let body = ChatRequest {
			model: &self.settings.model,
			messages: vec![
				ChatMessage {
					role: "system",
					content: SYSTEM_PROMPT,
				},
				ChatMessage {
					role: "user",
					content: &user_message,
				},
			],
			temperature: self.settings.temperature,
			max_tokens: self.settings.max_tokens,
		};

		tracing::debug!(model = %self.settings.model, "requesting code generation");
		let response = self
			.client
			.post(&self.settings.api_url)
			.bearer_auth(api_key)
			.json(&body)
			.send()
			.await
			.map_err(|e| GenerationError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let message = response
				.json::<ApiErrorBody>()
				.await
				.map(|b| b.error.message)
				.unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
			tracing::warn!(status = status.as_u16(), error = %message, "code generation rejected");
			return Err(GenerationError::Status {
				status: status.as_u16(),
				message,
			});
		}

		let parsed: ChatResponse = response
			.json()
			.await
			.map_err(|e| GenerationError::Request(e.to_string()))?;
		parsed
			.choices
			.into_iter()
			.next()
			.and_then(|choice| choice.message.content)
			.filter(|content| !content.trim().is_empty())
			.ok_or(GenerationError::EmptyResponse)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_first_request_message() {
		// Arrange
		let request = GenerationRequest::new("  a todo list  ");

		// Act
		let message = request.user_message();

		// Assert
		assert!(message.starts_with("Create a mobile app"));
		assert!(message.ends_with("a todo list"));
		assert!(!message.contains("Current code"));
	}

	#[rstest]
	fn test_follow_up_includes_current_code() {
		let request = GenerationRequest::new("make it blue").with_current_code("export default 1;");

		let message = request.user_message();

		assert!(!request.first_request);
		assert!(message.starts_with("Update the app"));
		assert!(message.contains("```tsx\nexport default 1;\n```"));
	}

	#[rstest]
	#[case(None)]
	#[case(Some("   "))]
	fn test_client_requires_api_key(#[case] key: Option<&str>) {
		let settings = GenerationSettings {
			api_key: key.map(str::to_string),
			..Default::default()
		};

		assert!(ChatCompletionClient::from_settings(&settings).unwrap().is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_key_is_not_configured() {
		let client = ChatCompletionClient::new(GenerationSettings::default()).unwrap();

		let err = client.generate(&GenerationRequest::new("x")).await.unwrap_err();

		assert_eq!(err, GenerationError::NotConfigured);
	}

	#[rstest]
	fn test_chat_response_shape() {
		let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"App.tsx\":\"x\"}"}}]}"#;

		let parsed: ChatResponse = serde_json::from_str(body).unwrap();

		assert_eq!(parsed.choices[0].message.content.as_deref(), Some(r#"{"App.tsx":"x"}"#));
	}
}
