//! Editor session
//!
//! [`EditorSession`] owns the project files and sequences a run:
//! compile, render, and file runtime failures. Runs move the session
//! through [`SessionPhase`]; AI generation is tracked by a separate flag
//! and may overlap an idle session but never another generation.
//!
//! State lives behind a mutex that is never held across an `.await`.
//! Phase and flag changes are undone by drop guards, so a build or render
//! that fails (or a future that is cancelled) always leaves the session idle.

use std::fmt;
use std::sync::Arc;

use balbal_bundler::{BundleEngine, Compiler};
use balbal_conf::Settings;
use balbal_core::{ConsoleLog, VirtualFileStore};
use balbal_preview::{PreviewError, PreviewFrame, PreviewRenderer};
use balbal_report::ErrorReporter;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{GenerationError, SessionError, SessionResult};
use crate::generation::{ChatCompletionClient, GenerationClient, GenerationRequest};
use crate::parse::{
	ParsedGeneration, normalize_generated_path, parse_generation, prepare_generated_source,
};

const WELCOME_APP: &str = r#"import React from 'react';
import { View, Text, StyleSheet } from 'react-native';

export default function App() {
  return (
    <View style={styles.container}>
      <Text style={styles.title}>👋 Welcome to BalBal.io!</Text>
      <Text style={styles.subtitle}>Describe an app and press Generate, or edit this file and press Run.</Text>
    </View>
  );
}

const styles = StyleSheet.create({
  container: { flex: 1, alignItems: 'center', justifyContent: 'center', padding: 24 },
  title: { fontSize: 24, fontWeight: 'bold', marginBottom: 8 },
  subtitle: { fontSize: 16, color: '#666666', textAlign: 'center' },
});
"#;

const INIT_BANNER: [&str; 4] = [
	"🚀 Initializing development environment...",
	"✨ Dependencies installed successfully",
	"🔧 Babel transpile ready",
	"🎯 React runtime loaded",
];

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
	Idle,
	Compiling,
	Rendering,
}

impl fmt::Display for SessionPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Idle => write!(f, "idle"),
			Self::Compiling => write!(f, "compiling"),
			Self::Rendering => write!(f, "rendering"),
		}
	}
}

/// Everything the UI shows about a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
	pub files: VirtualFileStore,
	/// File open in the editor; runs build it as the entry
	pub selected_file: String,
	pub prompt: String,
	pub phase: SessionPhase,
	pub generating: bool,
	pub console: ConsoleLog,
	/// Document of the last preview frame, kept after runtime failures
	pub preview_document: Option<String>,
	pub compiler_ready: bool,
	pub has_generated: bool,
}

/// What a successful generation changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
	/// Written paths, first one now selected
	pub paths: Vec<String>,
	/// How the response was read: `map`, `single_file` or `unparseable`
	pub kind: &'static str,
}

/// Undoes a state change when dropped
struct Reset<'a> {
	state: &'a Mutex<SessionState>,
	undo: fn(&mut SessionState),
}

impl Drop for Reset<'_> {
	fn drop(&mut self) {
		(self.undo)(&mut self.state.lock());
	}
}

pub struct EditorSession {
	state: Mutex<SessionState>,
	engine: BundleEngine,
	renderer: Arc<PreviewRenderer>,
	generator: Option<Arc<dyn GenerationClient>>,
}

impl fmt::Debug for EditorSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("EditorSession")
			.field("selected_file", &state.selected_file)
			.field("phase", &state.phase)
			.field("generating", &state.generating)
			.field("files", &state.files.len())
			.field("generator", &self.generator.is_some())
			.finish_non_exhaustive()
	}
}

impl EditorSession {
	/// A session holding the welcome project
	pub fn new(engine: BundleEngine, renderer: Arc<PreviewRenderer>) -> Self {
		let default_entry = engine.settings().default_entry.clone();
		let mut files = VirtualFileStore::new();
		files.set(default_entry.clone(), WELCOME_APP);
		let mut console = ConsoleLog::new();
		for line in INIT_BANNER {
			console.push(line);
		}

		Self {
			state: Mutex::new(SessionState {
				files,
				selected_file: default_entry,
				prompt: String::new(),
				phase: SessionPhase::Idle,
				generating: false,
				console,
				preview_document: None,
				compiler_ready: false,
				has_generated: false,
			}),
			engine,
			renderer,
			generator: None,
		}
	}

	/// Session wired from `settings`. Generation is enabled when an API key
	/// is configured.
	pub fn from_settings(settings: &Settings, reporter: ErrorReporter) -> SessionResult<Self> {
		let renderer =
			PreviewRenderer::from_settings(settings, reporter).map_err(PreviewError::from)?;
		let session = Self::new(BundleEngine::new(settings.bundler.clone()), Arc::new(renderer));
		Ok(match ChatCompletionClient::from_settings(&settings.generation)? {
			Some(client) => session.with_generator(Arc::new(client)),
			None => session,
		})
	}

	pub fn with_generator(mut self, generator: Arc<dyn GenerationClient>) -> Self {
		self.generator = Some(generator);
		self
	}

	/// Replace the project files
	pub fn with_files(self, files: VirtualFileStore) -> Self {
		self.state.lock().files = files;
		self
	}

	pub fn engine(&self) -> &BundleEngine {
		&self.engine
	}

	pub fn renderer(&self) -> &PreviewRenderer {
		&self.renderer
	}

	fn default_entry(&self) -> &str {
		&self.engine.settings().default_entry
	}

	/// Initialize the shared compiler, reporting the outcome once per session
	pub async fn ensure_compiler(&self) -> SessionResult<()> {
		if self.state.lock().compiler_ready {
			return Ok(());
		}
		match Compiler::shared().await {
			Ok(_) => {
				let mut state = self.state.lock();
				if !state.compiler_ready {
					state.compiler_ready = true;
					state.console.push("🛠️ Compiler initialized");
				}
				Ok(())
			}
			Err(e) => {
				tracing::error!(error = %e, "compiler initialization failed");
				self.push(format!("❌ Compiler initialization failed: {}", e));
				Err(e.into())
			}
		}
	}

	pub fn update_file(&self, path: impl Into<String>, content: impl Into<String>) {
		self.state.lock().files.set(path, content);
	}

	pub fn remove_file(&self, path: &str) -> Option<String> {
		self.state.lock().files.remove(path)
	}

	/// Change the file open in the editor, which is also the next run's entry
	pub fn select_file(&self, path: impl Into<String>) {
		let path = path.into();
		tracing::debug!(path = %path, "file selected");
		self.state.lock().selected_file = path;
	}

	pub fn set_prompt(&self, prompt: impl Into<String>) {
		self.state.lock().prompt = prompt.into();
	}

	pub fn files(&self) -> VirtualFileStore {
		self.state.lock().files.clone()
	}

	pub fn selected_file(&self) -> String {
		self.state.lock().selected_file.clone()
	}

	pub fn console(&self) -> ConsoleLog {
		self.state.lock().console.clone()
	}

	pub fn phase(&self) -> SessionPhase {
		self.state.lock().phase
	}

	pub fn is_generating(&self) -> bool {
		self.state.lock().generating
	}

	pub fn preview_document(&self) -> Option<String> {
		self.state.lock().preview_document.clone()
	}

	/// Copy of the whole session state
	pub fn snapshot(&self) -> SessionState {
		self.state.lock().clone()
	}

	fn push(&self, text: impl Into<String>) {
		self.state.lock().console.push(text);
	}

	/// Build the selected file and mount the result.
	///
	/// Only one run is in flight at a time; a second call while one is
	/// running returns [`SessionError::Busy`]. A runtime failure of the
	/// bundle is returned as an error but leaves the session usable.
	pub async fn run(&self) -> SessionResult<PreviewFrame> {
		let (entry, files) = {
			let mut state = self.state.lock();
			if state.phase != SessionPhase::Idle {
				let notice = format!("⏳ Already {}, wait for the current run", state.phase);
				state.console.push(notice);
				return Err(SessionError::Busy);
			}
			state.phase = SessionPhase::Compiling;
			let entry = state.selected_file.clone();
			state.console.push(format!("🔨 Building {}...", entry));
			(entry, state.files.clone())
		};
		let _idle = Reset {
			state: &self.state,
			undo: |state| state.phase = SessionPhase::Idle,
		};
		tracing::info!(entry = %entry, files = files.len(), "run started");

		self.ensure_compiler().await?;
		let bundle = match self.engine.build(&entry, &files).await {
			Ok(bundle) => bundle,
			Err(e) => {
				tracing::warn!(entry = %entry, error = %e, "build failed");
				self.push(format!("❌ Build failed: {}", e));
				return Err(e.into());
			}
		};

		{
			let mut state = self.state.lock();
			state.phase = SessionPhase::Rendering;
			state.console.push(format!(
				"✅ Build succeeded ({} modules, {} bytes)",
				bundle.modules.len(),
				bundle.size()
			));
		}

		match self.renderer.render(&bundle, &files, Some(&entry)).await {
			Ok(frame) => {
				let mut state = self.state.lock();
				state.preview_document = Some(frame.document.clone());
				state.console.push("🖼️ Preview updated");
				tracing::info!(entry = %entry, generation = frame.generation, "run finished");
				Ok(frame)
			}
			Err(e) => {
				self.record_preview_failure(&e);
				Err(e.into())
			}
		}
	}

	/// Handle a message posted by the preview page, such as an uncaught
	/// error inside the frame. Returns `None` for unrelated messages.
	pub async fn handle_frame_message(&self, message: &serde_json::Value) -> Option<SessionError> {
		let (files, entry) = {
			let state = self.state.lock();
			(state.files.clone(), state.selected_file.clone())
		};
		let error = self
			.renderer
			.handle_frame_message(message, &files, &entry, Some(&entry))
			.await?;
		self.record_preview_failure(&error);
		Some(error.into())
	}

	fn record_preview_failure(&self, error: &PreviewError) {
		let document = self.renderer.current_frame().map(|f| f.document().to_string());
		let mut state = self.state.lock();
		state.preview_document = document;
		match error {
			PreviewError::Runtime { error, delivery } => {
				state.console.push(format!("❌ Runtime error: {}", error));
				match delivery {
					Ok(receipt) => state
						.console
						.push(format!("📨 Error report sent ({})", receipt.request_id)),
					Err(e) => state
						.console
						.push(format!("⚠️ Error report not delivered: {}", e)),
				};
			}
			PreviewError::Surface(e) => {
				tracing::error!(error = %e, "preview surface failed");
				state.console.push(format!("❌ Preview failed: {}", e));
			}
		}
	}

	/// Ask the generation client for code and merge the answer into the
	/// project. The first written path becomes the selected file and the
	/// prompt is cleared.
	pub async fn generate(&self) -> SessionResult<GenerationOutcome> {
		let (generator, request) = {
			let mut state = self.state.lock();
			if state.prompt.trim().is_empty() {
				return Err(SessionError::EmptyPrompt);
			}
			if state.generating {
				return Err(SessionError::AlreadyGenerating);
			}
			let Some(generator) = self.generator.clone() else {
				let error = GenerationError::NotConfigured;
				state
					.console
					.push(format!("❌ {}. Set BALBAL_AI_API_KEY to enable it.", error));
				return Err(error.into());
			};
			state.generating = true;
			state.console.push(format!(
				"🤖 Generating code with AI... ({})",
				chrono::Local::now().format("%H:%M:%S")
			));
			let request = GenerationRequest::new(state.prompt.clone());
			let request = match state.files.get(&state.selected_file) {
				Some(code) if state.has_generated => request.with_current_code(code),
				_ => request,
			};
			(generator, request)
		};
		let _done = Reset {
			state: &self.state,
			undo: |state| state.generating = false,
		};

		let raw = match generator.generate(&request).await {
			Ok(raw) => raw,
			Err(e) => {
				tracing::warn!(error = %e, "code generation failed");
				self.push(format!("❌ {}", e));
				return Err(e.into());
			}
		};

		let parsed = parse_generation(&raw);
		let kind = parsed.kind();
		let source_root = self.engine.settings().source_root.clone();
		let generated: Vec<(String, String)> = match parsed {
			ParsedGeneration::Map(files) => files
				.into_iter()
				.map(|(path, content)| {
					let path = normalize_generated_path(&path, &source_root);
					let content = prepare_generated_source(&path, &content);
					(path, content)
				})
				.collect(),
			ParsedGeneration::SingleFile(code) => {
				let entry = self.default_entry().to_string();
				let code = prepare_generated_source(&entry, &code);
				vec![(entry, code)]
			}
			ParsedGeneration::Unparseable(text) => {
				self.push("⚠️ Could not read the AI response as a file map, using it as the entry file");
				vec![(self.default_entry().to_string(), text)]
			}
		};

		let paths: Vec<String> = generated.iter().map(|(path, _)| path.clone()).collect();
		{
			let mut state = self.state.lock();
			for (path, content) in generated {
				state.files.set(path, content);
			}
			if let Some(first) = paths.first() {
				state.selected_file = first.clone();
			}
			state.prompt.clear();
			state.has_generated = true;
			state.console.push(format!(
				"✨ Generated {} files at {}",
				paths.len(),
				chrono::Local::now().format("%H:%M:%S")
			));
		}
		tracing::info!(files = paths.len(), kind, "generated code merged");

		Ok(GenerationOutcome { paths, kind })
	}
}
