//! Preview renderer
//!
//! Every run rebuilds the preview document, replaces the sandboxed frame and
//! mounts the bundle on the headless surface. A bundle that throws never
//! fails silently: the error is filed with the [`ErrorReporter`] together
//! with the project's file list and entry file before it is returned.

use balbal_conf::{PreviewSettings, Settings};
use balbal_core::{Bundle, VirtualFileStore};
use balbal_report::{DeliveryReceipt, DeliveryResult, ErrorReporter, ReportContext};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::document::{PREVIEW_ERROR_MESSAGE, build_preview_document};
use crate::error::{PreviewError, RuntimeEvaluationError, SurfaceResult};
use crate::frame::{FrameHost, SandboxedFrame};
use crate::scope::ExecutionScope;
use crate::surface::{ConsoleEntry, MountOutcome, PreviewSurface};

pub const REPORT_COMPONENT: &str = "Preview";
pub const REPORT_ACTION: &str = "Code Execution";

/// A successfully mounted preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
	/// Full preview page
	pub document: String,
	/// `<iframe>` markup carrying the page
	pub frame_html: String,
	/// Content of the mount element after the root component rendered
	pub mount_html: String,
	pub generation: u64,
	pub console: Vec<ConsoleEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameMessage {
	#[serde(rename = "type")]
	kind: String,
	error: RuntimeEvaluationError,
}

pub struct PreviewRenderer {
	surface: PreviewSurface,
	reporter: ErrorReporter,
	settings: PreviewSettings,
	scope: ExecutionScope,
	frames: Mutex<FrameHost>,
}

impl std::fmt::Debug for PreviewRenderer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PreviewRenderer")
			.field("settings", &self.settings)
			.field("generation", &self.generation())
			.finish_non_exhaustive()
	}
}

impl PreviewRenderer {
	pub fn new(
		settings: PreviewSettings,
		scope: ExecutionScope,
		reporter: ErrorReporter,
	) -> SurfaceResult<Self> {
		let surface = PreviewSurface::new(&settings, &scope)?;
		Ok(Self {
			surface,
			reporter,
			settings,
			scope,
			frames: Mutex::new(FrameHost::new()),
		})
	}

	pub fn from_settings(settings: &Settings, reporter: ErrorReporter) -> SurfaceResult<Self> {
		Self::new(
			settings.preview.clone(),
			ExecutionScope::from_settings(&settings.bundler, &settings.preview),
			reporter,
		)
	}

	pub fn scope(&self) -> &ExecutionScope {
		&self.scope
	}

	pub fn settings(&self) -> &PreviewSettings {
		&self.settings
	}

	pub fn surface(&self) -> &PreviewSurface {
		&self.surface
	}

	/// Render `bundle` from scratch.
	///
	/// `files` is the project the bundle was built from and `selected` the
	/// file open in the editor; both are attached to any error report.
	pub async fn render(
		&self,
		bundle: &Bundle,
		files: &VirtualFileStore,
		selected: Option<&str>,
	) -> Result<PreviewFrame, PreviewError> {
		let document = build_preview_document(bundle, &self.settings, &self.scope);
		let frame = SandboxedFrame::new(document.clone(), &self.settings);
		let frame_html = frame.to_html();
		let generation = self.frames.lock().replace(frame);

		tracing::debug!(
			entry = %bundle.entry,
			generation,
			bytes = bundle.size(),
			"mounting preview"
		);

		match self.surface.mount(bundle.classic_script()).await? {
			MountOutcome::Rendered { html, console } => {
				tracing::info!(entry = %bundle.entry, generation, "preview rendered");
				Ok(PreviewFrame {
					document,
					frame_html,
					mount_html: html,
					generation,
					console,
				})
			}
			MountOutcome::Failed { error, .. } => {
				tracing::warn!(entry = %bundle.entry, error = %error, "preview failed");
				let delivery = self
					.report(error.clone(), files, &bundle.entry, selected)
					.await;
				Err(PreviewError::Runtime { error, delivery })
			}
		}
	}

	/// Show an already built preview page, without mounting it headlessly.
	/// Returns the new frame generation.
	pub fn present_document(&self, document: String) -> u64 {
		self.frames
			.lock()
			.replace(SandboxedFrame::new(document, &self.settings))
	}

	/// Handle a message posted by a preview page. Returns `None` when
	/// `message` is not a preview error report.
	pub async fn handle_frame_message(
		&self,
		message: &Value,
		files: &VirtualFileStore,
		entry: &str,
		selected: Option<&str>,
	) -> Option<PreviewError> {
		let message = FrameMessage::deserialize(message).ok()?;
		if message.kind != PREVIEW_ERROR_MESSAGE {
			return None;
		}
		tracing::warn!(entry, error = %message.error, "preview frame reported an error");
		let delivery = self
			.report(message.error.clone(), files, entry, selected)
			.await;
		Some(PreviewError::Runtime {
			error: message.error,
			delivery,
		})
	}

	pub fn current_frame(&self) -> Option<SandboxedFrame> {
		self.frames.lock().current().cloned()
	}

	pub fn generation(&self) -> u64 {
		self.frames.lock().generation()
	}

	pub fn dispose(&self) -> Option<SandboxedFrame> {
		self.frames.lock().dispose()
	}

	async fn report(
		&self,
		error: RuntimeEvaluationError,
		files: &VirtualFileStore,
		entry: &str,
		selected: Option<&str>,
	) -> DeliveryResult<DeliveryReceipt> {
		self.reporter
			.report(error.into(), Some(preview_context(files, entry, selected)))
			.await
	}
}

/// Report context for a failure of the preview of `files`
pub fn preview_context(
	files: &VirtualFileStore,
	entry: &str,
	selected: Option<&str>,
) -> ReportContext {
	let paths: Vec<&str> = files.paths().collect();
	ReportContext::new(REPORT_COMPONENT, REPORT_ACTION).with_additional_data(json!({
		"files": paths,
		"entry": entry,
		"selectedFile": selected,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_preview_context_lists_files() {
		// Arrange
		let files: VirtualFileStore = [
			("src/App.tsx", "export default function App() {}"),
			("src/theme.ts", "export const theme = {};"),
		]
		.into_iter()
		.collect();

		// Act
		let context = preview_context(&files, "src/App.tsx", Some("src/theme.ts"));

		// Assert
		assert_eq!(context.component.as_deref(), Some("Preview"));
		assert_eq!(context.action.as_deref(), Some("Code Execution"));
		assert_eq!(
			context.additional_data,
			Some(json!({
				"files": ["src/App.tsx", "src/theme.ts"],
				"entry": "src/App.tsx",
				"selectedFile": "src/theme.ts",
			}))
		);
	}
}
