//! Headless preview surface
//!
//! Runs bundles in an embedded ECMAScript engine (boa) against Preact,
//! with preact/compat standing in for React and preact-render-to-string
//! doing the mount, plus the same execution scope the browser document
//! installs. Returns the HTML left in the mount element.
//!
//! # Thread Safety
//!
//! `boa_engine::Context` is `!Send + !Sync`. The surface owns a dedicated
//! thread that creates every context; callers talk to it over a bounded
//! channel and receive results on a oneshot channel they can await.
//!
//! Every call gets a fresh context, so nothing a previous bundle defined
//! can leak into the next mount.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use balbal_conf::PreviewSettings;
use boa_engine::{Context, JsError, JsValue, Source};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{RuntimeEvaluationError, SurfaceError, SurfaceResult};
use crate::scope::{ExecutionScope, js_string};

/// Preact core library
const PREACT_CORE: &str = include_str!("js/preact.js");

/// Preact hooks
const PREACT_HOOKS: &str = include_str!("js/hooks.js");

/// preact/compat, the React-compatible layer
const PREACT_COMPAT: &str = include_str!("js/compat.js");

/// Preact render-to-string library
const PREACT_RENDER_TO_STRING: &str = include_str!("js/render_to_string.js");

/// Minimal host document and the `React`/`ReactDOM` globals
const HEADLESS_HOST: &str = include_str!("js/host.js");

/// Scripts evaluated into every context, in order
const RUNTIME_SCRIPTS: [(&str, &str); 5] = [
	("Preact core", PREACT_CORE),
	("Preact hooks", PREACT_HOOKS),
	("preact/compat", PREACT_COMPAT),
	("Preact render-to-string", PREACT_RENDER_TO_STRING),
	("the headless host", HEADLESS_HOST),
];

const PENDING_COMMANDS: usize = 16;

/// One line written to the console by the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
	pub level: String,
	pub message: String,
}

/// Result of mounting a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
	/// The root component rendered; `html` is the mount element's content
	Rendered {
		html: String,
		console: Vec<ConsoleEntry>,
	},
	/// The bundle threw while evaluating or mounting
	Failed {
		error: RuntimeEvaluationError,
		console: Vec<ConsoleEntry>,
	},
}

impl MountOutcome {
	pub fn console(&self) -> &[ConsoleEntry] {
		match self {
			Self::Rendered { console, .. } | Self::Failed { console, .. } => console,
		}
	}
}

/// Shape of the harness result
#[derive(Debug, Deserialize)]
struct HarnessOutput {
	ok: bool,
	#[serde(default)]
	html: String,
	#[serde(default)]
	error: Option<RuntimeEvaluationError>,
	#[serde(default)]
	logs: Vec<ConsoleEntry>,
}

enum SurfaceCommand {
	Mount {
		script: String,
		response_tx: oneshot::Sender<SurfaceResult<MountOutcome>>,
	},
	Evaluate {
		code: String,
		response_tx: oneshot::Sender<SurfaceResult<String>>,
	},
}

/// Everything the engine thread needs to set up a context
struct Boot {
	prelude: String,
	mount_script: String,
	mount_element_id: String,
	loop_iteration_limit: u64,
	recursion_limit: usize,
}

pub struct PreviewSurface {
	command_tx: SyncSender<SurfaceCommand>,
}

impl std::fmt::Debug for PreviewSurface {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PreviewSurface").finish_non_exhaustive()
	}
}

impl PreviewSurface {
	/// Start the engine thread and check that the runtime and `scope` load
	/// cleanly
	pub fn new(settings: &PreviewSettings, scope: &ExecutionScope) -> SurfaceResult<Self> {
		let boot = Boot {
			prelude: scope.prelude(),
			mount_script: scope.mount_script(),
			mount_element_id: settings.mount_element_id.clone(),
			loop_iteration_limit: settings.loop_iteration_limit,
			recursion_limit: settings.recursion_limit,
		};

		let (command_tx, command_rx) = mpsc::sync_channel::<SurfaceCommand>(PENDING_COMMANDS);
		let (init_tx, init_rx) = mpsc::channel::<SurfaceResult<()>>();

		thread::Builder::new()
			.name("balbal-preview-surface".to_string())
			.spawn(move || surface_thread_main(boot, command_rx, init_tx))
			.map_err(|e| SurfaceError::Init(e.to_string()))?;

		init_rx.recv().map_err(|_| {
			SurfaceError::Init("Surface thread terminated during initialization".to_string())
		})??;

		tracing::info!("preview surface ready");
		Ok(Self { command_tx })
	}

	/// Evaluate `script` (a classic-script bundle) in a fresh context and
	/// mount its root component
	pub async fn mount(&self, script: &str) -> SurfaceResult<MountOutcome> {
		let (response_tx, response_rx) = oneshot::channel();
		self.send(SurfaceCommand::Mount {
			script: script.to_string(),
			response_tx,
		})?;
		response_rx.await.map_err(|_| {
			SurfaceError::Unavailable("Surface thread terminated during mount".to_string())
		})?
	}

	/// Evaluate `code` in a fresh context with the runtime and scope
	/// installed, returning the completion value as a string
	pub async fn evaluate(&self, code: &str) -> SurfaceResult<String> {
		let (response_tx, response_rx) = oneshot::channel();
		self.send(SurfaceCommand::Evaluate {
			code: code.to_string(),
			response_tx,
		})?;
		response_rx.await.map_err(|_| {
			SurfaceError::Unavailable("Surface thread terminated during evaluation".to_string())
		})?
	}

	fn send(&self, command: SurfaceCommand) -> SurfaceResult<()> {
		self.command_tx
			.send(command)
			.map_err(|_| SurfaceError::Unavailable("Surface thread is not running".to_string()))
	}
}

fn surface_thread_main(
	boot: Boot,
	command_rx: Receiver<SurfaceCommand>,
	init_tx: mpsc::Sender<SurfaceResult<()>>,
) {
	if let Err(e) = fresh_context(&boot) {
		let _ = init_tx.send(Err(e));
		return;
	}
	if init_tx.send(Ok(())).is_err() {
		return;
	}

	while let Ok(command) = command_rx.recv() {
		match command {
			SurfaceCommand::Mount {
				script,
				response_tx,
			} => {
				let _ = response_tx.send(mount_in_fresh_context(&boot, &script));
			}
			SurfaceCommand::Evaluate { code, response_tx } => {
				let result = fresh_context(&boot).and_then(|mut context| {
					let value = context
						.eval(Source::from_bytes(code.as_bytes()))
						.map_err(|e| SurfaceError::Eval(js_error_to_string(&e, &mut context)))?;
					js_value_to_string(&value, &mut context)
				});
				let _ = response_tx.send(result);
			}
		}
	}
	tracing::debug!("preview surface thread stopped");
}

fn fresh_context(boot: &Boot) -> SurfaceResult<Context> {
	let mut context = Context::default();
	context
		.runtime_limits_mut()
		.set_loop_iteration_limit(boot.loop_iteration_limit);
	context
		.runtime_limits_mut()
		.set_recursion_limit(boot.recursion_limit);

	for (name, script) in RUNTIME_SCRIPTS {
		context.eval(Source::from_bytes(script)).map_err(|e| {
			SurfaceError::Init(format!(
				"Failed to load {}: {}",
				name,
				js_error_to_string(&e, &mut context)
			))
		})?;
	}
	context
		.eval(Source::from_bytes(boot.prelude.as_bytes()))
		.map_err(|e| {
			SurfaceError::Init(format!(
				"Failed to install the execution scope: {}",
				js_error_to_string(&e, &mut context)
			))
		})?;
	Ok(context)
}

fn mount_in_fresh_context(boot: &Boot, script: &str) -> SurfaceResult<MountOutcome> {
	let mut context = fresh_context(boot)?;
	let harness = harness(boot, script);

	let output = match context.eval(Source::from_bytes(harness.as_bytes())) {
		Ok(value) => js_value_to_string(&value, &mut context)?,
		Err(e) => {
			// runtime limits are not catchable from script
			let message = js_error_to_string(&e, &mut context);
			tracing::warn!(error = %message, "bundle aborted by the engine");
			return Ok(MountOutcome::Failed {
				error: RuntimeEvaluationError::from_engine_message(&message),
				console: Vec::new(),
			});
		}
	};

	let output: HarnessOutput =
		serde_json::from_str(&output).map_err(|e| SurfaceError::Output(e.to_string()))?;
	if output.ok {
		return Ok(MountOutcome::Rendered {
			html: output.html,
			console: output.logs,
		});
	}
	let error = output
		.error
		.ok_or_else(|| SurfaceError::Output("failure without error details".to_string()))?;
	Ok(MountOutcome::Failed {
		error,
		console: output.logs,
	})
}

/// Script that creates the mount element, runs the bundle and the mount
/// call, and reports the outcome as JSON
fn harness(boot: &Boot, script: &str) -> String {
	format!(
		r#"(function () {{
	var container = document.createElement("div");
	container.setAttribute("id", {mount});
	document.body.appendChild(container);
	var result = {{ ok: true, html: "", error: null }};
	try {{
		(0, eval)({bundle});
		(0, eval)({mount_script});
		result.html = container.innerHTML;
	}} catch (error) {{
		result.ok = false;
		result.error = __balbal_describe_error(error);
	}}
	result.logs = __balbal_console;
	return JSON.stringify(result);
}})()"#,
		mount = js_string(&boot.mount_element_id),
		bundle = js_string(script),
		mount_script = js_string(&boot.mount_script),
	)
}

fn js_value_to_string(value: &JsValue, context: &mut Context) -> SurfaceResult<String> {
	value
		.to_string(context)
		.map(|s| s.to_std_string_escaped())
		.map_err(|e| SurfaceError::Eval(js_error_to_string(&e, context)))
}

fn js_error_to_string(error: &JsError, context: &mut Context) -> String {
	error
		.to_opaque(context)
		.to_string(context)
		.map(|s| s.to_std_string_escaped())
		.unwrap_or_else(|_| error.to_string())
}
