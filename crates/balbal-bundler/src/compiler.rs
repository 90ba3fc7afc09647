//! TypeScript/JSX compiler
//!
//! Strips TypeScript syntax and lowers JSX to calls against a global element
//! factory, leaving ES module syntax in place for the linker.
//!
//! There is one [`Compiler`] per process. [`Compiler::shared`] initializes it
//! on first use; callers arriving while initialization is in flight wait for
//! that attempt instead of starting their own. A failed attempt leaves the
//! slot empty so the next caller retries.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use balbal_conf::BundlerSettings;
use balbal_core::SourceDialect;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxRuntime, TransformOptions, Transformer};
use tokio::sync::OnceCell;

use crate::error::{BuildError, BuildResult};

static SHARED: OnceCell<Arc<Compiler>> = OnceCell::const_new();
static INITIALIZATIONS: AtomicUsize = AtomicUsize::new(0);

const PROBE_SOURCE: &str = "export default function Probe(): JSX.Element { return <></>; }";

/// How JSX is lowered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxPragma {
	/// e.g. `React.createElement`
	pub factory: String,
	/// e.g. `React.Fragment`
	pub fragment: String,
}

impl Default for JsxPragma {
	fn default() -> Self {
		Self::from_settings(&BundlerSettings::default())
	}
}

impl JsxPragma {
	pub fn from_settings(settings: &BundlerSettings) -> Self {
		Self {
			factory: settings.jsx_factory.clone(),
			fragment: settings.jsx_fragment.clone(),
		}
	}

	fn transform_options(&self) -> TransformOptions {
		let mut options = TransformOptions::default();
		options.jsx.jsx_plugin = true;
		options.jsx.runtime = JsxRuntime::Classic;
		options.jsx.pragma = Some(self.factory.clone());
		options.jsx.pragma_frag = Some(self.fragment.clone());
		options.jsx.development = false;
		// keep value imports that are only referenced from JSX
		options.typescript.only_remove_type_imports = true;
		options
	}
}

/// Process-wide compiler
#[derive(Debug)]
pub struct Compiler {
	compiled: AtomicUsize,
}

impl Compiler {
	/// The shared compiler, initializing it on first use
	pub async fn shared() -> BuildResult<Arc<Compiler>> {
		SHARED
			.get_or_try_init(|| async {
				let compiler = tokio::task::spawn_blocking(Compiler::initialize)
					.await
					.map_err(|e| BuildError::Init(e.to_string()))??;
				Ok(Arc::new(compiler))
			})
			.await
			.cloned()
	}

	/// How many times initialization has run in this process
	pub fn initialization_count() -> usize {
		INITIALIZATIONS.load(Ordering::SeqCst)
	}

	fn initialize() -> BuildResult<Self> {
		INITIALIZATIONS.fetch_add(1, Ordering::SeqCst);
		let compiler = Self {
			compiled: AtomicUsize::new(0),
		};

		let pragma = JsxPragma::default();
		let probe = compiler
			.compile("probe.tsx", PROBE_SOURCE, SourceDialect::TypeScriptJsx, &pragma)
			.map_err(|e| BuildError::Init(e.to_string()))?;
		if !probe.contains(&pragma.fragment) {
			return Err(BuildError::Init(
				"JSX was not lowered to the configured factory".to_string(),
			));
		}

		tracing::info!("compiler initialized");
		Ok(compiler)
	}

	/// Number of modules compiled so far
	pub fn compiled_modules(&self) -> usize {
		self.compiled.load(Ordering::Relaxed)
	}

	/// Compile one module to plain JavaScript with ES module syntax intact.
	///
	/// All diagnostics are reported together as a single
	/// [`BuildError::Compile`].
	pub fn compile(
		&self,
		path: &str,
		source: &str,
		dialect: SourceDialect,
		pragma: &JsxPragma,
	) -> BuildResult<String> {
		let allocator = Allocator::default();
		let source_type = match dialect {
			SourceDialect::TypeScriptJsx => SourceType::tsx(),
			SourceDialect::JavaScriptJsx => SourceType::jsx(),
		};

		let parsed = Parser::new(&allocator, source, source_type).parse();
		if !parsed.errors.is_empty() {
			return Err(BuildError::compile(path, parsed.errors));
		}
		let mut program = parsed.program;

		let semantic = SemanticBuilder::new()
			.with_excess_capacity(2.0)
			.build(&program);
		if !semantic.errors.is_empty() {
			return Err(BuildError::compile(path, semantic.errors));
		}
		let scoping = semantic.semantic.into_scoping();

		let options = pragma.transform_options();
		let transformed = Transformer::new(&allocator, Path::new(path), &options)
			.build_with_scoping(scoping, &mut program);
		if !transformed.errors.is_empty() {
			return Err(BuildError::compile(path, transformed.errors));
		}

		self.compiled.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(path = %path, "module compiled");
		Ok(Codegen::new().build(&program).code)
	}
}
