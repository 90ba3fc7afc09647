//! Bundle engine
//!
//! Drives a build: every file in the snapshot goes through the
//! [`ImportRewriter`], the module graph is walked from the entry with the
//! [`ModuleResolver`], each reachable module is compiled and linked, and the
//! result is concatenated behind the module registry runtime.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use balbal_conf::{BundlerSettings, OutputFormat};
use balbal_core::bundle::ESM_EXPORT_PREFIX;
use balbal_core::{Bundle, SourceDialect, VirtualFileStore};

use crate::compiler::{Compiler, JsxPragma};
use crate::edit::js_string;
use crate::error::{BuildError, BuildResult};
use crate::linker::{self, LinkedModule, MODULE_RUNTIME, ModuleTarget};
use crate::resolver::{ModuleResolver, Namespace, parent_dir};
use crate::rewrite::ImportRewriter;

/// Builds a [`Bundle`] from an entry path and a snapshot of the project
#[derive(Debug, Clone)]
pub struct BundleEngine {
	settings: BundlerSettings,
	resolver: ModuleResolver,
	rewriter: ImportRewriter,
	pragma: JsxPragma,
}

impl Default for BundleEngine {
	fn default() -> Self {
		Self::new(BundlerSettings::default())
	}
}

impl BundleEngine {
	pub fn new(settings: BundlerSettings) -> Self {
		Self {
			resolver: ModuleResolver::from_settings(&settings),
			pragma: JsxPragma::from_settings(&settings),
			rewriter: ImportRewriter::default(),
			settings,
		}
	}

	/// Replace the import rewriter
	pub fn with_rewriter(mut self, rewriter: ImportRewriter) -> Self {
		self.rewriter = rewriter;
		self
	}

	pub fn settings(&self) -> &BundlerSettings {
		&self.settings
	}

	pub fn resolver(&self) -> &ModuleResolver {
		&self.resolver
	}

	/// Build `entry` against `files`.
	///
	/// The store is copied before anything runs, so edits made while the
	/// build is in flight do not affect it. Either a complete bundle is
	/// returned or the first error encountered.
	pub async fn build(&self, entry: &str, files: &VirtualFileStore) -> BuildResult<Bundle> {
		let compiler = Compiler::shared().await?;
		let engine = self.clone();
		let entry = entry.to_string();
		let snapshot = files.clone();

		tokio::task::spawn_blocking(move || engine.build_snapshot(&compiler, &entry, &snapshot))
			.await
			.map_err(|e| BuildError::Aborted(e.to_string()))?
	}

	fn build_snapshot(
		&self,
		compiler: &Arc<Compiler>,
		entry: &str,
		snapshot: &VirtualFileStore,
	) -> BuildResult<Bundle> {
		if !snapshot.contains(entry) {
			return Err(BuildError::module_not_found(entry, None));
		}

		let rewritten: VirtualFileStore = snapshot
			.entries()
			.map(|(path, content)| {
				let content = if is_script(path) {
					self.rewriter
						.rewrite_as(content, SourceDialect::from_path(path))
				} else {
					content.to_string()
				};
				(path.to_string(), content)
			})
			.collect();

		let mut queue = VecDeque::from([entry.to_string()]);
		let mut seen: HashSet<String> = HashSet::from([entry.to_string()]);
		let mut modules: Vec<LinkedModule> = Vec::new();

		while let Some(path) = queue.pop_front() {
			let linked = self.link_module(compiler, &path, entry, &rewritten)?;
			for dependency in &linked.dependencies {
				if seen.insert(dependency.clone()) {
					queue.push_back(dependency.clone());
				}
			}
			modules.push(linked);
		}

		let bundle = self.assemble(entry, modules);
		tracing::info!(
			entry = %entry,
			modules = bundle.modules.len(),
			bytes = bundle.size(),
			"bundle built"
		);
		Ok(bundle)
	}

	fn link_module(
		&self,
		compiler: &Compiler,
		path: &str,
		entry: &str,
		store: &VirtualFileStore,
	) -> BuildResult<LinkedModule> {
		let module = self
			.resolver
			.load(path, store)
			.ok_or_else(|| BuildError::module_not_found(path, None))?;

		if path.ends_with(".json") {
			return linker::link_json(path, &module.contents);
		}

		let compiled = compiler.compile(path, &module.contents, module.dialect, &self.pragma)?;
		let importer_dir = parent_dir(path);
		linker::link(path, &compiled, path == entry, |specifier| {
			let resolution = self
				.resolver
				.resolve(specifier, importer_dir, store)
				.map_err(|e| match e {
					BuildError::ModuleNotFound { specifier, .. } => {
						BuildError::module_not_found(specifier, Some(path))
					}
					other => other,
				})?;
			Ok(match resolution.namespace {
				Namespace::Virtual => ModuleTarget::Virtual(resolution.path),
				Namespace::External => ModuleTarget::external(&resolution.path),
			})
		})
	}

	fn assemble(&self, entry: &str, modules: Vec<LinkedModule>) -> Bundle {
		let mut body = String::new();
		body.push_str(&format!(
			"var process = {{ env: {{ NODE_ENV: {} }} }};\n",
			js_string(&self.settings.node_env)
		));
		body.push_str(MODULE_RUNTIME);
		body.push('\n');
		let mut paths = Vec::with_capacity(modules.len());
		for module in modules {
			body.push_str(&module.code);
			paths.push(module.path);
		}
		body.push_str(&format!(
			"var __balbal_entry = __balbal_require({});\n",
			js_string(entry)
		));

		let global = js_string(&self.settings.global_name);
		let mut code = format!(
			"(function (__balbal_global) {{\n{}__balbal_global[{}] = __balbal_entry;\n}})(typeof globalThis !== \"undefined\" ? globalThis : this);\n",
			body, global
		);
		if self.settings.format == OutputFormat::Esm {
			code.push_str(&format!(
				"{}globalThis[{}][\"default\"];\n",
				ESM_EXPORT_PREFIX, global
			));
		}

		Bundle {
			code,
			format: self.settings.format,
			entry: entry.to_string(),
			modules: paths,
			global_name: self.settings.global_name.clone(),
		}
	}
}

fn is_script(path: &str) -> bool {
	!path.ends_with(".json")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn store(files: &[(&str, &str)]) -> VirtualFileStore {
		files.iter().copied().collect()
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_entry_fails_fast() {
		// Arrange
		let engine = BundleEngine::default();
		let files = store(&[("src/Other.tsx", "export default 1;")]);

		// Act
		let err = engine.build("src/App.tsx", &files).await.unwrap_err();

		// Assert
		assert_eq!(err, BuildError::module_not_found("src/App.tsx", None));
	}

	#[rstest]
	#[tokio::test]
	async fn test_graph_is_walked_from_the_entry() {
		let engine = BundleEngine::default();
		let files = store(&[
			(
				"src/App.tsx",
				"import { Header } from './components/Header';\nexport default function App() { return <Header />; }",
			),
			(
				"src/components/Header.tsx",
				"import { title } from '../theme';\nexport const Header = () => <h1>{title}</h1>;",
			),
			("src/theme.ts", "export const title: string = 'BalBal';"),
			("src/Unused.tsx", "export const unused = 1;"),
		]);

		let bundle = engine.build("src/App.tsx", &files).await.unwrap();

		assert_eq!(
			bundle.modules,
			vec!["src/App.tsx", "src/components/Header.tsx", "src/theme.ts"]
		);
		assert_eq!(bundle.entry, "src/App.tsx");
		assert_eq!(bundle.format, OutputFormat::Iife);
		assert!(bundle.code.contains("__balbal_global[\"AppBundle\"] = __balbal_entry;"));
		assert!(bundle.code.contains("NODE_ENV: \"development\""));
		assert!(!bundle.code.contains("src/Unused.tsx"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_framework_packages_stay_external() {
		let engine = BundleEngine::default();
		let files = store(&[(
			"src/App.tsx",
			"import React from 'react';\nimport { View } from 'react-native';\nexport default () => <View />;",
		)]);

		let bundle = engine.build("src/App.tsx", &files).await.unwrap();

		assert!(bundle.code.contains("__balbal_external(\"react\", \"React\")"));
		assert!(bundle
			.code
			.contains("__balbal_external(\"react-native-web\", \"ReactNativeWeb\")"));
		assert_eq!(bundle.modules, vec!["src/App.tsx"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unresolved_import_names_the_importer() {
		let engine = BundleEngine::default();
		let files = store(&[("src/App.tsx", "import Footer from './Footer';\nexport default Footer;")]);

		let err = engine.build("src/App.tsx", &files).await.unwrap_err();

		assert_eq!(
			err,
			BuildError::module_not_found("./Footer", Some("src/App.tsx"))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_syntax_error_fails_the_whole_build() {
		let engine = BundleEngine::default();
		let files = store(&[
			("src/App.tsx", "import './Broken';\nexport default 1;"),
			("src/Broken.tsx", "const = ;"),
		]);

		let err = engine.build("src/App.tsx", &files).await.unwrap_err();

		assert!(matches!(err, BuildError::Compile { ref path, .. } if path == "src/Broken.tsx"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_esm_output() {
		let engine = BundleEngine::new(BundlerSettings {
			format: OutputFormat::Esm,
			..Default::default()
		});
		let files = store(&[("src/App.tsx", "export default function App() { return null; }")]);

		let bundle = engine.build("src/App.tsx", &files).await.unwrap();

		assert_eq!(bundle.format, OutputFormat::Esm);
		assert!(bundle.code.ends_with("export default globalThis[\"AppBundle\"][\"default\"];\n"));
		assert!(!bundle.classic_script().contains("export default"));
	}
}
