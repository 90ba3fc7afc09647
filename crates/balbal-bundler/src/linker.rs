//! Module linking
//!
//! Turns one compiled ES module into a factory registered with the bundle's
//! module registry. Import declarations become `__balbal_require` calls for
//! virtual modules and `__balbal_external` lookups for packages the preview
//! runtime supplies as globals. Exports become getters on the module's
//! `exports` object so later assignments stay visible to importers.

use balbal_core::global_for;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier, Statement};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use crate::edit::{TextEdits, js_string};
use crate::error::{BuildError, BuildResult};

/// Registry runtime shared by every bundle
pub(crate) const MODULE_RUNTIME: &str = include_str!("js/module_runtime.js");

const DEFAULT_EXPORT_LOCAL: &str = "__balbal_default_export";

/// Where an import specifier points after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleTarget {
	/// A module in the bundle, by store path
	Virtual(String),
	/// A package the runtime supplies, with its global if one is known
	External {
		specifier: String,
		binding: Option<&'static str>,
	},
}

impl ModuleTarget {
	pub fn external(specifier: &str) -> Self {
		Self::External {
			specifier: specifier.to_string(),
			binding: global_for(specifier),
		}
	}

	fn expression(&self) -> String {
		match self {
			Self::Virtual(path) => format!("__balbal_require({})", js_string(path)),
			Self::External { specifier, binding } => format!(
				"__balbal_external({}, {})",
				js_string(specifier),
				binding.map(js_string).unwrap_or_else(|| "null".to_string())
			),
		}
	}
}

/// A module ready to be concatenated into a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedModule {
	pub path: String,
	pub code: String,
	/// Virtual modules this one imports, in source order
	pub dependencies: Vec<String>,
}

/// Link compiled module `code` stored at `path`.
///
/// `resolve` maps each import specifier to its target. With `expose_app`, a
/// module without a default export but with a top-level `App` declaration
/// exports `App` as its default.
pub fn link<F>(path: &str, code: &str, expose_app: bool, mut resolve: F) -> BuildResult<LinkedModule>
where
	F: FnMut(&str) -> BuildResult<ModuleTarget>,
{
	let allocator = Allocator::default();
	let parsed = Parser::new(&allocator, code, SourceType::mjs()).parse();
	if !parsed.errors.is_empty() {
		return Err(BuildError::compile(path, parsed.errors));
	}

	let mut state = LinkState::default();
	for stmt in &parsed.program.body {
		match stmt {
			Statement::ImportDeclaration(decl) => {
				if decl.import_kind.is_type() {
					state.edits.replace(decl.span, "");
					continue;
				}
				let target = state.target(&mut resolve, decl.source.value.as_str())?;
				let specifiers = decl.specifiers.as_ref().filter(|s| !s.is_empty());
				let replacement = match specifiers {
					None => format!("{};", target.expression()),
					Some(specifiers) => {
						let module = state.temp();
						let mut out = format!("var {} = {};", module, target.expression());
						for specifier in specifiers {
							match specifier {
								ImportDeclarationSpecifier::ImportSpecifier(s) => {
									if s.import_kind.is_type() {
										continue;
									}
									out.push_str(&format!(
										" var {} = {}[{}];",
										s.local.name,
										module,
										js_string(&s.imported.name())
									));
								}
								ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
									out.push_str(&format!(
										" var {} = __balbal_default({});",
										s.local.name, module
									));
								}
								ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
									out.push_str(&format!(" var {} = {};", s.local.name, module));
								}
							}
						}
						out
					}
				};
				state.edits.replace(decl.span, replacement);
			}
			Statement::ExportNamedDeclaration(decl) => {
				if decl.export_kind.is_type() {
					state.edits.replace(decl.span, "");
					continue;
				}
				if let Some(declaration) = &decl.declaration {
					state.edits.replace_range(
						decl.span.start as usize,
						declaration.span().start as usize,
						"",
					);
					for name in declared_names(declaration) {
						state.declare(&name);
						state.export(name.clone(), name);
					}
				} else if let Some(source) = &decl.source {
					let target = state.target(&mut resolve, source.value.as_str())?;
					let module = state.temp();
					state
						.edits
						.replace(decl.span, format!("var {} = {};", module, target.expression()));
					for specifier in &decl.specifiers {
						if specifier.export_kind.is_type() {
							continue;
						}
						state.export(
							specifier.exported.name().to_string(),
							format!("{}[{}]", module, js_string(&specifier.local.name())),
						);
					}
				} else {
					state.edits.replace(decl.span, "");
					for specifier in &decl.specifiers {
						if specifier.export_kind.is_type() {
							continue;
						}
						state.export(
							specifier.exported.name().to_string(),
							specifier.local.name().to_string(),
						);
					}
				}
			}
			Statement::ExportDefaultDeclaration(decl) => {
				let named = match &decl.declaration {
					ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
						f.id.as_ref().map(|id| id.name.to_string())
					}
					ExportDefaultDeclarationKind::ClassDeclaration(c) => {
						c.id.as_ref().map(|id| id.name.to_string())
					}
					_ => None,
				};
				let declaration_span = decl.declaration.span();
				match named {
					Some(name) => {
						state.edits.replace_range(
							decl.span.start as usize,
							declaration_span.start as usize,
							"",
						);
						state.declare(&name);
						state.export("default".to_string(), name);
					}
					None => {
						let text = &code
							[declaration_span.start as usize..declaration_span.end as usize];
						state.edits.replace(
							decl.span,
							format!("var {} = {};", DEFAULT_EXPORT_LOCAL, text),
						);
						state.export("default".to_string(), DEFAULT_EXPORT_LOCAL.to_string());
					}
				}
			}
			Statement::ExportAllDeclaration(decl) => {
				if decl.export_kind.is_type() {
					state.edits.replace(decl.span, "");
					continue;
				}
				let target = state.target(&mut resolve, decl.source.value.as_str())?;
				match &decl.exported {
					Some(exported) => {
						let module = state.temp();
						state
							.edits
							.replace(decl.span, format!("var {} = {};", module, target.expression()));
						state.export(exported.name().to_string(), module);
					}
					None => state.edits.replace(
						decl.span,
						format!("__balbal_reexport(exports, {});", target.expression()),
					),
				}
			}
			Statement::FunctionDeclaration(f) => {
				if let Some(id) = &f.id {
					state.declare(id.name.as_str());
				}
			}
			Statement::ClassDeclaration(c) => {
				if let Some(id) = &c.id {
					state.declare(id.name.as_str());
				}
			}
			Statement::VariableDeclaration(v) => {
				for declarator in &v.declarations {
					for id in declarator.id.get_binding_identifiers() {
						state.declare(id.name.as_str());
					}
				}
			}
			_ => {}
		}
	}

	if expose_app && state.declares_app && !state.exports.iter().any(|(name, _)| name == "default") {
		state.export("default".to_string(), "App".to_string());
	}

	let mut header = String::new();
	for (name, local) in &state.exports {
		header.push_str(&format!(
			"__balbal_export(exports, {}, function () {{ return {}; }});\n",
			js_string(name),
			local
		));
	}
	let body = state.edits.apply(code);

	Ok(LinkedModule {
		path: path.to_string(),
		code: wrap(path, &format!("{}{}", header, body)),
		dependencies: state.dependencies,
	})
}

/// Link a JSON file as a module whose exports are the parsed value
pub fn link_json(path: &str, content: &str) -> BuildResult<LinkedModule> {
	let value: serde_json::Value =
		serde_json::from_str(content).map_err(|e| BuildError::compile(path, [e]))?;
	Ok(LinkedModule {
		path: path.to_string(),
		code: wrap(path, &format!("module.exports = {};\n", value)),
		dependencies: Vec::new(),
	})
}

fn wrap(path: &str, body: &str) -> String {
	format!(
		"/* {} */\n__balbal_define({}, function (exports, module) {{\n{}\n}});\n",
		path,
		js_string(path),
		body
	)
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
	match declaration {
		Declaration::VariableDeclaration(v) => v
			.declarations
			.iter()
			.flat_map(|d| d.id.get_binding_identifiers())
			.map(|id| id.name.to_string())
			.collect(),
		Declaration::FunctionDeclaration(f) => f.id.iter().map(|id| id.name.to_string()).collect(),
		Declaration::ClassDeclaration(c) => c.id.iter().map(|id| id.name.to_string()).collect(),
		_ => Vec::new(),
	}
}

#[derive(Default)]
struct LinkState {
	edits: TextEdits,
	/// `(exported name, local expression)`
	exports: Vec<(String, String)>,
	dependencies: Vec<String>,
	temps: usize,
	declares_app: bool,
}

impl LinkState {
	fn target<F>(&mut self, resolve: &mut F, specifier: &str) -> BuildResult<ModuleTarget>
	where
		F: FnMut(&str) -> BuildResult<ModuleTarget>,
	{
		let target = resolve(specifier)?;
		if let ModuleTarget::Virtual(path) = &target
			&& !self.dependencies.contains(path)
		{
			self.dependencies.push(path.clone());
		}
		Ok(target)
	}

	fn temp(&mut self) -> String {
		let name = format!("__balbal_m{}", self.temps);
		self.temps += 1;
		name
	}

	fn export(&mut self, name: String, local: String) {
		self.exports.push((name, local));
	}

	fn declare(&mut self, name: &str) {
		if name == "App" {
			self.declares_app = true;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn resolve(specifier: &str) -> BuildResult<ModuleTarget> {
		if let Some(rest) = specifier.strip_prefix("./") {
			Ok(ModuleTarget::Virtual(format!("src/{}.tsx", rest)))
		} else {
			Ok(ModuleTarget::external(specifier))
		}
	}

	#[rstest]
	fn test_imports_become_registry_lookups() {
		// Arrange
		let code = "import React, { useState } from \"react\";\nimport { Header } from \"./Header\";\nimport \"./setup\";\n";

		// Act
		let linked = link("src/App.tsx", code, false, resolve).unwrap();

		// Assert
		assert!(linked.code.contains(
			"var __balbal_m0 = __balbal_external(\"react\", \"React\"); var React = __balbal_default(__balbal_m0); var useState = __balbal_m0[\"useState\"];"
		));
		assert!(linked.code.contains(
			"var __balbal_m1 = __balbal_require(\"src/Header.tsx\"); var Header = __balbal_m1[\"Header\"];"
		));
		assert!(linked.code.contains("__balbal_require(\"src/setup.tsx\");"));
		assert_eq!(linked.dependencies, vec!["src/Header.tsx", "src/setup.tsx"]);
	}

	#[rstest]
	fn test_unknown_package_resolves_to_null_binding() {
		let linked = link("src/App.tsx", "import dayjs from \"dayjs\";\n", false, resolve).unwrap();

		assert!(linked.code.contains("__balbal_external(\"dayjs\", null)"));
	}

	#[rstest]
	fn test_exports_become_getters() {
		let code = "export const a = 1, b = 2;\nfunction c() {}\nexport { c as renamed };\nexport default function Screen() {}\n";

		let linked = link("src/a.tsx", code, false, resolve).unwrap();

		for (name, local) in [("a", "a"), ("b", "b"), ("renamed", "c"), ("default", "Screen")] {
			assert!(
				linked.code.contains(&format!(
					"__balbal_export(exports, \"{}\", function () {{ return {}; }});",
					name, local
				)),
				"missing getter for {name}"
			);
		}
		assert!(linked.code.contains("const a = 1, b = 2;"));
		assert!(linked.code.contains("function Screen() {}"));
		assert!(!linked.code.contains("export "));
	}

	#[rstest]
	fn test_anonymous_default_export_is_bound_to_a_local() {
		let linked = link("src/a.tsx", "export default () => 42;\n", false, resolve).unwrap();

		assert!(linked.code.contains("var __balbal_default_export = () => 42;"));
		assert!(linked.code.contains("return __balbal_default_export;"));
	}

	#[rstest]
	fn test_reexports() {
		let code = "export * from \"./theme\";\nexport { Button as PrimaryButton } from \"./Button\";\n";

		let linked = link("src/index.tsx", code, false, resolve).unwrap();

		assert!(linked.code.contains("__balbal_reexport(exports, __balbal_require(\"src/theme.tsx\"));"));
		assert!(linked.code.contains("return __balbal_m0[\"Button\"];"));
		assert_eq!(linked.dependencies, vec!["src/theme.tsx", "src/Button.tsx"]);
	}

	#[rstest]
	#[case(true, true)]
	#[case(false, false)]
	fn test_top_level_app_is_exposed_as_default_for_the_entry(
		#[case] expose_app: bool,
		#[case] expected: bool,
	) {
		let code = "const App = () => null;\n";

		let linked = link("src/App.tsx", code, expose_app, resolve).unwrap();

		assert_eq!(
			linked.code.contains("__balbal_export(exports, \"default\", function () { return App; });"),
			expected
		);
	}

	#[rstest]
	fn test_resolution_failure_aborts_linking() {
		let err = link("src/App.tsx", "import \"./Missing\";\n", false, |s| {
			Err(BuildError::module_not_found(s, Some("src/App.tsx")))
		})
		.unwrap_err();

		assert!(matches!(err, BuildError::ModuleNotFound { .. }));
	}

	#[rstest]
	fn test_json_module() {
		let linked = link_json("src/data.json", "{\"name\": \"BalBal\"}").unwrap();

		assert!(linked.code.contains("module.exports = {\"name\":\"BalBal\"};"));
	}

	#[rstest]
	fn test_invalid_json_is_a_compile_error() {
		let err = link_json("src/data.json", "{ name: }").unwrap_err();

		assert!(matches!(err, BuildError::Compile { ref path, .. } if path == "src/data.json"));
	}
}
