//! Import rewriting
//!
//! Adapts mobile-framework sources to the browser before compilation. The
//! substitution table is an ordered list of [`RewriteRule`]s; the first rule
//! whose pattern matches a specifier decides its [`RewritePolicy`], and each
//! specifier is rewritten at most once per pass.
//!
//! Rewriting works on the syntax tree: import and re-export sources are
//! retargeted, imports of stripped packages are neutralized, and
//! `require("pkg")` calls are bound to the global that the preview runtime
//! supplies for `pkg`. Anything the parser rejects is returned unchanged so
//! the compiler can report it.

use balbal_core::{NAVIGATION_SHIM, SourceDialect, WEB_PRIMITIVES, global_for};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
	Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
	ImportDeclaration, ImportDeclarationSpecifier,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::edit::{TextEdits, js_string};

/// Which specifiers a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierPattern {
	Exact(String),
	/// Any specifier starting with the prefix
	Prefix(String),
}

impl SpecifierPattern {
	pub fn matches(&self, specifier: &str) -> bool {
		match self {
			Self::Exact(exact) => specifier == exact,
			Self::Prefix(prefix) => specifier.starts_with(prefix.as_str()),
		}
	}
}

/// What happens to a matching specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewritePolicy {
	/// Import from this specifier instead
	Redirect(String),
	/// Drop the import; any bindings it introduced become no-op functions
	Strip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
	pub pattern: SpecifierPattern,
	pub policy: RewritePolicy,
}

impl RewriteRule {
	pub fn redirect(specifier: &str, target: &str) -> Self {
		Self {
			pattern: SpecifierPattern::Exact(specifier.to_string()),
			policy: RewritePolicy::Redirect(target.to_string()),
		}
	}

	pub fn redirect_prefix(prefix: &str, target: &str) -> Self {
		Self {
			pattern: SpecifierPattern::Prefix(prefix.to_string()),
			policy: RewritePolicy::Redirect(target.to_string()),
		}
	}

	pub fn strip(specifier: &str) -> Self {
		Self {
			pattern: SpecifierPattern::Exact(specifier.to_string()),
			policy: RewritePolicy::Strip,
		}
	}
}

/// Rules applied by [`ImportRewriter::default`], in order
pub fn default_rules() -> Vec<RewriteRule> {
	vec![
		RewriteRule::redirect("react-native", WEB_PRIMITIVES),
		RewriteRule::redirect("react-native-safe-area-context", WEB_PRIMITIVES),
		RewriteRule::redirect("react-native-gesture-handler", WEB_PRIMITIVES),
		RewriteRule::redirect("expo-status-bar", WEB_PRIMITIVES),
		RewriteRule::redirect("@react-navigation/native", NAVIGATION_SHIM),
		RewriteRule::redirect("@react-navigation/native-stack", NAVIGATION_SHIM),
		RewriteRule::redirect("@react-navigation/stack", NAVIGATION_SHIM),
		RewriteRule::redirect("@react-navigation/bottom-tabs", NAVIGATION_SHIM),
		RewriteRule::redirect_prefix("@react-navigation/", NAVIGATION_SHIM),
		RewriteRule::strip("react-native-screens"),
		RewriteRule::strip("react-native-reanimated"),
	]
}

/// Ordered specifier substitution over JavaScript/TypeScript sources
#[derive(Debug, Clone)]
pub struct ImportRewriter {
	rules: Vec<RewriteRule>,
}

impl Default for ImportRewriter {
	fn default() -> Self {
		Self::new(default_rules())
	}
}

impl ImportRewriter {
	pub fn new(rules: Vec<RewriteRule>) -> Self {
		Self { rules }
	}

	/// Append a rule after the existing ones
	pub fn with_rule(mut self, rule: RewriteRule) -> Self {
		self.rules.push(rule);
		self
	}

	pub fn rules(&self) -> &[RewriteRule] {
		&self.rules
	}

	/// Policy of the first rule matching `specifier`
	pub fn policy_for(&self, specifier: &str) -> Option<&RewritePolicy> {
		self.rules
			.iter()
			.find(|rule| rule.pattern.matches(specifier))
			.map(|rule| &rule.policy)
	}

	/// Rewrite a TypeScript+JSX source
	pub fn rewrite(&self, content: &str) -> String {
		self.rewrite_as(content, SourceDialect::TypeScriptJsx)
	}

	/// Rewrite `content` parsed as `dialect`
	pub fn rewrite_as(&self, content: &str, dialect: SourceDialect) -> String {
		let allocator = Allocator::default();
		let source_type = match dialect {
			SourceDialect::TypeScriptJsx => SourceType::tsx(),
			SourceDialect::JavaScriptJsx => SourceType::jsx(),
		};
		let parsed = Parser::new(&allocator, content, source_type).parse();
		if parsed.panicked || !parsed.errors.is_empty() {
			tracing::debug!(
				errors = parsed.errors.len(),
				"source does not parse, leaving imports untouched"
			);
			return content.to_string();
		}

		let mut collector = SpecifierCollector::default();
		collector.visit_program(&parsed.program);

		let mut edits = TextEdits::new();
		for site in collector.sites {
			self.plan_edit(site, &mut edits);
		}
		if edits.is_empty() {
			return content.to_string();
		}
		edits.apply(content)
	}

	fn plan_edit(&self, site: SpecifierSite, edits: &mut TextEdits) {
		match site {
			SpecifierSite::Import {
				span,
				source,
				specifier,
				locals,
			} => match self.policy_for(&specifier) {
				Some(RewritePolicy::Redirect(target)) => edits.replace(source, js_string(target)),
				Some(RewritePolicy::Strip) => edits.replace(span, neutralize(&locals)),
				None => {}
			},
			SpecifierSite::Reexport {
				span,
				source,
				specifier,
			} => match self.policy_for(&specifier) {
				Some(RewritePolicy::Redirect(target)) => edits.replace(source, js_string(target)),
				Some(RewritePolicy::Strip) => edits.replace(span, ""),
				None => {}
			},
			SpecifierSite::Require { span, specifier } => {
				let target = match self.policy_for(&specifier) {
					Some(RewritePolicy::Redirect(target)) => target.as_str(),
					Some(RewritePolicy::Strip) => {
						edits.replace(span, "({})");
						return;
					}
					None => specifier.as_str(),
				};
				if let Some(binding) = global_for(target) {
					edits.replace(span, binding);
				}
			}
		}
	}
}

fn neutralize(locals: &[String]) -> String {
	locals
		.iter()
		.map(|local| format!("const {} = function () {{ return null; }};", local))
		.collect::<Vec<_>>()
		.join(" ")
}

enum SpecifierSite {
	Import {
		span: Span,
		source: Span,
		specifier: String,
		locals: Vec<String>,
	},
	Reexport {
		span: Span,
		source: Span,
		specifier: String,
	},
	Require {
		span: Span,
		specifier: String,
	},
}

#[derive(Default)]
struct SpecifierCollector {
	sites: Vec<SpecifierSite>,
}

impl<'a> Visit<'a> for SpecifierCollector {
	fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
		let locals = if it.import_kind.is_type() {
			Vec::new()
		} else {
			it.specifiers
				.iter()
				.flatten()
				.map(|specifier| {
					let local = match specifier {
						ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
						ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
						ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
					};
					local.name.to_string()
				})
				.collect()
		};
		self.sites.push(SpecifierSite::Import {
			span: it.span,
			source: it.source.span,
			specifier: it.source.value.to_string(),
			locals,
		});
	}

	fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
		if let Some(source) = &it.source {
			self.sites.push(SpecifierSite::Reexport {
				span: it.span,
				source: source.span,
				specifier: source.value.to_string(),
			});
		}
		walk::walk_export_named_declaration(self, it);
	}

	fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
		self.sites.push(SpecifierSite::Reexport {
			span: it.span,
			source: it.source.span,
			specifier: it.source.value.to_string(),
		});
	}

	fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
		if let Expression::Identifier(callee) = &it.callee
			&& callee.name.as_str() == "require"
			&& it.arguments.len() == 1
			&& let Argument::StringLiteral(literal) = &it.arguments[0]
		{
			self.sites.push(SpecifierSite::Require {
				span: it.span,
				specifier: literal.value.to_string(),
			});
			return;
		}
		walk::walk_call_expression(self, it);
	}
}
