//! Execution scope
//!
//! The fixed set of named bindings a generated app may assume exist when
//! its bundle runs: the UI runtime and its DOM binding, hooks, web
//! primitives, navigation shim factories and the `render` mount function.
//! The record is versioned; bindings are only ever added under a new version.
//!
//! Both preview strategies install the same scope: the browser document
//! inlines [`ExecutionScope::prelude`] after the pinned runtime scripts, the
//! headless surface evaluates it after Preact and preact/compat.

use balbal_conf::{BundlerSettings, PreviewSettings};
use balbal_core::RUNTIME_GLOBALS;
use serde::Serialize;

/// Web primitive and navigation shims, written against the global `React`
pub const NATIVE_SHIMS: &str = include_str!("js/native_shims.js");

pub const SCOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
	/// A runtime object installed by a script (`React`, `ReactNativeWeb`, ...)
	Runtime,
	/// A React hook aliased to the global scope
	Hook,
	/// A web primitive aliased from `ReactNativeWeb`
	Primitive,
	/// A navigation factory or hook aliased from the navigation shim
	NavigationShim,
	/// The mount function
	Mount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeBinding {
	pub name: &'static str,
	pub kind: BindingKind,
	/// Expression the binding aliases; `None` when a script defines it
	pub source: Option<&'static str>,
}

const fn runtime(name: &'static str) -> ScopeBinding {
	ScopeBinding {
		name,
		kind: BindingKind::Runtime,
		source: None,
	}
}

const fn alias(name: &'static str, kind: BindingKind, source: &'static str) -> ScopeBinding {
	ScopeBinding {
		name,
		kind,
		source: Some(source),
	}
}

const HOOKS: &[ScopeBinding] = &[
	alias("useState", BindingKind::Hook, "React.useState"),
	alias("useEffect", BindingKind::Hook, "React.useEffect"),
	alias("useLayoutEffect", BindingKind::Hook, "React.useLayoutEffect"),
	alias("useRef", BindingKind::Hook, "React.useRef"),
	alias("useCallback", BindingKind::Hook, "React.useCallback"),
	alias("useMemo", BindingKind::Hook, "React.useMemo"),
	alias("useContext", BindingKind::Hook, "React.useContext"),
	alias("useReducer", BindingKind::Hook, "React.useReducer"),
];

const PRIMITIVES: &[ScopeBinding] = &[
	alias("StyleSheet", BindingKind::Primitive, "ReactNativeWeb.StyleSheet"),
	alias("View", BindingKind::Primitive, "ReactNativeWeb.View"),
	alias("Text", BindingKind::Primitive, "ReactNativeWeb.Text"),
	alias("Image", BindingKind::Primitive, "ReactNativeWeb.Image"),
	alias("ScrollView", BindingKind::Primitive, "ReactNativeWeb.ScrollView"),
	alias("TextInput", BindingKind::Primitive, "ReactNativeWeb.TextInput"),
	alias("Pressable", BindingKind::Primitive, "ReactNativeWeb.Pressable"),
	alias("TouchableOpacity", BindingKind::Primitive, "ReactNativeWeb.TouchableOpacity"),
	alias("Button", BindingKind::Primitive, "ReactNativeWeb.Button"),
	alias("FlatList", BindingKind::Primitive, "ReactNativeWeb.FlatList"),
	alias("SafeAreaView", BindingKind::Primitive, "ReactNativeWeb.SafeAreaView"),
	alias("ActivityIndicator", BindingKind::Primitive, "ReactNativeWeb.ActivityIndicator"),
	alias("Platform", BindingKind::Primitive, "ReactNativeWeb.Platform"),
	alias("Dimensions", BindingKind::Primitive, "ReactNativeWeb.Dimensions"),
	alias("Alert", BindingKind::Primitive, "ReactNativeWeb.Alert"),
];

const NAVIGATION: &[ScopeBinding] = &[
	alias("NavigationContainer", BindingKind::NavigationShim, "BalbalNavigation.NavigationContainer"),
	alias(
		"createNativeStackNavigator",
		BindingKind::NavigationShim,
		"BalbalNavigation.createNativeStackNavigator",
	),
	alias(
		"createStackNavigator",
		BindingKind::NavigationShim,
		"BalbalNavigation.createStackNavigator",
	),
	alias(
		"createBottomTabNavigator",
		BindingKind::NavigationShim,
		"BalbalNavigation.createBottomTabNavigator",
	),
	alias("useNavigation", BindingKind::NavigationShim, "BalbalNavigation.useNavigation"),
	alias("useRoute", BindingKind::NavigationShim, "BalbalNavigation.useRoute"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionScope {
	version: u32,
	bindings: Vec<ScopeBinding>,
	global_name: String,
	mount_element_id: String,
}

impl Default for ExecutionScope {
	fn default() -> Self {
		Self::from_settings(&BundlerSettings::default(), &PreviewSettings::default())
	}
}

impl ExecutionScope {
	/// The version 1 scope for bundles exposing their entry as `global_name`
	pub fn new(global_name: impl Into<String>, mount_element_id: impl Into<String>) -> Self {
		let mut bindings: Vec<ScopeBinding> = Vec::new();
		for global in RUNTIME_GLOBALS {
			if !bindings.iter().any(|b| b.name == global.binding) {
				bindings.push(runtime(global.binding));
			}
		}
		bindings.extend_from_slice(HOOKS);
		bindings.extend_from_slice(PRIMITIVES);
		bindings.extend_from_slice(NAVIGATION);
		bindings.push(ScopeBinding {
			name: "render",
			kind: BindingKind::Mount,
			source: None,
		});

		Self {
			version: SCOPE_VERSION,
			bindings,
			global_name: global_name.into(),
			mount_element_id: mount_element_id.into(),
		}
	}

	pub fn from_settings(bundler: &BundlerSettings, preview: &PreviewSettings) -> Self {
		Self::new(bundler.global_name.clone(), preview.mount_element_id.clone())
	}

	pub fn version(&self) -> u32 {
		self.version
	}

	pub fn bindings(&self) -> &[ScopeBinding] {
		&self.bindings
	}

	pub fn binding(&self, name: &str) -> Option<&ScopeBinding> {
		self.bindings.iter().find(|b| b.name == name)
	}

	pub fn provides(&self, name: &str) -> bool {
		self.binding(name).is_some()
	}

	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.bindings.iter().map(|b| b.name)
	}

	pub fn global_name(&self) -> &str {
		&self.global_name
	}

	pub fn mount_element_id(&self) -> &str {
		&self.mount_element_id
	}

	/// Script installing the scope. Expects `React` and `ReactDOM` to be
	/// defined already.
	pub fn prelude(&self) -> String {
		let mut out = String::with_capacity(NATIVE_SHIMS.len() + 2048);
		out.push_str(NATIVE_SHIMS);
		out.push('\n');
		for binding in &self.bindings {
			if let Some(source) = binding.source {
				out.push_str(&format!("var {} = {};\n", binding.name, source));
			}
		}
		out.push_str(&format!(
			r#"function render(element, elementId) {{
	var id = elementId || {mount};
	var container = document.getElementById(id);
	if (!container) {{
		throw new Error("Mount element #" + id + " not found");
	}}
	ReactDOM.createRoot(container).render(element);
	return container;
}}
"#,
			mount = js_string(&self.mount_element_id),
		));
		out
	}

	/// Script mounting the bundle's root component. The bundle must have
	/// run already.
	pub fn mount_script(&self) -> String {
		format!(
			r#"(function () {{
	var bundle = globalThis[{global}];
	var App = bundle && (bundle["default"] || bundle.App);
	if (!App) {{
		throw new ReferenceError("App is not defined");
	}}
	render(React.createElement(React.StrictMode, null, React.createElement(App)), {mount});
}})();
"#,
			global = js_string(&self.global_name),
			mount = js_string(&self.mount_element_id),
		)
	}

	/// Expression evaluating to a JSON array of the bindings that are not
	/// defined in the current global scope
	pub fn missing_bindings_query(&self) -> String {
		let names: Vec<&str> = self.names().collect();
		format!(
			"JSON.stringify({}.filter(function (name) {{ return typeof globalThis[name] === \"undefined\"; }}))",
			serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
		)
	}
}

/// Quote `value` as a JavaScript string literal
pub(crate) fn js_string(value: &str) -> String {
	serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
