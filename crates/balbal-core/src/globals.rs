//! Packages the preview runtime supplies as globals
//!
//! Framework packages are never bundled. Imports and `require` calls naming
//! these specifiers are bound to the listed global instead; every binding
//! here must exist in the preview execution scope.

/// Browser counterpart of the native UI primitives package
pub const WEB_PRIMITIVES: &str = "react-native-web";

/// Specifier the navigation libraries are redirected to
pub const NAVIGATION_SHIM: &str = "@balbal/navigation";

/// A package specifier and the global that satisfies it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeGlobal {
	pub specifier: &'static str,
	pub binding: &'static str,
}

pub const RUNTIME_GLOBALS: &[RuntimeGlobal] = &[
	RuntimeGlobal {
		specifier: "react",
		binding: "React",
	},
	RuntimeGlobal {
		specifier: "react-dom",
		binding: "ReactDOM",
	},
	RuntimeGlobal {
		specifier: "react-dom/client",
		binding: "ReactDOM",
	},
	RuntimeGlobal {
		specifier: WEB_PRIMITIVES,
		binding: "ReactNativeWeb",
	},
	RuntimeGlobal {
		specifier: NAVIGATION_SHIM,
		binding: "BalbalNavigation",
	},
	RuntimeGlobal {
		specifier: "@react-native-community/hooks",
		binding: "ReactNativeHooks",
	},
];

/// Global binding supplying `specifier`, if any
pub fn global_for(specifier: &str) -> Option<&'static str> {
	RUNTIME_GLOBALS
		.iter()
		.find(|g| g.specifier == specifier)
		.map(|g| g.binding)
}
