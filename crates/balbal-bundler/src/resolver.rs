//! Virtual module resolution
//!
//! The two hooks the bundle engine needs: [`ModuleResolver::resolve`]
//! classifies a specifier as virtual or external, and [`ModuleResolver::load`]
//! reads a resolved virtual path back out of the store.

use balbal_conf::BundlerSettings;
use balbal_core::{SUPPORTED_EXTENSIONS, SourceDialect, VirtualFileStore};

use crate::error::{BuildError, BuildResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
	/// Backed by a file in the store
	Virtual,
	/// Supplied by the preview runtime, never bundled
	External,
}

/// Outcome of resolving one specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResolution {
	/// Store path for virtual modules, the specifier itself for externals
	pub path: String,
	pub namespace: Namespace,
}

/// Content of a virtual module plus the dialect to parse it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
	pub path: String,
	pub contents: String,
	pub dialect: SourceDialect,
}

#[derive(Debug, Clone)]
pub struct ModuleResolver {
	source_root: String,
}

impl Default for ModuleResolver {
	fn default() -> Self {
		Self::new("src/")
	}
}

impl ModuleResolver {
	/// `source_root` marks project-root relative specifiers, e.g. `src/`
	pub fn new(source_root: impl Into<String>) -> Self {
		let mut source_root = source_root.into();
		if !source_root.is_empty() && !source_root.ends_with('/') {
			source_root.push('/');
		}
		Self { source_root }
	}

	pub fn from_settings(settings: &BundlerSettings) -> Self {
		Self::new(settings.source_root.clone())
	}

	/// Whether `specifier` names a file in the project rather than a package
	pub fn is_virtual(&self, specifier: &str) -> bool {
		is_relative(specifier)
			|| specifier.starts_with('/')
			|| (!self.source_root.is_empty() && specifier.starts_with(self.source_root.as_str()))
	}

	/// Resolve `specifier` imported from a file in `importer_dir`.
	///
	/// Virtual specifiers try the exact path, then each supported extension,
	/// then an `index` file with each extension. External specifiers are
	/// returned untouched whatever the store contains.
	pub fn resolve(
		&self,
		specifier: &str,
		importer_dir: &str,
		store: &VirtualFileStore,
	) -> BuildResult<ModuleResolution> {
		if !self.is_virtual(specifier) {
			return Ok(ModuleResolution {
				path: specifier.to_string(),
				namespace: Namespace::External,
			});
		}

		let base = if is_relative(specifier) {
			join(importer_dir, specifier)
		} else {
			normalize(specifier.trim_start_matches('/'))
		};

		self.probe(&base, store)
			.map(|path| ModuleResolution {
				path,
				namespace: Namespace::Virtual,
			})
			.ok_or_else(|| BuildError::module_not_found(specifier, Some(importer_dir)))
	}

	fn probe(&self, base: &str, store: &VirtualFileStore) -> Option<String> {
		if !base.is_empty() && store.contains(base) {
			return Some(base.to_string());
		}
		let direct = SUPPORTED_EXTENSIONS
			.iter()
			.map(|ext| format!("{}{}", base, ext));
		let index = SUPPORTED_EXTENSIONS.iter().map(|ext| {
			if base.is_empty() {
				format!("index{}", ext)
			} else {
				format!("{}/index{}", base, ext)
			}
		});
		direct.chain(index).find(|candidate| store.contains(candidate))
	}

	/// Read a resolved virtual module. `None` when the file has gone away
	/// since it was resolved.
	pub fn load(&self, path: &str, store: &VirtualFileStore) -> Option<LoadedModule> {
		store.get(path).map(|contents| LoadedModule {
			path: path.to_string(),
			contents: contents.to_string(),
			dialect: SourceDialect::from_path(path),
		})
	}
}

/// Directory part of a store path (`src/screens/Home.tsx` -> `src/screens`)
pub fn parent_dir(path: &str) -> &str {
	match path.rfind('/') {
		Some(idx) => &path[..idx],
		None => "",
	}
}

fn is_relative(specifier: &str) -> bool {
	specifier == "."
		|| specifier == ".."
		|| specifier.starts_with("./")
		|| specifier.starts_with("../")
}

fn join(dir: &str, relative: &str) -> String {
	if dir.is_empty() {
		normalize(relative)
	} else {
		normalize(&format!("{}/{}", dir, relative))
	}
}

/// Collapse `.` and `..` segments. `..` above the project root is dropped.
fn normalize(path: &str) -> String {
	let mut segments: Vec<&str> = Vec::new();
	for segment in path.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				segments.pop();
			}
			other => segments.push(other),
		}
	}
	segments.join("/")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn store() -> VirtualFileStore {
		[
			("src/App.tsx", "app"),
			("src/components/Header.tsx", "header"),
			("src/components/Header.js", "header js"),
			("src/utils/format.ts", "format"),
			("src/screens/index.jsx", "screens"),
			("src/data.json", "{}"),
			("react.tsx", "not the package"),
		]
		.into_iter()
		.collect()
	}

	#[rstest]
	#[case("./components/Header", "src", "src/components/Header.tsx")]
	#[case("../utils/format", "src/components", "src/utils/format.ts")]
	#[case("./Header.js", "src/components", "src/components/Header.js")]
	#[case("./screens", "src", "src/screens/index.jsx")]
	#[case("src/utils/format", "src/components", "src/utils/format.ts")]
	#[case("./data.json", "src", "src/data.json")]
	#[case("../App", "src/components", "src/App.tsx")]
	fn test_virtual_specifiers_resolve(
		store: VirtualFileStore,
		#[case] specifier: &str,
		#[case] importer_dir: &str,
		#[case] expected: &str,
	) {
		// Arrange
		let resolver = ModuleResolver::default();

		// Act
		let resolution = resolver.resolve(specifier, importer_dir, &store).unwrap();

		// Assert
		assert_eq!(resolution.namespace, Namespace::Virtual);
		assert_eq!(resolution.path, expected);
	}

	#[rstest]
	#[case(".tsx")]
	#[case(".ts")]
	#[case(".js")]
	#[case(".jsx")]
	fn test_probe_order_prefers_earlier_extensions(#[case] winner: &str) {
		let position = SUPPORTED_EXTENSIONS.iter().position(|e| *e == winner).unwrap();
		let store: VirtualFileStore = SUPPORTED_EXTENSIONS[position..]
			.iter()
			.map(|ext| (format!("src/Button{}", ext), ext.to_string()))
			.collect();
		let resolver = ModuleResolver::default();

		let resolution = resolver.resolve("./Button", "src", &store).unwrap();

		assert_eq!(resolution.path, format!("src/Button{}", winner));
	}

	#[rstest]
	#[case("react")]
	#[case("react-native-web")]
	#[case("@balbal/navigation")]
	#[case("lodash/fp")]
	fn test_packages_are_external_even_when_a_file_matches(
		store: VirtualFileStore,
		#[case] specifier: &str,
	) {
		let resolver = ModuleResolver::default();

		let resolution = resolver.resolve(specifier, "", &store).unwrap();

		assert_eq!(resolution.namespace, Namespace::External);
		assert_eq!(resolution.path, specifier);
	}

	#[rstest]
	fn test_missing_virtual_module_is_module_not_found(store: VirtualFileStore) {
		let resolver = ModuleResolver::default();

		let err = resolver.resolve("./Footer", "src", &store).unwrap_err();

		assert_eq!(err, BuildError::module_not_found("./Footer", Some("src")));
	}

	#[rstest]
	fn test_load_derives_dialect_from_extension(store: VirtualFileStore) {
		let resolver = ModuleResolver::default();

		let ts = resolver.load("src/utils/format.ts", &store).unwrap();
		let js = resolver.load("src/screens/index.jsx", &store).unwrap();

		assert_eq!(ts.dialect, SourceDialect::TypeScriptJsx);
		assert_eq!(js.dialect, SourceDialect::JavaScriptJsx);
		assert_eq!(ts.contents, "format");
	}

	#[rstest]
	fn test_load_of_deleted_file_is_none(mut store: VirtualFileStore) {
		let resolver = ModuleResolver::default();
		let resolution = resolver.resolve("./App", "src", &store).unwrap();

		store.remove(&resolution.path);

		assert_eq!(resolver.load(&resolution.path, &store), None);
	}

	#[rstest]
	#[case("src/screens/Home.tsx", "src/screens")]
	#[case("App.tsx", "")]
	fn test_parent_dir(#[case] path: &str, #[case] expected: &str) {
		assert_eq!(parent_dir(path), expected);
	}

	#[rstest]
	#[case("src/./a/../b", "src/b")]
	#[case("../../x", "x")]
	fn test_normalize(#[case] path: &str, #[case] expected: &str) {
		assert_eq!(normalize(path), expected);
	}
}
