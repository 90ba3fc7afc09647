//! In-memory project files

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from project-relative path (e.g. `src/App.tsx`) to source text.
///
/// Reads of missing paths return `None`; writes replace existing content.
/// The store is a plain value: cloning it is how callers take the
/// consistent snapshot a build needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualFileStore {
	files: BTreeMap<String, String>,
}

impl VirtualFileStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, path: &str) -> Option<&str> {
		self.files.get(path).map(String::as_str)
	}

	/// Last write wins
	pub fn set(&mut self, path: impl Into<String>, content: impl Into<String>) {
		self.files.insert(path.into(), content.into());
	}

	pub fn remove(&mut self, path: &str) -> Option<String> {
		self.files.remove(path)
	}

	pub fn contains(&self, path: &str) -> bool {
		self.files.contains_key(path)
	}

	/// `(path, content)` pairs
	pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
		self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
	}

	pub fn paths(&self) -> impl Iterator<Item = &str> {
		self.files.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

impl<P, C> FromIterator<(P, C)> for VirtualFileStore
where
	P: Into<String>,
	C: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
		let mut store = Self::new();
		store.extend(iter);
		store
	}
}

impl<P, C> Extend<(P, C)> for VirtualFileStore
where
	P: Into<String>,
	C: Into<String>,
{
	fn extend<I: IntoIterator<Item = (P, C)>>(&mut self, iter: I) {
		for (path, content) in iter {
			self.set(path, content);
		}
	}
}
