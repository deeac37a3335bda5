//! Input identifiers relative to the photo root

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Relative path of a photo below the root, `/`-separated.
///
/// Equality is byte equality of the path string, so `a.jpg` and `A.jpg` are
/// different inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(String);

impl InputId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Builds an id from a path relative to the root. Returns `None` for
	/// paths that are not valid UTF-8.
	pub fn from_relative(path: &Path) -> Option<Self> {
		let parts: Option<Vec<&str>> = path.components().map(|c| c.as_os_str().to_str()).collect();
		parts.map(|parts| Self(parts.join("/")))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Absolute location of this input below `root`.
	pub fn resolve(&self, root: &Path) -> PathBuf {
		self.0.split('/').fold(root.to_path_buf(), |path, part| path.join(part))
	}
}

impl std::fmt::Display for InputId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for InputId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// Every input found by one enumeration; rebuilt each run.
pub type InputSet = BTreeSet<InputId>;

/// Inputs recorded as indexed, after tombstones are removed.
pub type CheckpointSet = BTreeSet<InputId>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn relative_paths_use_forward_slashes() {
		let id = InputId::from_relative(&Path::new("2021").join("may").join("a.jpg")).unwrap();
		assert_eq!(id.as_str(), "2021/may/a.jpg");
		assert_eq!(id.resolve(Path::new("/photos")), Path::new("/photos/2021/may/a.jpg"));
	}

	#[test]
	fn ids_are_case_sensitive() {
		assert_ne!(InputId::from("a.jpg"), InputId::from("A.jpg"));
	}
}
