//! Photo discovery below a root directory

use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::config::PHOTO_EXTENSIONS;
use crate::core::{InputId, InputSet};
use crate::error::{IndexError, Result};
use crate::ui;

/// Lists every photo below `root` as ids relative to `root`.
///
/// Only fails when the root itself cannot be read. Entries that vanish or
/// deny access during the walk are skipped. Names starting with `.` are
/// skipped at every level below the root. Symlinked photos and directories
/// are followed; link cycles are reported by walkdir and skipped.
///
/// Paths that cannot be stored as one checkpoint line (not UTF-8, or
/// containing a line break) are skipped with a warning.
pub fn enumerate_inputs(root: &Path) -> Result<InputSet> {
	fs::read_dir(root).map_err(|source| IndexError::Filesystem { path: root.to_path_buf(), source })?;

	let mut inputs = InputSet::new();
	let walker = WalkDir::new(root)
		.follow_links(true)
		.into_iter()
		.filter_entry(|e| e.depth() == 0 || !is_hidden(e));

	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				ui::debug(&format!("Skipped during walk: {}", e));
				continue;
			}
		};

		if !entry.file_type().is_file() || !is_photo(entry.path()) {
			continue;
		}

		let Ok(relative) = entry.path().strip_prefix(root) else { continue };
		match InputId::from_relative(relative) {
			Some(id) if id.as_str().contains(['\n', '\r']) => {
				ui::warn(&format!("Skipping path with a line break: {:?}", id.as_str()));
			}
			Some(id) => {
				inputs.insert(id);
			}
			None => ui::warn(&format!("Skipping non UTF-8 path: {}", entry.path().display())),
		}
	}

	Ok(inputs)
}

fn is_photo(path: &Path) -> bool {
	path.extension()
		.and_then(|e| e.to_str())
		.map(|ext| PHOTO_EXTENSIONS.contains(&ext))
		.unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
	entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	fn touch(root: &Path, rel: &str) {
		let path = root.join(rel);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(path, b"x").unwrap();
	}

	#[test]
	fn lists_matching_extensions_recursively() {
		let dir = tempfile::tempdir().unwrap();
		for rel in ["a.jpg", "b.JPG", "c.jpeg", "d.JPEG", "nested/deep/e.jpg", "f.png", "g.Jpg", "notes.txt"] {
			touch(dir.path(), rel);
		}

		let found: Vec<String> = enumerate_inputs(dir.path())
			.unwrap()
			.into_iter()
			.map(|id| id.as_str().to_string())
			.collect();

		assert_eq!(found, ["a.jpg", "b.JPG", "c.jpeg", "d.JPEG", "nested/deep/e.jpg"]);
	}

	#[test]
	fn skips_hidden_entries() {
		let dir = tempfile::tempdir().unwrap();
		touch(dir.path(), ".thumbs/a.jpg");
		touch(dir.path(), ".b.jpg");
		touch(dir.path(), "c.jpg");

		let found = enumerate_inputs(dir.path()).unwrap();
		assert_eq!(found.len(), 1);
		assert!(found.contains(&InputId::from("c.jpg")));
	}

	#[cfg(unix)]
	#[test]
	fn skips_names_with_line_breaks() {
		let dir = tempfile::tempdir().unwrap();
		touch(dir.path(), "x\nb.jpg");
		touch(dir.path(), "c\r.jpg");
		touch(dir.path(), "b.jpg");

		let found = enumerate_inputs(dir.path()).unwrap();
		assert_eq!(found.into_iter().collect::<Vec<_>>(), [InputId::from("b.jpg")]);
	}

	#[cfg(unix)]
	#[test]
	fn follows_symlinked_photos_and_albums() {
		use std::os::unix::fs::symlink;

		let root = tempfile::tempdir().unwrap();
		let other = tempfile::tempdir().unwrap();
		touch(other.path(), "real.jpg");
		touch(other.path(), "album/in_dir.jpg");
		symlink(other.path().join("real.jpg"), root.path().join("link.jpg")).unwrap();
		symlink(other.path().join("album"), root.path().join("album")).unwrap();
		// A cycle back to the root must not hang or fail the walk
		symlink(root.path(), root.path().join("album_loop")).unwrap();

		let found: Vec<String> = enumerate_inputs(root.path())
			.unwrap()
			.into_iter()
			.map(|id| id.as_str().to_string())
			.collect();

		assert_eq!(found, ["album/in_dir.jpg", "link.jpg"]);
	}

	#[test]
	fn directories_named_like_photos_are_ignored() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir_all(dir.path().join("album.jpg")).unwrap();

		assert!(enumerate_inputs(dir.path()).unwrap().is_empty());
	}

	#[test]
	fn missing_root_is_a_filesystem_error() {
		let dir = tempfile::tempdir().unwrap();
		let result = enumerate_inputs(&dir.path().join("missing"));
		assert!(matches!(result, Err(IndexError::Filesystem { .. })));
	}
}
