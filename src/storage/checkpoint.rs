//! Line-delimited checkpoint of indexed inputs
//!
//! The checkpoint file holds one relative path per line. A companion
//! tombstone file (`<checkpoint>.del`, same format) lists ids that count as
//! not indexed even when they appear in the checkpoint. Both files only ever
//! change through a temp-file-then-rename, so a reader sees either the old or
//! the new content, never a partial write.
//!
//! Single writer: two processes appending to the same checkpoint at once can
//! lose entries.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{CHECKPOINT_TEMP_SUFFIX, CHECKPOINT_TOMBSTONE_SUFFIX};
use crate::core::{CheckpointSet, InputId};
use crate::error::{IndexError, Result};
use crate::ui;

#[derive(Debug, Clone)]
pub struct CheckpointStore {
	path: PathBuf,
	tombstone_path: PathBuf,
}

impl CheckpointStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let tombstone_path = with_suffix(&path, CHECKPOINT_TOMBSTONE_SUFFIX);
		Self { path, tombstone_path }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn tombstone_path(&self) -> &Path {
		&self.tombstone_path
	}

	/// Effective checkpoint: every id in the checkpoint file minus every id
	/// in the tombstone file. Missing files count as empty.
	pub fn load(&self) -> Result<CheckpointSet> {
		let mut ids: CheckpointSet = read_ids(&self.path)?.into_iter().collect();
		let tombstones = read_ids(&self.tombstone_path)?;
		if !tombstones.is_empty() {
			ui::debug(&format!("Applying {} tombstones", tombstones.len()));
		}
		for id in &tombstones {
			ids.remove(id);
		}
		Ok(ids)
	}

	/// Durably adds `ids` to the checkpoint. Existing entries are kept and
	/// duplicates are written as-is.
	pub fn append(&self, ids: &[InputId]) -> Result<()> {
		append_atomic(&self.path, ids)
	}

	/// Durably adds `ids` to the tombstone file.
	pub fn tombstone(&self, ids: &[InputId]) -> Result<()> {
		append_atomic(&self.tombstone_path, ids)
	}
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
	let mut name = OsString::from(path.as_os_str());
	name.push(suffix);
	PathBuf::from(name)
}

fn read_ids(path: &Path) -> Result<Vec<InputId>> {
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(e) => {
			return Err(IndexError::CorruptCheckpoint {
				path: path.to_path_buf(),
				reason: e.to_string(),
			})
		}
	};

	let text = String::from_utf8(bytes).map_err(|e| IndexError::CorruptCheckpoint {
		path: path.to_path_buf(),
		reason: format!("not UTF-8 text ({})", e.utf8_error()),
	})?;

	Ok(text
		.lines()
		.map(|line| line.trim_end_matches('\r'))
		.filter(|line| !line.is_empty())
		.map(InputId::new)
		.collect())
}

fn append_atomic(path: &Path, ids: &[InputId]) -> Result<()> {
	if ids.is_empty() {
		return Ok(());
	}

	let temp_path = with_suffix(path, CHECKPOINT_TEMP_SUFFIX);
	write_with_appended(path, &temp_path, ids)
		.and_then(|_| fs::rename(&temp_path, path))
		.map_err(|source| IndexError::CheckpointWrite { path: path.to_path_buf(), source })?;

	// Sync parent directory to make the rename durable
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		if let Ok(dir) = File::open(parent) {
			let _ = dir.sync_all();
		}
	}

	ui::debug(&format!("Appended {} ids to {}", ids.len(), path.display()));
	Ok(())
}

fn write_with_appended(path: &Path, temp_path: &Path, ids: &[InputId]) -> io::Result<()> {
	let existing = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
		Err(e) => return Err(e),
	};

	let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(temp_path)?;
	file.write_all(&existing)?;
	if existing.last().is_some_and(|&b| b != b'\n') {
		file.write_all(b"\n")?;
	}
	for id in ids {
		writeln!(file, "{}", id)?;
	}
	file.sync_all()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(names: &[&str]) -> Vec<InputId> {
		names.iter().map(|n| InputId::from(*n)).collect()
	}

	#[test]
	fn missing_checkpoint_loads_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));
		assert!(store.load().unwrap().is_empty());
	}

	#[test]
	fn append_preserves_existing_entries() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));

		store.append(&ids(&["a.jpg", "b.jpg"])).unwrap();
		store.append(&ids(&["c.jpg"])).unwrap();

		let loaded = store.load().unwrap();
		assert_eq!(loaded.into_iter().collect::<Vec<_>>(), ids(&["a.jpg", "b.jpg", "c.jpg"]));
		assert!(!with_suffix(store.path(), CHECKPOINT_TEMP_SUFFIX).exists());
	}

	#[test]
	fn duplicate_appends_are_harmless() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));

		store.append(&ids(&["a.jpg"])).unwrap();
		store.append(&ids(&["a.jpg", "b.jpg"])).unwrap();

		let raw = fs::read_to_string(store.path()).unwrap();
		assert_eq!(raw, "a.jpg\na.jpg\nb.jpg\n");
		assert_eq!(store.load().unwrap().len(), 2);
	}

	#[test]
	fn tombstones_are_excluded_but_stay_on_disk() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));
		store.append(&ids(&["a.jpg", "b.jpg"])).unwrap();
		fs::write(store.tombstone_path(), "a.jpg\n").unwrap();

		let loaded = store.load().unwrap();
		assert!(!loaded.contains(&InputId::from("a.jpg")));
		assert!(loaded.contains(&InputId::from("b.jpg")));
		assert!(fs::read_to_string(store.path()).unwrap().contains("a.jpg"));
	}

	#[test]
	fn tombstone_for_unknown_id_is_ignored() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));
		store.append(&ids(&["a.jpg"])).unwrap();
		store.tombstone(&ids(&["zzz.jpg"])).unwrap();

		assert_eq!(store.load().unwrap().len(), 1);
	}

	#[test]
	fn append_repairs_missing_trailing_newline() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));
		fs::write(store.path(), "a.jpg\r\nb.jpg").unwrap();

		store.append(&ids(&["c.jpg"])).unwrap();

		let loaded = store.load().unwrap();
		assert_eq!(loaded.into_iter().collect::<Vec<_>>(), ids(&["a.jpg", "b.jpg", "c.jpg"]));
	}

	#[test]
	fn non_utf8_checkpoint_is_corrupt() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(dir.path().join(".checkpoint"));
		fs::write(store.path(), [0x61, 0xff, 0xfe, 0x0a]).unwrap();

		assert!(matches!(store.load(), Err(IndexError::CorruptCheckpoint { .. })));
	}
}
