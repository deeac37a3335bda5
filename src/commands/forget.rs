//! Forget command - tombstone photos so they are indexed again

use anyhow::Result;
use std::path::Path;

use crate::core::InputId;
use crate::storage::CheckpointStore;
use crate::ui;

pub fn run(paths: &[String], checkpoint: &Path) -> Result<()> {
	let ids: Vec<InputId> = paths
		.iter()
		.map(|p| p.trim().trim_start_matches("./"))
		.filter(|p| !p.is_empty())
		.map(InputId::from)
		.collect();

	let store = CheckpointStore::new(checkpoint);
	store.tombstone(&ids)?;

	ui::success(&format!(
		"{} photos will be indexed again on the next run",
		ids.len()
	));
	ui::debug(&format!("Tombstones written to {}", store.tombstone_path().display()));
	Ok(())
}
