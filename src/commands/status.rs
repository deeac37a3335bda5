//! Status command - report indexing progress without loading a model

use anyhow::Result;
use colored::Colorize;
use std::num::NonZeroUsize;
use std::path::Path;

use crate::indexer;
use crate::storage::CheckpointStore;
use crate::ui;

pub fn run(root: &Path, checkpoint: &Path, chunk_size: NonZeroUsize) -> Result<()> {
	let store = CheckpointStore::new(checkpoint);
	let plan = indexer::prepare(root, &store, chunk_size)?;

	ui::header("─── Status ───");
	println!("  {} {}", "Photos found:".bright_blue(), plan.found);
	println!("  {} {}", "Checkpointed:".bright_blue(), plan.checkpointed);
	println!("  {} {}", "Remaining:".yellow(), plan.remaining());
	println!("  {} {} of up to {}", "Chunks:".bright_blue(), plan.chunks.len(), chunk_size);
	println!();

	if plan.is_empty() {
		ui::success("Everything is indexed");
	}
	Ok(())
}
