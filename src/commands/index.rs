//! Index command - embed and upload new photos

use anyhow::{Context, Result};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::indexer;
use crate::models::VisionModel;
use crate::processing::pipeline::EmbeddingPipeline;
use crate::storage::CheckpointStore;
use crate::ui;
use crate::upload::HttpUploader;

pub struct IndexOptions<'a> {
	pub root: &'a Path,
	pub base_url: &'a str,
	pub checkpoint: &'a Path,
	pub chunk_size: NonZeroUsize,
	pub batch_size: usize,
	pub timeout: Duration,
}

pub fn run(options: IndexOptions<'_>) -> Result<()> {
	ui::info(&format!("Looking for photos to index in {}", options.root.display()));

	let store = CheckpointStore::new(options.checkpoint);
	let plan = indexer::prepare(options.root, &store, options.chunk_size)?;

	ui::info(&format!(
		"Found {} photos. {} already indexed. {} to be indexed.",
		plan.found,
		plan.checkpointed,
		plan.remaining()
	));

	if plan.is_empty() {
		ui::success("Nothing to index");
		return Ok(());
	}

	let uploader = HttpUploader::new(options.base_url, options.timeout)?;
	ui::debug(&format!("Uploading to {}", uploader.endpoint()));

	ui::info("Loading vision model...");
	let load_start = Instant::now();
	let model = VisionModel::from_config().context("Cannot index without the vision model")?;
	ui::success(&format!("Model ready in {:.2}s", load_start.elapsed().as_secs_f32()));

	let mut pipeline = EmbeddingPipeline::new(options.root, model, options.batch_size);
	let summary = indexer::process(&plan, &mut pipeline, &uploader, &store)?;

	ui::summary(
		summary.indexed_inputs(),
		summary.checkpointed_chunks(),
		summary.failed_chunks(),
		summary.duration_secs,
	);

	if summary.failed_chunks() > 0 {
		ui::warn(&format!(
			"{} chunks failed and will be retried on the next run",
			summary.failed_chunks()
		));
	} else {
		ui::success("All photos indexed");
	}

	Ok(())
}
