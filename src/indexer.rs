//! # Pipeline Driver
//!
//! Runs planned chunks strictly one after another through
//! `Planned -> MetadataExtracted -> Embedded -> Uploaded -> Checkpointed`.
//! A chunk that fails at any step ends in `Failed`, is logged with all of its
//! members, and the run continues. Only a fully uploaded chunk is appended
//! to the checkpoint, so failed chunks come back on the next run.

use colored::Colorize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Instant;

use crate::core::InputId;
use crate::error::{ChunkError, Result};
use crate::models::ImageEmbedder;
use crate::processing::enumerate::enumerate_inputs;
use crate::processing::pipeline::EmbeddingPipeline;
use crate::processing::planner::{self, Chunk, Plan};
use crate::storage::CheckpointStore;
use crate::ui;
use crate::upload::IndexSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
	Planned,
	MetadataExtracted,
	Embedded,
	Uploaded,
	Checkpointed,
	Failed,
}

impl fmt::Display for ChunkState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Planned => "planned",
			Self::MetadataExtracted => "metadata extracted",
			Self::Embedded => "embedded",
			Self::Uploaded => "uploaded",
			Self::Checkpointed => "checkpointed",
			Self::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// Final state of one chunk.
#[derive(Debug)]
pub struct ChunkReport {
	pub index: usize,
	pub ids: Vec<InputId>,
	pub state: ChunkState,
	/// Last state reached before failing.
	pub failed_after: Option<ChunkState>,
	pub error: Option<ChunkError>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
	pub chunks: Vec<ChunkReport>,
	pub duration_secs: f32,
}

impl RunSummary {
	pub fn checkpointed_chunks(&self) -> usize {
		self.chunks.iter().filter(|c| c.state == ChunkState::Checkpointed).count()
	}

	pub fn failed_chunks(&self) -> usize {
		self.chunks.iter().filter(|c| c.state == ChunkState::Failed).count()
	}

	pub fn indexed_inputs(&self) -> usize {
		self.chunks
			.iter()
			.filter(|c| c.state == ChunkState::Checkpointed)
			.map(|c| c.ids.len())
			.sum()
	}
}

/// Enumerates the root, loads the checkpoint and plans the run.
pub fn prepare(root: &Path, store: &CheckpointStore, chunk_size: NonZeroUsize) -> Result<Plan> {
	let all = enumerate_inputs(root)?;
	let checkpointed = store.load()?;
	Ok(planner::plan_run(&all, &checkpointed, chunk_size))
}

/// Processes every chunk of `plan`. Chunk failures are recorded in the
/// summary; only checkpoint write failures abort the run.
pub fn process<E, S>(
	plan: &Plan,
	pipeline: &mut EmbeddingPipeline<E>,
	sink: &S,
	store: &CheckpointStore,
) -> Result<RunSummary>
where
	E: ImageEmbedder,
	S: IndexSink + ?Sized,
{
	let start = Instant::now();
	let total = plan.chunks.len();
	let mut summary = RunSummary::default();

	for chunk in &plan.chunks {
		let done = chunk.index() as f32 / total as f32 * 100.0;
		ui::info(&format!(
			"{} Embedding {} photos ({:.2}% done)",
			format!("[{}/{}]", chunk.index() + 1, total).bright_blue().bold(),
			chunk.len(),
			done
		));

		let chunk_start = Instant::now();
		let mut state = ChunkState::Planned;
		let result = run_chunk(chunk, pipeline, sink, store, &mut state);

		let report = match result {
			Ok(()) => {
				ui::success(&format!(
					"Chunk {} indexed {}",
					chunk.index() + 1,
					format!("{}ms", chunk_start.elapsed().as_millis()).dimmed()
				));
				ChunkReport {
					index: chunk.index(),
					ids: chunk.ids().to_vec(),
					state: ChunkState::Checkpointed,
					failed_after: None,
					error: None,
				}
			}
			Err(ChunkFailure::Chunk(e)) => {
				report_failure(chunk, state, &e);
				ChunkReport {
					index: chunk.index(),
					ids: chunk.ids().to_vec(),
					state: ChunkState::Failed,
					failed_after: Some(state),
					error: Some(e),
				}
			}
			Err(ChunkFailure::Run(e)) => return Err(e),
		};
		summary.chunks.push(report);
	}

	summary.duration_secs = start.elapsed().as_secs_f32();
	Ok(summary)
}

enum ChunkFailure {
	Chunk(ChunkError),
	Run(crate::error::IndexError),
}

impl From<ChunkError> for ChunkFailure {
	fn from(e: ChunkError) -> Self {
		Self::Chunk(e)
	}
}

fn run_chunk<E, S>(
	chunk: &Chunk,
	pipeline: &mut EmbeddingPipeline<E>,
	sink: &S,
	store: &CheckpointStore,
	state: &mut ChunkState,
) -> std::result::Result<(), ChunkFailure>
where
	E: ImageEmbedder,
	S: IndexSink + ?Sized,
{
	let metadata = pipeline.extract_metadata(chunk);
	advance(state, ChunkState::MetadataExtracted, chunk);

	let items = pipeline.embed(chunk, metadata)?;
	advance(state, ChunkState::Embedded, chunk);

	sink.upload(&items).map_err(ChunkError::from)?;
	advance(state, ChunkState::Uploaded, chunk);

	store.append(chunk.ids()).map_err(ChunkFailure::Run)?;
	advance(state, ChunkState::Checkpointed, chunk);
	Ok(())
}

fn advance(state: &mut ChunkState, next: ChunkState, chunk: &Chunk) {
	*state = next;
	ui::debug(&format!("Chunk {} {}", chunk.index() + 1, next));
}

fn report_failure(chunk: &Chunk, state: ChunkState, error: &ChunkError) {
	ui::error(&format!("Chunk {} failed after {}: {}", chunk.index() + 1, state, error));
	if let ChunkError::Upload(e) = error {
		ui::debug(&format!("Upload stopped at {}, later items were not sent", e.path()));
	}
	let members: Vec<&str> = chunk.ids().iter().map(InputId::as_str).collect();
	ui::warn(&format!("Not indexed, will retry next run: {}", members.join(", ")));
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::{Embedding, UploadItem};
	use crate::error::UploadError;
	use image::DynamicImage;
	use std::cell::RefCell;

	struct ConstEmbedder;

	impl ImageEmbedder for ConstEmbedder {
		fn embed_images(&mut self, images: &[DynamicImage]) -> anyhow::Result<Vec<Embedding>> {
			Ok(images.iter().map(|_| Embedding::raw(vec![1.0, 0.0])).collect())
		}
	}

	/// Rejects any item whose path is listed.
	#[derive(Default)]
	struct PickySink {
		reject: Vec<&'static str>,
		sent: RefCell<Vec<String>>,
	}

	impl IndexSink for PickySink {
		fn send(&self, item: &UploadItem) -> std::result::Result<(), UploadError> {
			self.sent.borrow_mut().push(item.id().to_string());
			if self.reject.contains(&item.id().as_str()) {
				return Err(UploadError::Rejected { path: item.id().clone(), status: 503 });
			}
			Ok(())
		}
	}

	fn photo_tree(names: &[&str]) -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		for name in names {
			image::RgbImage::new(2, 2).save(dir.path().join(name)).unwrap();
		}
		dir
	}

	#[test]
	fn failed_chunk_is_not_checkpointed_and_run_continues() {
		let photos = photo_tree(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);
		let state = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(state.path().join(".checkpoint"));
		let plan = prepare(photos.path(), &store, NonZeroUsize::new(2).unwrap()).unwrap();
		let sink = PickySink { reject: vec!["a.jpg"], ..Default::default() };
		let mut pipeline = EmbeddingPipeline::new(photos.path(), ConstEmbedder, 4);

		let summary = process(&plan, &mut pipeline, &sink, &store).unwrap();

		assert_eq!(summary.failed_chunks(), 1);
		assert_eq!(summary.checkpointed_chunks(), 2);
		assert_eq!(summary.chunks[0].failed_after, Some(ChunkState::Embedded));
		assert!(matches!(summary.chunks[0].error, Some(ChunkError::Upload(_))));

		let done = store.load().unwrap();
		assert!(!done.contains(&InputId::from("a.jpg")));
		assert!(!done.contains(&InputId::from("b.jpg")));
		assert_eq!(done.len(), 3);
		// Fail-fast: b.jpg was never sent
		assert!(!sink.sent.borrow().contains(&"b.jpg".to_string()));
	}

	#[test]
	fn decode_failure_stops_before_upload() {
		let photos = photo_tree(&["a.jpg"]);
		std::fs::write(photos.path().join("b.jpg"), b"junk").unwrap();
		let state = tempfile::tempdir().unwrap();
		let store = CheckpointStore::new(state.path().join(".checkpoint"));
		let plan = prepare(photos.path(), &store, NonZeroUsize::new(10).unwrap()).unwrap();
		let sink = PickySink::default();
		let mut pipeline = EmbeddingPipeline::new(photos.path(), ConstEmbedder, 4);

		let summary = process(&plan, &mut pipeline, &sink, &store).unwrap();

		assert_eq!(summary.chunks[0].failed_after, Some(ChunkState::MetadataExtracted));
		assert!(sink.sent.borrow().is_empty());
		assert!(store.load().unwrap().is_empty());
	}
}
