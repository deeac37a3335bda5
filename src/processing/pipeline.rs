//! Chunk-level metadata extraction and embedding
//!
//! A chunk either yields one upload item per input, in chunk order, or fails
//! as a whole. Inside a chunk the work is split into sub-batches of
//! `batch_size` images; decoding within a sub-batch runs on the rayon pool.
//! Neither changes the order or number of items.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::planner::Chunk;
use super::{exif, image, metadata};
use crate::core::{InputId, Metadata, UploadItem};
use crate::error::ChunkError;
use crate::models::ImageEmbedder;
use crate::ui;

pub struct EmbeddingPipeline<E: ImageEmbedder> {
	root: PathBuf,
	embedder: E,
	batch_size: usize,
}

impl<E: ImageEmbedder> EmbeddingPipeline<E> {
	pub fn new(root: impl Into<PathBuf>, embedder: E, batch_size: usize) -> Self {
		Self { root: root.into(), embedder, batch_size: batch_size.max(1) }
	}

	/// Metadata for every input of the chunk, in order. Problems reading a
	/// file's tags are logged and leave that input with path-derived
	/// metadata only.
	pub fn extract_metadata(&self, chunk: &Chunk) -> Vec<Metadata> {
		chunk.ids().iter().map(|id| describe(&self.root, id)).collect()
	}

	/// Embeds the chunk's images and pairs each vector with its metadata.
	/// `metadata` must come from [`Self::extract_metadata`] for the same chunk.
	pub fn embed(&mut self, chunk: &Chunk, metadata: Vec<Metadata>) -> Result<Vec<UploadItem>, ChunkError> {
		if metadata.len() != chunk.len() {
			return Err(ChunkError::Embedding(format!(
				"{} metadata records for a chunk of {}",
				metadata.len(),
				chunk.len()
			)));
		}

		let mut vectors = Vec::with_capacity(chunk.len());
		for batch in chunk.ids().chunks(self.batch_size) {
			let images = batch
				.par_iter()
				.map(|id| {
					image::decode(&id.resolve(&self.root))
						.map_err(|reason| ChunkError::Decode { id: id.clone(), reason })
				})
				.collect::<Result<Vec<_>, _>>()?;

			let embedded = self
				.embedder
				.embed_images(&images)
				.map_err(|e| ChunkError::Embedding(format!("{:#}", e)))?;
			if embedded.len() != images.len() {
				return Err(ChunkError::Embedding(format!(
					"model returned {} vectors for {} images",
					embedded.len(),
					images.len()
				)));
			}
			vectors.extend(embedded);
		}

		Ok(metadata.into_iter().zip(vectors).map(|(meta, vector)| UploadItem::new(meta, vector)).collect())
	}

	/// Metadata extraction followed by embedding.
	pub fn compute(&mut self, chunk: &Chunk) -> Result<Vec<UploadItem>, ChunkError> {
		let metadata = self.extract_metadata(chunk);
		self.embed(chunk, metadata)
	}
}

fn describe(root: &Path, id: &InputId) -> Metadata {
	let tags = match exif::read_tags(&id.resolve(root)) {
		Ok(tags) => tags,
		Err(warning) => {
			ui::warn(&warning.to_string());
			Default::default()
		}
	};
	metadata::extract(id, &tags)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::{Embedding, InputSet};
	use crate::processing::planner;
	use ::image::DynamicImage;
	use std::num::NonZeroUsize;

	/// Encodes each image as `[width, call]` and counts calls.
	#[derive(Default)]
	struct WidthEmbedder {
		calls: usize,
		batch_sizes: Vec<usize>,
	}

	impl ImageEmbedder for WidthEmbedder {
		fn embed_images(&mut self, images: &[DynamicImage]) -> anyhow::Result<Vec<Embedding>> {
			self.calls += 1;
			self.batch_sizes.push(images.len());
			Ok(images.iter().map(|img| Embedding::raw(vec![img.width() as f32, self.calls as f32])).collect())
		}
	}

	fn photos(dir: &Path, widths: &[u32]) -> InputSet {
		widths
			.iter()
			.enumerate()
			.map(|(i, w)| {
				let name = format!("IMG_{:02}.jpg", i);
				::image::RgbImage::new(*w, 2).save(dir.join(&name)).unwrap();
				InputId::new(name)
			})
			.collect()
	}

	fn single_chunk(inputs: &InputSet) -> Chunk {
		planner::plan(inputs, &Default::default(), NonZeroUsize::new(100).unwrap()).remove(0)
	}

	#[test]
	fn sub_batching_keeps_order_and_count() {
		let dir = tempfile::tempdir().unwrap();
		let inputs = photos(dir.path(), &[3, 5, 7, 9, 11]);
		let chunk = single_chunk(&inputs);

		let mut pipeline = EmbeddingPipeline::new(dir.path(), WidthEmbedder::default(), 2);
		let items = pipeline.compute(&chunk).unwrap();

		let widths: Vec<f32> = items.iter().map(|item| item.vector[0]).collect();
		assert_eq!(widths, [3.0, 5.0, 7.0, 9.0, 11.0]);
		let ids: Vec<&InputId> = items.iter().map(|item| item.id()).collect();
		assert_eq!(ids, chunk.ids().iter().collect::<Vec<_>>());
		assert_eq!(pipeline.embedder.batch_sizes, [2, 2, 1]);
	}

	#[test]
	fn undecodable_input_fails_the_chunk() {
		let dir = tempfile::tempdir().unwrap();
		let mut inputs = photos(dir.path(), &[3, 5]);
		std::fs::write(dir.path().join("broken.jpg"), b"nope").unwrap();
		inputs.insert(InputId::from("broken.jpg"));
		let chunk = single_chunk(&inputs);

		let mut pipeline = EmbeddingPipeline::new(dir.path(), WidthEmbedder::default(), 8);
		let err = pipeline.compute(&chunk).unwrap_err();

		assert!(matches!(err, ChunkError::Decode { ref id, .. } if id.as_str() == "broken.jpg"));
		assert_eq!(pipeline.embedder.calls, 0);
	}

	#[test]
	fn wrong_vector_count_fails_the_chunk() {
		struct Short;
		impl ImageEmbedder for Short {
			fn embed_images(&mut self, _: &[DynamicImage]) -> anyhow::Result<Vec<Embedding>> {
				Ok(vec![Embedding::raw(vec![1.0])])
			}
		}

		let dir = tempfile::tempdir().unwrap();
		let chunk = single_chunk(&photos(dir.path(), &[3, 5]));
		let err = EmbeddingPipeline::new(dir.path(), Short, 8).compute(&chunk).unwrap_err();
		assert!(matches!(err, ChunkError::Embedding(_)));
	}

	#[test]
	fn metadata_uses_file_name_dates() {
		let dir = tempfile::tempdir().unwrap();
		::image::RgbImage::new(2, 2).save(dir.path().join("IMG_20210503_142210.jpg")).unwrap();
		let inputs: InputSet = [InputId::from("IMG_20210503_142210.jpg")].into_iter().collect();

		let pipeline = EmbeddingPipeline::new(dir.path(), WidthEmbedder::default(), 8);
		let metadata = pipeline.extract_metadata(&single_chunk(&inputs));

		assert_eq!(metadata[0].timestamp, Some(1_620_051_730));
	}

	#[test]
	fn metadata_prefers_the_exif_date_tag() {
		let dir = tempfile::tempdir().unwrap();
		exif::write_jpeg_with_exif(&dir.path().join("IMG_19990101_000000.jpg"), "2021:05:03 14:22:10");
		let inputs: InputSet = [InputId::from("IMG_19990101_000000.jpg")].into_iter().collect();

		let pipeline = EmbeddingPipeline::new(dir.path(), WidthEmbedder::default(), 8);
		let metadata = pipeline.extract_metadata(&single_chunk(&inputs));

		assert_eq!(metadata[0].timestamp, Some(1_620_051_730));
		assert_eq!(metadata[0].exif.get("Make"), Some(&crate::core::TagValue::Text("Canon".into())));
		assert_eq!(metadata[0].exif.get("XResolution"), Some(&crate::core::TagValue::Float(72.0)));
	}
}
