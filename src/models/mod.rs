//! # Embedding Models
//!
//! The pipeline only sees the [`ImageEmbedder`] and [`TextEmbedder`] traits.
//! `VisionModel` and `TextModel` are the ONNX implementations; they are
//! loaded once and handed to whoever needs them.

pub mod text;
pub mod vision;

use anyhow::Result;
use image::DynamicImage;

use crate::core::Embedding;

pub use text::TextModel;
pub use vision::VisionModel;

/// Turns decoded images into one vector each, in input order.
pub trait ImageEmbedder {
	fn embed_images(&mut self, images: &[DynamicImage]) -> Result<Vec<Embedding>>;
}

/// Turns a text query into a vector in the same space as the images.
pub trait TextEmbedder {
	fn embed_text(&mut self, text: &str) -> Result<Embedding>;
}

impl<T: ImageEmbedder + ?Sized> ImageEmbedder for &mut T {
	fn embed_images(&mut self, images: &[DynamicImage]) -> Result<Vec<Embedding>> {
		(**self).embed_images(images)
	}
}

/// Picks the embedding out of a model output of shape `[n, dim]` or
/// `[n, tokens, dim]` (mean pooled over tokens).
pub(crate) fn split_batch(data: &[f32], shape: &[usize], batch: usize) -> Result<Vec<Vec<f32>>> {
	match shape {
		[n, dim] if *n == batch && *dim > 0 => Ok(data.chunks(*dim).map(<[f32]>::to_vec).collect()),
		[n, tokens, dim] if *n == batch && *tokens > 0 && *dim > 0 => Ok(data
			.chunks(tokens * dim)
			.map(|item| {
				let mut pooled = vec![0.0; *dim];
				for token in item.chunks(*dim) {
					for (acc, v) in pooled.iter_mut().zip(token) {
						*acc += v;
					}
				}
				pooled.iter_mut().for_each(|v| *v /= *tokens as f32);
				pooled
			})
			.collect()),
		_ => anyhow::bail!("Unexpected output shape {:?} for batch of {}", shape, batch),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_pooled_output_per_item() {
		let out = split_batch(&[1.0, 2.0, 3.0, 4.0], &[2, 2], 2).unwrap();
		assert_eq!(out, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
	}

	#[test]
	fn mean_pools_token_outputs() {
		let out = split_batch(&[1.0, 3.0, 3.0, 5.0], &[1, 2, 2], 1).unwrap();
		assert_eq!(out, vec![vec![2.0, 4.0]]);
	}

	#[test]
	fn rejects_mismatched_batch() {
		assert!(split_batch(&[1.0, 2.0], &[1, 2], 3).is_err());
	}
}
