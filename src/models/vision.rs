//! Vision model (CLIP) for image embeddings

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array, Array4};
use ort::{session::Session, value::Value};
use std::path::Path;

use super::{split_batch, ImageEmbedder};
use crate::config::{self, EMBEDDING_DIM, INPUT_SIZE, PIXEL_MEAN, PIXEL_STD};
use crate::core::Embedding;

pub struct VisionModel {
	session: Session,
}

impl VisionModel {
	pub fn load(model_path: &Path) -> Result<Self> {
		if !model_path.exists() {
			anyhow::bail!("Vision model file does not exist: {}", model_path.display());
		}
		let session = crate::runtime::create_session(model_path).context("Failed to load vision model")?;
		Ok(Self { session })
	}

	/// Loads the vision model from the configured models directory.
	pub fn from_config() -> Result<Self> {
		let path = config::get_vision_model_path()
			.with_context(|| format!("Vision model not found. Ensure {} exists", config::VISION_MODEL))?;
		crate::ui::debug(&format!("Loading vision model: {}", path.display()));
		Self::load(&path)
	}
}

impl ImageEmbedder for VisionModel {
	fn embed_images(&mut self, images: &[DynamicImage]) -> Result<Vec<Embedding>> {
		if images.is_empty() {
			return Ok(Vec::new());
		}

		crate::ui::debug(&format!("Running vision inference on {} images", images.len()));
		let input = Value::from_array(preprocess(images)).context("Input tensor creation failed")?;
		let outputs = self.session.run(ort::inputs!["pixel_values" => input]).context("Inference failed")?;

		let (dims, data) = if let Some(output) = outputs.get("image_embeds").or_else(|| outputs.get("pooler_output")) {
			let (shape, data) = output.try_extract_tensor::<f32>()?;
			(to_dims(&shape), data.to_vec())
		} else {
			let (_, output) = outputs.iter().next().context("Vision model produced no outputs")?;
			let (shape, data) = output.try_extract_tensor::<f32>()?;
			(to_dims(&shape), data.to_vec())
		};

		let vectors = split_batch(&data, &dims, images.len())?;
		if let Some(v) = vectors.first().filter(|v| v.len() != EMBEDDING_DIM) {
			anyhow::bail!("Vision model returned {} dims, expected {}", v.len(), EMBEDDING_DIM);
		}

		Ok(vectors.into_iter().map(Embedding::new).collect())
	}
}

fn to_dims(shape: &[i64]) -> Vec<usize> {
	shape.iter().map(|&x| x as usize).collect()
}

/// Resizes and normalizes a batch into an NCHW tensor.
fn preprocess(images: &[DynamicImage]) -> Array4<f32> {
	let size = INPUT_SIZE as usize;
	let mut arr = Array::zeros((images.len(), 3, size, size));

	for (n, img) in images.iter().enumerate() {
		let rgb = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom).to_rgb8();
		for (x, y, px) in rgb.enumerate_pixels() {
			for c in 0..3 {
				let v = px[c] as f32 / 255.0;
				arr[[n, c, y as usize, x as usize]] = (v - PIXEL_MEAN[c]) / PIXEL_STD[c];
			}
		}
	}

	arr
}
