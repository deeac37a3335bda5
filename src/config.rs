//! Application configuration and constants

use std::path::PathBuf;
use std::sync::OnceLock;

static CUSTOM_MODEL_DIR: OnceLock<PathBuf> = OnceLock::new();

// === Model Files ===
pub const VISION_MODEL: &str = "vision_model.onnx";
pub const TEXT_MODEL: &str = "text_model.onnx";
pub const TOKENIZER: &str = "tokenizer.json";

// === Model Parameters (CLIP ViT-B/32) ===
pub const INPUT_SIZE: u32 = 224;
pub const EMBEDDING_DIM: usize = 512;
pub const PIXEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const PIXEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];
/// Intra-op threads per inference session; image decoding runs on rayon alongside.
pub const INFERENCE_THREADS: usize = 4;

// === Inputs ===
/// Matched case-sensitively against the file extension.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "JPG", "JPEG"];

// === Batching ===
pub const CHUNK_SIZE: usize = 20;
pub const ENCODE_BATCH_SIZE: usize = 128;

// === Checkpoint ===
pub const CHECKPOINT_FILE: &str = ".checkpoint";
pub const CHECKPOINT_TEMP_SUFFIX: &str = ".temp";
pub const CHECKPOINT_TOMBSTONE_SUFFIX: &str = ".del";

// === Remote Index ===
pub const INDEX_ENDPOINT: &str = "/v1/index";
pub const UPLOAD_TIMEOUT_SECS: u64 = 30;

pub const MODELS_DIR_ENV: &str = "PHOTO_INDEXER_MODELS_DIR";

pub fn set_model_dir(path: PathBuf) {
	let _ = CUSTOM_MODEL_DIR.set(path);
}

/// Get models directory (--models flag, PHOTO_INDEXER_MODELS_DIR, or next to the executable)
pub fn models_dir() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_MODEL_DIR.get() {
		crate::ui::debug(&format!("Using custom model dir: {}", custom.display()));
		return Some(custom.clone());
	}

	if let Ok(env_path) = std::env::var(MODELS_DIR_ENV) {
		let path = PathBuf::from(&env_path);
		if path.is_dir() {
			crate::ui::debug(&format!("Using {}: {}", MODELS_DIR_ENV, env_path));
			return Some(path);
		}
	}

	if let Ok(exe) = std::env::current_exe() {
		if let Some(dir) = exe.parent() {
			let models = dir.join("models");
			if models.is_dir() {
				crate::ui::debug(&format!("Found models at: {}", models.display()));
				return Some(models);
			}
		}
	}

	None
}

pub fn get_vision_model_path() -> Option<PathBuf> {
	models_dir().map(|d| d.join(VISION_MODEL))
}

pub fn get_text_model_path() -> Option<PathBuf> {
	models_dir().map(|d| d.join(TEXT_MODEL))
}

pub fn get_tokenizer_path() -> Option<PathBuf> {
	models_dir().map(|d| d.join(TOKENIZER))
}

/// Joins a base URL and the index endpoint, ignoring trailing slashes on the base.
pub fn index_url(base_url: &str) -> String {
	format!("{}{}", base_url.trim_end_matches('/'), INDEX_ENDPOINT)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn index_url_strips_trailing_slashes() {
		assert_eq!(index_url("http://localhost:8080"), "http://localhost:8080/v1/index");
		assert_eq!(index_url("http://localhost:8080//"), "http://localhost:8080/v1/index");
	}
}
