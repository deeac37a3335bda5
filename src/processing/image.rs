//! Image decoding for embedding

use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Opens and decodes a photo. Uses content-based format detection so
/// mislabeled files still decode.
pub fn decode(path: &Path) -> Result<DynamicImage, String> {
	crate::ui::debug(&format!("Decoding image: {}", path.display()));
	ImageReader::open(path)
		.map_err(|e| format!("open failed: {}", e))?
		.with_guessed_format()
		.map_err(|e| format!("format detection failed: {}", e))?
		.decode()
		.map_err(|e| format!("file may be corrupted or in an unsupported format: {}", e))
}
