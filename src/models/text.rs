//! Text model (CLIP) for query embeddings

use anyhow::{Context, Result};
use ort::session::Session;
use std::path::Path;
use tokenizers::Tokenizer;

use super::{split_batch, TextEmbedder};
use crate::config;
use crate::core::Embedding;

pub struct TextModel {
    session: Session,
    tokenizer: Tokenizer,
}

impl TextModel {
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("Text model file does not exist: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file does not exist: {}", tokenizer_path.display());
        }

        let session = crate::runtime::create_session(model_path)
            .context("Failed to load text model")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        Ok(Self { session, tokenizer })
    }

    pub fn from_config() -> Result<Self> {
        let model_path = config::get_text_model_path().context(format!(
            "Text model not found. Ensure {} exists",
            config::TEXT_MODEL
        ))?;
        let tokenizer_path = config::get_tokenizer_path().context(format!(
            "Tokenizer not found. Ensure {} exists",
            config::TOKENIZER
        ))?;
        crate::ui::debug(&format!("Loading text model: {}", model_path.display()));
        Self::load(&model_path, &tokenizer_path)
    }
}

impl TextEmbedder for TextModel {
    fn embed_text(&mut self, text: &str) -> Result<Embedding> {
        let encoding = self.tokenizer.encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let shape = vec![1, input_ids.len()];
        let input = ort::value::Value::from_array((shape, input_ids))?;

        let outputs = self.session.run(ort::inputs!["input_ids" => input])?;
        let output = outputs.get("text_embeds")
            .or_else(|| outputs.get("pooler_output"))
            .context("No text_embeds or pooler_output found")?;

        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

        let vector = split_batch(data, &dims, 1)?
            .pop()
            .context("Text model returned an empty batch")?;
        Ok(Embedding::new(vector))
    }
}
