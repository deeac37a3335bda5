//! Query command - print a text query embedding

use anyhow::Result;
use serde::Serialize;

use crate::models::{TextEmbedder, TextModel};

#[derive(Serialize)]
struct QueryEmbedding<'a> {
	v: &'a [f32],
}

pub fn run(query: &str) -> Result<()> {
	let query = query.trim();
	anyhow::ensure!(!query.is_empty(), "The query must not be empty.");

	let mut model = TextModel::from_config()?;
	let embedding = model.embed_text(query)?;

	println!("{}", serde_json::to_string(&QueryEmbedding { v: embedding.as_slice() })?);
	Ok(())
}
