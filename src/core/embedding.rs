//! Normalized embedding vectors

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	/// Create normalized embedding from raw model output
	pub fn new(data: Vec<f32>) -> Self {
		Self(normalize(&data))
	}

	/// Wrap a vector as-is
	pub fn raw(data: Vec<f32>) -> Self {
		Self(data)
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn into_vec(self) -> Vec<f32> {
		self.0
	}
}

fn normalize(v: &[f32]) -> Vec<f32> {
	let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm > 0.0 {
		v.iter().map(|x| x / norm).collect()
	} else {
		v.to_vec()
	}
}
