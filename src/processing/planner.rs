//! Splits unindexed inputs into fixed-size chunks

use std::num::NonZeroUsize;

use crate::core::{CheckpointSet, InputId, InputSet};

/// Ordered group of inputs committed to the checkpoint together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
	index: usize,
	ids: Vec<InputId>,
}

impl Chunk {
	/// Zero-based position within the plan.
	pub fn index(&self) -> usize {
		self.index
	}

	pub fn ids(&self) -> &[InputId] {
		&self.ids
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}
}

/// Work for one run plus the counts it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
	pub found: usize,
	pub checkpointed: usize,
	pub chunks: Vec<Chunk>,
}

impl Plan {
	pub fn remaining(&self) -> usize {
		self.chunks.iter().map(Chunk::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}
}

/// `all - checkpointed`, split into chunks of at most `chunk_size` ids in
/// set order. Identical inputs always give identical chunks. An empty
/// remainder gives no chunks.
pub fn plan(all: &InputSet, checkpointed: &CheckpointSet, chunk_size: NonZeroUsize) -> Vec<Chunk> {
	let remaining: Vec<InputId> = all.difference(checkpointed).cloned().collect();

	remaining
		.chunks(chunk_size.get())
		.enumerate()
		.map(|(index, ids)| Chunk { index, ids: ids.to_vec() })
		.collect()
}

/// Same as [`plan`], keeping the input counts for progress reporting.
pub fn plan_run(all: &InputSet, checkpointed: &CheckpointSet, chunk_size: NonZeroUsize) -> Plan {
	Plan {
		found: all.len(),
		checkpointed: checkpointed.len(),
		chunks: plan(all, checkpointed, chunk_size),
	}
}
