//! Error types for indexing runs.
//!
//! `IndexError` aborts the whole run. `ChunkError` aborts one chunk and the
//! run moves on. `MetadataWarning` is only ever logged.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::InputId;

#[derive(Error, Debug)]
pub enum IndexError {
	#[error("cannot read photo root {}: {source}", path.display())]
	Filesystem {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("checkpoint {} is corrupt: {reason}", path.display())]
	CorruptCheckpoint { path: PathBuf, reason: String },

	#[error("failed to write checkpoint {}: {source}", path.display())]
	CheckpointWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

#[derive(Error, Debug)]
pub enum ChunkError {
	#[error("cannot decode {id}: {reason}")]
	Decode { id: InputId, reason: String },

	#[error("embedding failed: {0}")]
	Embedding(String),

	#[error(transparent)]
	Upload(#[from] UploadError),
}

#[derive(Error, Debug)]
pub enum UploadError {
	#[error("index service answered {status} for {path}")]
	Rejected { path: InputId, status: u16 },

	#[error("request for {path} failed: {source}")]
	Transport {
		path: InputId,
		#[source]
		source: reqwest::Error,
	},
}

impl UploadError {
	pub fn path(&self) -> &InputId {
		match self {
			Self::Rejected { path, .. } | Self::Transport { path, .. } => path,
		}
	}
}

#[derive(Error, Debug)]
pub enum MetadataWarning {
	#[error("cannot open {} for EXIF: {reason}", path.display())]
	Unreadable { path: PathBuf, reason: String },

	#[error("cannot parse EXIF in {}: {reason}", path.display())]
	Parse { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, IndexError>;
