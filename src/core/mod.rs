//! Core domain types

pub mod embedding;
pub mod input;
pub mod metadata;

pub use embedding::Embedding;
pub use input::{CheckpointSet, InputId, InputSet};
pub use metadata::{Metadata, RawTag, RawTags, TagValue, UploadItem};
