//! Photo discovery, planning, metadata and embedding

pub mod enumerate;
pub mod exif;
pub mod image;
pub mod metadata;
pub mod pipeline;
pub mod planner;

pub use enumerate::enumerate_inputs;
pub use pipeline::EmbeddingPipeline;
pub use planner::{plan, Chunk, Plan};
