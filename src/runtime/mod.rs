//! ONNX Runtime sessions for the embedding models

pub mod providers;

pub use providers::{create_session, set_provider, Provider};
