//! # Photo Indexer Library
//!
//! Resumable embedding of a photo collection into a remote vector index.
//! Photos are discovered, planned into chunks against a checkpoint,
//! embedded, uploaded, and only then checkpointed.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod indexer;
pub mod models;
pub mod processing;
pub mod runtime;
pub mod storage;
pub mod ui;
pub mod upload;
