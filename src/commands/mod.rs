//! # Command Implementations
//!
//! Each submodule handles one CLI command.

pub mod forget;
pub mod index;
pub mod query;
pub mod status;
