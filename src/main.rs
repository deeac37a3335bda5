//! photo-indexer - resumable photo embedding indexer
//!
//! Embeds new photos with a local CLIP model and uploads them to a remote
//! index service, checkpointing each chunk once it is fully uploaded.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::num::NonZeroUsize;
use std::time::Duration;

use photo_indexer::cli::{Cli, Command};
use photo_indexer::commands::{self, index::IndexOptions};
use photo_indexer::{config, runtime, ui};

fn main() -> Result<()> {
	let cli = Cli::parse();

	ui::Log::set_verbose(cli.verbose);
	runtime::set_provider(cli.provider);
	if let Some(dir) = cli.models {
		config::set_model_dir(dir);
	}

	match cli.command {
		Command::Index { root, base_url, checkpoint, chunk_size, batch_size, timeout_secs } => {
			print_header();
			commands::index::run(IndexOptions {
				root: &root,
				base_url: &base_url,
				checkpoint: &checkpoint,
				chunk_size: non_zero(chunk_size),
				batch_size,
				timeout: Duration::from_secs(timeout_secs),
			})
		}
		Command::Status { root, checkpoint, chunk_size } => {
			print_header();
			commands::status::run(&root, &checkpoint, non_zero(chunk_size))
		}
		Command::Forget { paths, checkpoint } => commands::forget::run(&paths, &checkpoint),
		Command::Query { query } => commands::query::run(&query),
	}
}

/// Flags are validated as positive by the parser.
fn non_zero(n: usize) -> NonZeroUsize {
	NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

fn print_header() {
	println!();
	println!(
		"{}",
		format!("─── photo-indexer v{} ───", env!("CARGO_PKG_VERSION"))
			.bright_blue()
			.bold()
	);
}
