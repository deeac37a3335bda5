//! Unified logging system

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub struct Log;

impl Log {
	pub fn set_verbose(enabled: bool) {
		VERBOSE.store(enabled, Ordering::Relaxed);
	}

	pub fn is_verbose() -> bool {
		VERBOSE.load(Ordering::Relaxed)
	}
}

pub fn info(msg: &str) {
	println!("{} {}", "ℹ".bright_blue().bold(), msg.bright_white());
}

pub fn success(msg: &str) {
	println!("{} {}", "✓".bright_green().bold(), msg.bright_white());
}

pub fn warn(msg: &str) {
	println!("{} {}", "⚠".bright_yellow().bold(), msg.bright_white());
}

pub fn error(msg: &str) {
	eprintln!("{} {}", "✗".bright_red().bold(), msg.bright_white());
}

pub fn debug(msg: &str) {
	if Log::is_verbose() {
		println!("{} {}", "⚙".bright_black().bold(), msg.dimmed());
	}
}

pub fn header(text: &str) {
	println!("\n{}", text.bright_blue().bold());
}

/// Prints the end-of-run statistics.
pub fn summary(indexed: usize, checkpointed_chunks: usize, failed_chunks: usize, duration_secs: f32) {
	header("─── Summary ───");

	println!("  {} {}", "Indexed:".bright_blue(), indexed);
	println!("  {} {}", "Chunks:".bright_blue(), checkpointed_chunks);
	if failed_chunks > 0 {
		println!("  {} {}", "Failed chunks:".red(), failed_chunks);
	}

	println!("  {} {:.2}s", "Duration:".bright_blue(), duration_secs);
	if indexed > 0 {
		let avg_ms = (duration_secs * 1000.0) / indexed as f32;
		println!("  {} {:.0}ms/photo", "Average:".bright_blue(), avg_ms);
	}
	println!();
}
