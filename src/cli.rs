use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::config;

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Provider {
	/// First available of TensorRT, CUDA, XNNPACK (CoreML, XNNPACK on macOS), else CPU
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU
	Cuda,
	/// NVIDIA TensorRT (optimized inference)
	Tensorrt,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK CPU acceleration
	Xnnpack,
}

fn parse_positive(s: &str) -> Result<usize, String> {
	let val: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if val == 0 {
		Err("value must be at least 1".to_string())
	} else {
		Ok(val)
	}
}

fn parse_positive_secs(s: &str) -> Result<u64, String> {
	parse_positive(s).map(|secs| secs as u64)
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.usage(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.literal(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.placeholder(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
		.valid(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

#[derive(Parser, Debug)]
#[command(
	name = "photo-indexer",
	author,
	version,
	about = "Resumable photo embedding indexer",
	styles = styles(),
	after_help = format!(
		"{title}
  {bin} {index}   {index_args}   {index_desc}
  {bin} {status}  {status_args}                         {status_desc}
  {bin} {forget}  {forget_args}          {forget_desc}
  {bin} {query}   {query_args}                 {query_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "photo-indexer".bright_blue(),
		index = "index".yellow(),
		index_args = "./photos http://localhost:8081",
		index_desc = "Embed and upload new photos".dimmed(),
		status = "status".yellow(),
		status_args = "./photos",
		status_desc = "Show what is left to index".dimmed(),
		forget = "forget".yellow(),
		forget_args = "2021/IMG_0001.jpg",
		forget_desc = "Re-index a photo next run".dimmed(),
		query = "query".yellow(),
		query_args = "\"a red car\"",
		query_desc = "Print a query embedding".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, tensorrt, coreml, xnnpack
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	/// Directory holding the ONNX models and tokenizer
	#[arg(short = 'm', long = "models", global = true, value_name = "DIR")]
	pub models: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Embed unindexed photos and upload them to the index service
	Index {
		/// Root directory of the photo collection
		#[arg(value_name = "PHOTOS")]
		root: PathBuf,

		/// Base URL of the index service
		#[arg(value_name = "BASE_URL")]
		base_url: String,

		/// Checkpoint file recording indexed photos
		#[arg(short = 'c', long = "checkpoint", default_value = config::CHECKPOINT_FILE)]
		checkpoint: PathBuf,

		/// Photos committed to the checkpoint together
		#[arg(long = "chunk-size", default_value_t = config::CHUNK_SIZE, value_parser = parse_positive)]
		chunk_size: usize,

		/// Images per model invocation
		#[arg(long = "batch-size", default_value_t = config::ENCODE_BATCH_SIZE, value_parser = parse_positive)]
		batch_size: usize,

		/// Per-request timeout in seconds
		#[arg(long = "timeout", default_value_t = config::UPLOAD_TIMEOUT_SECS, value_parser = parse_positive_secs)]
		timeout_secs: u64,
	},

	/// Show how many photos are indexed and how many remain
	Status {
		/// Root directory of the photo collection
		#[arg(value_name = "PHOTOS")]
		root: PathBuf,

		/// Checkpoint file recording indexed photos
		#[arg(short = 'c', long = "checkpoint", default_value = config::CHECKPOINT_FILE)]
		checkpoint: PathBuf,

		/// Photos per chunk used for the chunk count
		#[arg(long = "chunk-size", default_value_t = config::CHUNK_SIZE, value_parser = parse_positive)]
		chunk_size: usize,
	},

	/// Mark photos as not indexed so the next run picks them up again
	Forget {
		/// Photo paths relative to the collection root
		#[arg(value_name = "PATH", required = true)]
		paths: Vec<String>,

		/// Checkpoint file recording indexed photos
		#[arg(short = 'c', long = "checkpoint", default_value = config::CHECKPOINT_FILE)]
		checkpoint: PathBuf,
	},

	/// Embed a text query and print the vector as JSON
	Query {
		/// Search text
		#[arg(value_name = "QUERY")]
		query: String,
	},
}
