//! Execution provider selection
//!
//! The vision and text models share one provider choice, made once from
//! `--provider`. `auto` walks the accelerated backends in preference order
//! and keeps the first that registers. An explicit choice whose backend is
//! missing logs an error and runs on CPU, so indexing never stops for lack
//! of a GPU.

use anyhow::{Context, Result};
use ort::ep::ExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::config::INFERENCE_THREADS;
use crate::ui;

pub use crate::cli::Provider;

static SELECTED_PROVIDER: OnceLock<Provider> = OnceLock::new();
static BACKEND_LOGGED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
	TensorRt,
	Cuda,
	CoreMl,
	Xnnpack,
}

impl Backend {
	fn name(self) -> &'static str {
		match self {
			Self::TensorRt => "TensorRT",
			Self::Cuda => "CUDA",
			Self::CoreMl => "CoreML",
			Self::Xnnpack => "XNNPACK",
		}
	}
}

#[cfg(target_os = "macos")]
const AUTO_ORDER: &[Backend] = &[Backend::CoreMl, Backend::Xnnpack];

#[cfg(not(target_os = "macos"))]
const AUTO_ORDER: &[Backend] = &[Backend::TensorRt, Backend::Cuda, Backend::Xnnpack];

/// Selects the execution provider for every session created afterwards.
/// Only the first call has an effect.
pub fn set_provider(p: Provider) {
	let _ = SELECTED_PROVIDER.set(p);
}

fn selected() -> Provider {
	SELECTED_PROVIDER.get().copied().unwrap_or_default()
}

/// Backends to try for `provider`, best first. Empty means CPU only.
fn candidates(provider: Provider) -> &'static [Backend] {
	match provider {
		Provider::Auto => AUTO_ORDER,
		Provider::Cpu => &[],
		Provider::Cuda => &[Backend::Cuda],
		Provider::Tensorrt => &[Backend::TensorRt],
		Provider::Coreml => &[Backend::CoreMl],
		Provider::Xnnpack => &[Backend::Xnnpack],
	}
}

/// Builds an inference session for `model_path` on the selected provider.
pub fn create_session(model_path: &Path) -> Result<Session> {
	let mut builder = Session::builder().context("Failed to create session builder")?;
	let provider = selected();

	match candidates(provider).iter().copied().find(|b| attach(&mut builder, *b)) {
		Some(backend) => log_backend(|| ui::success(&format!("Using {} execution provider", backend.name()))),
		None if matches!(provider, Provider::Auto | Provider::Cpu) => {
			log_backend(|| ui::info("Using CPU execution provider"))
		}
		None => ui::error(&format!("{:?} requested but unavailable, falling back to CPU", provider)),
	}

	builder
		.with_optimization_level(GraphOptimizationLevel::Level3)?
		.with_intra_threads(INFERENCE_THREADS)?
		.commit_from_file(model_path)
		.with_context(|| format!("Failed to load model {}", model_path.display()))
}

fn log_backend(log: impl FnOnce()) {
	if !BACKEND_LOGGED.swap(true, Ordering::Relaxed) {
		log();
	}
}

fn attach(builder: &mut SessionBuilder, backend: Backend) -> bool {
	let result = match backend {
		Backend::TensorRt => register::<ort::ep::TensorRT>(builder),
		Backend::Cuda => register::<ort::ep::CUDA>(builder),
		#[cfg(target_os = "macos")]
		Backend::CoreMl => register::<ort::ep::CoreML>(builder),
		#[cfg(not(target_os = "macos"))]
		Backend::CoreMl => Err("only available on macOS".to_string()),
		Backend::Xnnpack => register::<ort::ep::XNNPACK>(builder),
	};

	match result {
		Ok(()) => true,
		Err(reason) => {
			ui::debug(&format!("{} not used: {}", backend.name(), reason));
			false
		}
	}
}

fn register<E: ExecutionProvider + Default>(builder: &mut SessionBuilder) -> std::result::Result<(), String> {
	let provider = E::default();
	if !provider.is_available().unwrap_or(false) {
		return Err("not available in this build or on this machine".to_string());
	}
	provider.register(builder).map(|_| ()).map_err(|e| e.to_string())
}
