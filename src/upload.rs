//! Delivery of embedded photos to the remote index service.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;

use crate::config;
use crate::core::UploadItem;
use crate::error::UploadError;

/// Destination for upload items.
pub trait IndexSink {
	/// Delivers one item. Anything other than acceptance is an error.
	fn send(&self, item: &UploadItem) -> std::result::Result<(), UploadError>;

	/// Delivers `items` in order and stops at the first failure. Items sent
	/// before the failure stay delivered; the caller decides what that means.
	fn upload(&self, items: &[UploadItem]) -> std::result::Result<(), UploadError> {
		items.iter().try_for_each(|item| self.send(item))
	}
}

/// Blocking client for `POST <base>/v1/index`, one item per request.
#[derive(Clone)]
pub struct HttpUploader {
	client: Client,
	endpoint: String,
}

impl HttpUploader {
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
		anyhow::ensure!(
			base_url.starts_with("http://") || base_url.starts_with("https://"),
			"index service URL must be an http(s) URL, got '{}'",
			base_url
		);
		let mut headers = reqwest::header::HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		let client = Client::builder()
			.timeout(timeout)
			.default_headers(headers)
			.build()
			.context("failed to build index HTTP client")?;

		Ok(Self { client, endpoint: config::index_url(base_url) })
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

impl IndexSink for HttpUploader {
	fn send(&self, item: &UploadItem) -> std::result::Result<(), UploadError> {
		let request = IndexRequest { items: std::slice::from_ref(item) };
		let response = self
			.client
			.post(&self.endpoint)
			.json(&request)
			.send()
			.map_err(|source| UploadError::Transport { path: item.id().clone(), source })?;

		let status = response.status();
		if status != StatusCode::OK {
			return Err(UploadError::Rejected { path: item.id().clone(), status: status.as_u16() });
		}
		crate::ui::debug(&format!("Uploaded {}", item.id()));
		Ok(())
	}
}

#[derive(Serialize)]
struct IndexRequest<'a> {
	items: &'a [UploadItem],
}
