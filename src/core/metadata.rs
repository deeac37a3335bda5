//! Photo metadata and upload payloads

use serde::Serialize;
use std::collections::BTreeMap;

use super::{Embedding, InputId};

/// A tag value as read from the file, before sanitization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTag {
	Text(String),
	Int(i64),
	UInt(u64),
	Float(f64),
	Rational { numerator: i64, denominator: i64 },
	Bytes(Vec<u8>),
	List(Vec<RawTag>),
}

/// Tag name to raw value, keyed by EXIF tag name.
pub type RawTags = BTreeMap<String, RawTag>;

/// A tag value that serializes to plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
	Null,
	Int(i64),
	UInt(u64),
	Float(f64),
	Text(String),
	List(Vec<TagValue>),
}

/// Per-photo payload sent alongside the vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
	pub path: InputId,
	pub exif: BTreeMap<String, TagValue>,
	/// Capture time in seconds since the Unix epoch, UTC.
	pub timestamp: Option<i64>,
}

impl Metadata {
	/// Metadata with no tags and no timestamp.
	pub fn empty(path: InputId) -> Self {
		Self { path, exif: BTreeMap::new(), timestamp: None }
	}
}

/// One unit sent to the index service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadItem {
	#[serde(rename = "p")]
	pub metadata: Metadata,
	#[serde(rename = "v")]
	pub vector: Vec<f32>,
}

impl UploadItem {
	pub fn new(metadata: Metadata, embedding: Embedding) -> Self {
		Self { metadata, vector: embedding.into_vec() }
	}

	pub fn id(&self) -> &InputId {
		&self.metadata.path
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn upload_item_uses_wire_keys() {
		let mut metadata = Metadata::empty(InputId::from("2021/a.jpg"));
		metadata.exif.insert("Make".into(), TagValue::Text("Canon".into()));
		metadata.exif.insert("FNumber".into(), TagValue::Null);
		metadata.timestamp = Some(1_620_051_730);
		let item = UploadItem::new(metadata, Embedding::raw(vec![0.5, -0.25]));

		let value = serde_json::to_value(&item).unwrap();
		assert_eq!(
			value,
			json!({
				"p": {
					"path": "2021/a.jpg",
					"exif": { "FNumber": null, "Make": "Canon" },
					"timestamp": 1_620_051_730
				},
				"v": [0.5, -0.25]
			})
		);
	}

	#[test]
	fn missing_timestamp_serializes_as_null() {
		let item = UploadItem::new(Metadata::empty(InputId::from("a.jpg")), Embedding::raw(vec![]));
		let value = serde_json::to_value(&item).unwrap();
		assert!(value["p"]["timestamp"].is_null());
	}
}
