//! Raw EXIF tag reading

use nom_exif::{EntryValue, ExifIter, ExifTag, MediaParser, MediaSource};
use std::path::Path;

use crate::core::{RawTag, RawTags};
use crate::error::MetadataWarning;

const EXIF_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Message nom-exif reports for an image without an EXIF segment.
const EXIF_NOT_FOUND: &str = "Exif not found";

/// Reads every named EXIF tag in the file. Files without EXIF give an empty
/// map. When a tag repeats across IFDs the first occurrence is kept.
pub fn read_tags(path: &Path) -> Result<RawTags, MetadataWarning> {
	let source = MediaSource::file_path(path).map_err(|e| MetadataWarning::Unreadable {
		path: path.to_path_buf(),
		reason: e.to_string(),
	})?;

	if !source.has_exif() {
		crate::ui::debug(&format!("No EXIF data: {}", path.display()));
		return Ok(RawTags::new());
	}

	let mut parser = MediaParser::new();
	let iter: ExifIter = match parser.parse(source) {
		Ok(iter) => iter,
		Err(nom_exif::Error::ParseFailed(e)) if e.to_string() == EXIF_NOT_FOUND => {
			crate::ui::debug(&format!("No EXIF data: {}", path.display()));
			return Ok(RawTags::new());
		}
		Err(e) => {
			return Err(MetadataWarning::Parse { path: path.to_path_buf(), reason: e.to_string() });
		}
	};

	let mut tags = RawTags::new();
	for entry in iter {
		if let (Some(tag), Ok(value)) = (entry.tag(), entry.get_result()) {
			insert_first(&mut tags, tag, value);
		}
	}

	Ok(tags)
}

fn insert_first(tags: &mut RawTags, tag: ExifTag, value: &EntryValue) {
	if let Some(raw) = convert(value) {
		tags.entry(tag_name(tag)).or_insert(raw);
	}
}

/// EXIF name for a tag; 0x0132 is `DateTime` in the EXIF standard.
fn tag_name(tag: ExifTag) -> String {
	match tag {
		ExifTag::ModifyDate => "DateTime".to_string(),
		other => other.to_string(),
	}
}

fn convert(value: &EntryValue) -> Option<RawTag> {
	let raw = match value {
		EntryValue::Text(text) => {
			let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
			if text.is_empty() {
				return None;
			}
			RawTag::Text(text.to_string())
		}
		EntryValue::URational(r) => urational(r.0, r.1),
		EntryValue::IRational(r) => irational(r.0, r.1),
		EntryValue::U8(u) => RawTag::UInt(*u as u64),
		EntryValue::U16(u) => RawTag::UInt(*u as u64),
		EntryValue::U32(u) => RawTag::UInt(*u as u64),
		EntryValue::U64(u) => RawTag::UInt(*u),
		EntryValue::I8(i) => RawTag::Int(*i as i64),
		EntryValue::I16(i) => RawTag::Int(*i as i64),
		EntryValue::I32(i) => RawTag::Int(*i as i64),
		EntryValue::I64(i) => RawTag::Int(*i),
		EntryValue::F32(f) => RawTag::Float(*f as f64),
		EntryValue::F64(f) => RawTag::Float(*f),
		EntryValue::Time(t) => RawTag::Text(t.naive_local().format(EXIF_TIME_FORMAT).to_string()),
		EntryValue::NaiveDateTime(t) => RawTag::Text(t.format(EXIF_TIME_FORMAT).to_string()),
		EntryValue::Undefined(bytes) => RawTag::Bytes(bytes.clone()),
		EntryValue::U8Array(values) => RawTag::List(values.iter().map(|u| RawTag::UInt(*u as u64)).collect()),
		EntryValue::U16Array(values) => RawTag::List(values.iter().map(|u| RawTag::UInt(*u as u64)).collect()),
		EntryValue::U32Array(values) => RawTag::List(values.iter().map(|u| RawTag::UInt(*u as u64)).collect()),
		EntryValue::URationalArray(values) => RawTag::List(values.iter().map(|r| urational(r.0, r.1)).collect()),
		EntryValue::IRationalArray(values) => RawTag::List(values.iter().map(|r| irational(r.0, r.1)).collect()),
		#[allow(unreachable_patterns)]
		_ => return None,
	};
	Some(raw)
}

fn urational(numerator: u32, denominator: u32) -> RawTag {
	RawTag::Rational { numerator: numerator as i64, denominator: denominator as i64 }
}

fn irational(numerator: i32, denominator: i32) -> RawTag {
	RawTag::Rational { numerator: numerator as i64, denominator: denominator as i64 }
}

/// Writes a small JPEG carrying an EXIF segment with `Make = "Canon"`,
/// `XResolution = 72/1` and `DateTime` (tag 0x0132) set to `date_time`.
#[cfg(test)]
pub(crate) fn write_jpeg_with_exif(path: &Path, date_time: &str) {
	image::RgbImage::new(4, 4).save(path).unwrap();
	let jpeg = std::fs::read(path).unwrap();
	assert_eq!(&jpeg[..2], &[0xff, 0xd8]);

	// Little-endian TIFF: header, IFD0 with three entries, then value data
	const IFD0: u32 = 8;
	const ENTRIES: u16 = 3;
	let data_start = IFD0 + 2 + ENTRIES as u32 * 12 + 4;
	let make = b"Canon\0";
	let mut date = date_time.as_bytes().to_vec();
	date.push(0);
	let make_at = data_start;
	let xres_at = make_at + make.len() as u32;
	let date_at = xres_at + 8;

	let mut tiff = Vec::new();
	tiff.extend_from_slice(b"II");
	tiff.extend_from_slice(&42u16.to_le_bytes());
	tiff.extend_from_slice(&IFD0.to_le_bytes());
	tiff.extend_from_slice(&ENTRIES.to_le_bytes());
	for (tag, format, count, offset) in [
		(0x010fu16, 2u16, make.len() as u32, make_at),
		(0x011a, 5, 1, xres_at),
		(0x0132, 2, date.len() as u32, date_at),
	] {
		tiff.extend_from_slice(&tag.to_le_bytes());
		tiff.extend_from_slice(&format.to_le_bytes());
		tiff.extend_from_slice(&count.to_le_bytes());
		tiff.extend_from_slice(&offset.to_le_bytes());
	}
	tiff.extend_from_slice(&0u32.to_le_bytes());
	tiff.extend_from_slice(make);
	tiff.extend_from_slice(&72u32.to_le_bytes());
	tiff.extend_from_slice(&1u32.to_le_bytes());
	tiff.extend_from_slice(&date);

	let mut out = jpeg[..2].to_vec();
	out.extend_from_slice(&[0xff, 0xe1]);
	out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
	out.extend_from_slice(b"Exif\0\0");
	out.extend_from_slice(&tiff);
	out.extend_from_slice(&jpeg[2..]);
	std::fs::write(path, out).unwrap();
}
