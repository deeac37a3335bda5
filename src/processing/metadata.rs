//! Capture time resolution and tag sanitization
//!
//! Timestamps come from the first parseable date tag, then from a date
//! embedded in the path (`IMG_20210503_142210.jpg`), else they are absent.
//! All times are read as UTC.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::core::{InputId, Metadata, RawTag, RawTags, TagValue};

/// Date tags consulted in order.
pub const TIMESTAMP_TAGS: &[&str] = &["DateTime", "DateTimeOriginal", "CreateDate"];

static TAG_TIME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(\d{4})\D(\d{2})\D(\d{2})\s+(\d{2}):(\d{2}):(\d{2})$").expect("valid tag time regex")
});

static NAME_TIME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?x)
		(?:^|[^0-9])
		(?<year>[12]\d{3})
			(?<date_sep1>[\-._:]?)
		(?<month>0[1-9]|1[0-2])
			(?<date_sep2>[\-._:]?)
		(?<day>[0-2]\d|3[01])
		[^0-9]+
		(?<time>
			(?<hour>[012]\d)
				(?<time_sep1>[\-._:]?)
			(?<minute>[0-5]\d)
				(?<time_sep2>[\-._:]?)
			(?<second>[0-5]\d)
		)?",
	)
	.expect("valid file name time regex")
});

/// Builds the metadata record for one input. Never fails: anything that
/// cannot be interpreted is dropped or left absent.
pub fn extract(id: &InputId, tags: &RawTags) -> Metadata {
	let timestamp = timestamp_from_tags(tags).or_else(|| timestamp_from_name(id.as_str()));
	let exif = tags.iter().map(|(name, value)| (name.clone(), sanitize(value))).collect();

	Metadata { path: id.clone(), exif, timestamp }
}

pub fn timestamp_from_tags(tags: &RawTags) -> Option<i64> {
	TIMESTAMP_TAGS.iter().find_map(|name| match tags.get(*name) {
		Some(RawTag::Text(text)) => parse_tag_time(text),
		_ => None,
	})
}

/// Parses `YYYY:MM:DD HH:MM:SS`, with any non-digit between date parts.
pub fn parse_tag_time(text: &str) -> Option<i64> {
	let caps = TAG_TIME.captures(text.trim())?;
	let num = |i: usize| caps[i].parse::<u32>().ok();

	let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, num(2)?, num(3)?)?;
	let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;
	Some(NaiveDateTime::new(date, time).and_utc().timestamp())
}

/// Finds a `YYYYMMDD[HHMMSS]` date inside a path. Separators are optional but
/// must repeat within the date and within the time. A missing or malformed
/// time means midnight.
pub fn timestamp_from_name(name: &str) -> Option<i64> {
	NAME_TIME.captures_iter(name).find_map(|caps| name_match_time(&caps))
}

fn name_match_time(caps: &Captures) -> Option<i64> {
	if caps["date_sep1"] != caps["date_sep2"] {
		return None;
	}

	let date = NaiveDate::from_ymd_opt(
		caps["year"].parse().ok()?,
		caps["month"].parse().ok()?,
		caps["day"].parse().ok()?,
	)?;

	let time = caps
		.name("time")
		.filter(|_| caps["time_sep1"] == caps["time_sep2"])
		.and_then(|_| {
			NaiveTime::from_hms_opt(
				caps["hour"].parse().ok()?,
				caps["minute"].parse().ok()?,
				caps["second"].parse().ok()?,
			)
		})
		.unwrap_or(NaiveTime::MIN);

	Some(NaiveDateTime::new(date, time).and_utc().timestamp())
}

/// Maps a raw tag onto a JSON-safe value.
///
/// Rationals with a zero denominator become `Null`, other rationals become
/// floats, bytes become lowercase hex.
pub fn sanitize(value: &RawTag) -> TagValue {
	match value {
		RawTag::Text(text) => TagValue::Text(text.clone()),
		RawTag::Int(i) => TagValue::Int(*i),
		RawTag::UInt(u) => TagValue::UInt(*u),
		RawTag::Float(f) => TagValue::Float(*f),
		RawTag::Rational { denominator: 0, .. } => TagValue::Null,
		RawTag::Rational { numerator, denominator } => TagValue::Float(*numerator as f64 / *denominator as f64),
		RawTag::Bytes(bytes) => TagValue::Text(to_hex(bytes)),
		RawTag::List(values) => TagValue::List(values.iter().map(sanitize).collect()),
	}
}

fn to_hex(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
