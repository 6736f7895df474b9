/*!
 * Second-granularity timestamps embedded in archive file names
 *
 * Archive names follow `<label>_YYYY-MM-DD_HH-mm-ss.<ext>` with the
 * timestamp in UTC. The label may contain anything, including `_` and `.`,
 * so parsing anchors on the end of the name.
 */

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::error::{BackupError, Result};

/// chrono format of the timestamp field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Width of the timestamp field in characters
pub const TIMESTAMP_LEN: usize = 19;

/// Extension used for archives created by this tool
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Truncate a timestamp to whole seconds (floor, never round)
pub fn floor_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}

/// Remove everything from the last `.` onwards, unless that dot leads the name
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Split an extension-less name into its prefix and the trailing timestamp field
fn split_timestamp_field(stem: &str) -> Option<(&str, &str)> {
    let (start, _) = stem.char_indices().rev().nth(TIMESTAMP_LEN - 1)?;
    Some(stem.split_at(start))
}

// Shape check for `dddd-dd-dd_dd-dd-dd`; chrono alone accepts signs and short fields.
fn has_timestamp_shape(field: &str) -> bool {
    const SHAPE: &[u8; TIMESTAMP_LEN] = b"dddd-dd-dd_dd-dd-dd";

    field.len() == TIMESTAMP_LEN
        && field
            .bytes()
            .zip(SHAPE.iter())
            .all(|(byte, expected)| match expected {
                b'd' => byte.is_ascii_digit(),
                sep => byte == *sep,
            })
}

/// Parse the UTC timestamp embedded in an archive file name
pub fn parse_timestamp(file_name: &str) -> Result<DateTime<Utc>> {
    ArchiveName::parse(file_name).map(|archive| archive.timestamp)
}

/// Build the file name of an archive for `label` at `time`
pub fn format_archive_name(label: &str, time: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        label,
        floor_to_second(time).format(TIMESTAMP_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// A parsed archive file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    /// Everything before the timestamp field, without the joining `_`
    pub label: String,
    /// Embedded timestamp
    pub timestamp: DateTime<Utc>,
}

impl ArchiveName {
    /// Parse `<label>_YYYY-MM-DD_HH-mm-ss[.ext]`
    pub fn parse(file_name: &str) -> Result<Self> {
        let stem = strip_extension(file_name);

        let (prefix, field) = split_timestamp_field(stem).ok_or_else(|| {
            BackupError::parse(
                file_name,
                format!("shorter than the {}-character timestamp", TIMESTAMP_LEN),
            )
        })?;

        if !has_timestamp_shape(field) {
            return Err(BackupError::parse(
                file_name,
                format!("\"{}\" does not match YYYY-MM-DD_HH-mm-ss", field),
            ));
        }

        let timestamp = NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT)
            .map_err(|e| BackupError::parse(file_name, e.to_string()))?
            .and_utc();

        Ok(Self {
            label: prefix.strip_suffix('_').unwrap_or(prefix).to_string(),
            timestamp,
        })
    }

    /// Whether `file_name` is exactly `<label>_<timestamp field>` once the extension is removed
    pub fn matches_label(file_name: &str, label: &str) -> bool {
        let stem = strip_extension(file_name);
        match stem.strip_prefix(label).and_then(|rest| rest.strip_prefix('_')) {
            Some(rest) => rest.chars().count() == TIMESTAMP_LEN,
            None => false,
        }
    }
}
