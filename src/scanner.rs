/*!
 * Freshness probing of server directory trees
 */

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::error::Result;

/// Latest modification time of any entry under `root`, the root included.
///
/// Directories count as well as files, at any depth. The result keeps full
/// precision; callers floor it before comparing against archive names.
pub fn latest_modification_time(root: &Path) -> Result<DateTime<Utc>> {
    let latest = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .try_fold(None, |latest: Option<DateTime<Utc>>, entry| -> Result<_> {
            let entry = entry.map_err(io::Error::from)?;
            let modified: DateTime<Utc> = entry
                .metadata()
                .map_err(io::Error::from)?
                .modified()?
                .into();
            Ok(Some(latest.map_or(modified, |seen| seen.max(modified))))
        })?;

    latest.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("No entries found under {}", root.display()),
        )
        .into()
    })
}
