/*!
 * Selection of the latest archive in a backup directory
 *
 * Archives are ordered by the timestamp parsed from their names, never by
 * the raw file name, so labels of different lengths cannot skew the result.
 */

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::error::{BackupError, Result};
use crate::timestamp::ArchiveName;
use crate::types::ArchiveFile;

/// Every regular file directly inside `dir`, parsed as an archive.
///
/// With a `label`, files not named `<label>_<timestamp>` are skipped.
/// Without one, any file that does not parse is an error.
pub fn list_archives(dir: &Path, label: Option<&str>) -> Result<Vec<ArchiveFile>> {
    let mut archives = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) if label.is_none() => {
                return Err(BackupError::parse(
                    &raw.to_string_lossy(),
                    "file name is not valid UTF-8",
                ))
            }
            Err(_) => continue,
        };

        if let Some(label) = label {
            if !ArchiveName::matches_label(&file_name, label) {
                continue;
            }
        }

        archives.push(ArchiveFile {
            name: ArchiveName::parse(&file_name)?,
            path: entry.path(),
        });
    }

    Ok(archives)
}

fn chronological(a: &ArchiveFile, b: &ArchiveFile) -> Ordering {
    a.timestamp()
        .cmp(&b.timestamp())
        .then_with(|| a.path.cmp(&b.path))
}

fn newest(archives: Vec<ArchiveFile>) -> Option<ArchiveFile> {
    archives.into_iter().max_by(chronological)
}

/// Latest archive among all files in `dir`, `None` if it has no files
pub fn latest_backup_file(dir: &Path) -> Result<Option<ArchiveFile>> {
    Ok(newest(list_archives(dir, None)?))
}

/// Latest archive named `<label>_<timestamp>` in `dir`
pub fn latest_backup_file_for(dir: &Path, label: &str) -> Result<Option<ArchiveFile>> {
    Ok(newest(list_archives(dir, Some(label))?))
}

/// Like [`latest_backup_file`], but an empty directory is an error
pub fn require_latest_backup_file(dir: &Path) -> Result<ArchiveFile> {
    latest_backup_file(dir)?.ok_or_else(|| BackupError::EmptyDirectory(dir.to_path_buf()))
}

/// Archives of `label` in `dir`, oldest first
pub fn archives_oldest_first(dir: &Path, label: &str) -> Result<Vec<ArchiveFile>> {
    let mut archives = list_archives(dir, Some(label))?;
    archives.sort_by(chronological);
    Ok(archives)
}
