/*!
 * Core types for server and backup directories
 */

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::scanner::latest_modification_time;
use crate::selector::latest_backup_file_for;
use crate::staleness::is_backup_required;
use crate::timestamp::ArchiveName;

/// A directory whose contents are backed up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDir {
    /// Directory name, also used as the archive label
    pub name: String,
    /// Absolute or configured path
    pub path: PathBuf,
}

impl ServerDir {
    /// Create a server handle from its directory path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self { name, path }
    }

    /// Backup directory paired with this server under `backups_root`
    pub fn backup_dir(&self, backups_root: &Path) -> BackupDir {
        BackupDir {
            name: self.name.clone(),
            path: backups_root.join(&self.name),
        }
    }

    /// Latest modification time anywhere in the server tree
    pub fn freshness(&self) -> Result<DateTime<Utc>> {
        latest_modification_time(&self.path)
    }
}

/// A directory holding the timestamped archives of one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDir {
    /// Same base name as the server
    pub name: String,
    /// Location under the backups root
    pub path: PathBuf,
}

impl BackupDir {
    /// Whether the directory has been created yet
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Latest archive belonging to this server, if any
    pub fn latest_archive(&self) -> Result<Option<ArchiveFile>> {
        if !self.exists() {
            return Ok(None);
        }
        latest_backup_file_for(&self.path, &self.name)
    }
}

/// An archive file found in a backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// Full path to the archive
    pub path: PathBuf,
    /// Parsed label and timestamp
    pub name: ArchiveName,
}

impl ArchiveFile {
    /// Embedded UTC timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.name.timestamp
    }

    /// File name component of the path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// A server paired with its backup directory and both timestamps
#[derive(Debug, Clone)]
pub struct BackupRecord {
    /// Server being considered
    pub server: ServerDir,
    /// Its designated backup directory
    pub backup: BackupDir,
    /// Server freshness at full precision
    pub freshness: DateTime<Utc>,
    /// Latest archive, `None` when no backup exists yet
    pub latest: Option<ArchiveFile>,
}

impl BackupRecord {
    /// Probe `server` and look up its latest archive under `backups_root`
    pub fn probe(server: ServerDir, backups_root: &Path) -> Result<Self> {
        let backup = server.backup_dir(backups_root);
        let freshness = server.freshness()?;
        let latest = backup.latest_archive()?;

        Ok(Self {
            server,
            backup,
            freshness,
            latest,
        })
    }

    /// Timestamp of the latest archive
    pub fn latest_backup_time(&self) -> Option<DateTime<Utc>> {
        self.latest.as_ref().map(ArchiveFile::timestamp)
    }

    /// Whether the server changed since its latest archive
    pub fn is_backup_required(&self) -> bool {
        is_backup_required(self.freshness, self.latest_backup_time())
    }
}
