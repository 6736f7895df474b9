/*!
 * Discovery of server directories and their backup state
 */

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{BackupError, Result};
use crate::types::{BackupRecord, ServerDir};

/// Every server paired with its backup directory, sorted by server name
#[derive(Debug, Clone, Default)]
pub struct BackupPlan {
    /// One record per server directory
    pub records: Vec<BackupRecord>,
}

impl BackupPlan {
    /// Records whose server changed since the latest archive
    pub fn pending(&self) -> impl Iterator<Item = &BackupRecord> {
        self.records.iter().filter(|record| record.is_backup_required())
    }

    /// Names of the servers needing a backup
    pub fn pending_names(&self) -> Vec<&str> {
        self.pending().map(|record| record.server.name.as_str()).collect()
    }
}

/// Marker written and removed again to check the backups root is writable
const WRITE_CHECK_FILE: &str = ".backutil-write-check";

/// Create the backups root if needed and check that it is writable.
///
/// Writability is tested by creating and removing a marker file, so
/// ownership and ACLs are taken into account.
///
/// Returns true when the directory was created.
pub fn prepare_backups_root(dir: &Path) -> Result<bool> {
    let created = if dir.is_dir() {
        false
    } else {
        fs::create_dir_all(dir)?;
        true
    };

    let marker = dir.join(WRITE_CHECK_FILE);
    match OpenOptions::new().write(true).create_new(true).open(&marker) {
        Ok(_) => fs::remove_file(&marker)?,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(BackupError::PermissionDenied(format!(
                "The backups directory {} cannot be written to",
                dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(created)
}

/// Immediate subdirectories of `servers_dir`, sorted by name
pub fn discover_servers(servers_dir: &Path) -> Result<Vec<ServerDir>> {
    crate::ensure!(
        servers_dir.is_dir(),
        PathNotFound,
        "The servers directory {} does not exist",
        servers_dir.display()
    );

    let mut servers = Vec::new();
    for entry in fs::read_dir(servers_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            servers.push(ServerDir::new(entry.path()));
        }
    }
    servers.sort_by(|a, b| a.name.cmp(&b.name));

    crate::ensure!(
        !servers.is_empty(),
        Config,
        "The servers directory {} does not contain any server folders",
        servers_dir.display()
    );

    Ok(servers)
}

/// Probe every server and look up its latest archive
pub fn build_plan(config: &Config) -> Result<BackupPlan> {
    debug!("Servers directory: {}", config.servers_dir.display());
    debug!("Backups directory: {}", config.backups_dir.display());

    if config.dry_run {
        debug!("Dry run, leaving the backups directory untouched");
    } else if prepare_backups_root(&config.backups_dir)? {
        info!(
            "Backups folder \"{}\" created successfully.",
            config.backups_dir.display()
        );
    }

    let records = discover_servers(&config.servers_dir)?
        .into_iter()
        .map(|server| -> Result<BackupRecord> {
            let record = BackupRecord::probe(server, &config.backups_dir)?;
            debug!(
                server = %record.server.name,
                freshness = %record.freshness,
                latest = ?record.latest.as_ref().map(|archive| archive.file_name()),
                "Probed server"
            );
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BackupPlan { records })
}
