/*!
 * Execution of a backup run
 */

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::archive::{prune_archives, Archiver};
use crate::config::Config;
use crate::error::Result;
use crate::plan::build_plan;
use crate::report::{Outcome, RunReport, ServerReport};
use crate::timestamp::floor_to_second;
use crate::types::BackupRecord;

/// Runs one batch: plan, archive stale servers, prune
pub struct Runner {
    /// Run configuration
    config: Config,
    /// Progress bar shared with the archiver
    progress: Arc<ProgressBar>,
}

impl Runner {
    /// Create a new runner
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        Self { config, progress }
    }

    /// Process every server once.
    ///
    /// Failures while probing abort the run; failures while archiving one
    /// server are recorded and the run continues.
    pub fn run(&self) -> Result<RunReport> {
        let start_time = Instant::now();
        let plan = build_plan(&self.config)?;

        let pending = plan.pending_names();
        if pending.is_empty() {
            info!("All backups were already up-to-date.");
        } else {
            debug!("Servers needing a backup: {}", pending.join(", "));
        }

        let archiver = Archiver::new(Arc::clone(&self.progress));
        let now = Utc::now();
        let servers = plan
            .records
            .iter()
            .map(|record| self.process(&archiver, record, now))
            .collect();

        info!("Backup process complete.");

        Ok(RunReport {
            servers,
            duration: start_time.elapsed(),
            dry_run: self.config.dry_run,
        })
    }

    fn process(
        &self,
        archiver: &Archiver,
        record: &BackupRecord,
        now: DateTime<Utc>,
    ) -> ServerReport {
        let name = &record.server.name;

        let outcome = if !record.is_backup_required() {
            Outcome::UpToDate
        } else if self.config.dry_run {
            info!("Server \"{}\" needs a backup", name);
            Outcome::Planned
        } else {
            info!("Backing up server: {}", name);
            match archiver.create(record) {
                Ok(created) => Outcome::BackedUp {
                    archive: created.archive.file_name(),
                    files: created.files,
                    size: created.size,
                },
                Err(e) => {
                    warn!("Unable to back up server \"{}\": {}", name, e);
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        ServerReport {
            name: name.clone(),
            freshness: floor_to_second(record.freshness),
            latest_backup: record.latest_backup_time(),
            outcome,
            pruned: self.prune(record, now),
        }
    }

    fn prune(&self, record: &BackupRecord, now: DateTime<Utc>) -> usize {
        let Some(days) = self.config.prune_after_days else {
            return 0;
        };
        if self.config.dry_run || !record.backup.exists() {
            return 0;
        }

        match prune_archives(&record.backup, days, now) {
            Ok(removed) => {
                for path in &removed {
                    info!("Pruned old archive {}", path.display());
                }
                removed.len()
            }
            Err(e) => {
                warn!("Unable to prune backups of \"{}\": {}", record.server.name, e);
                0
            }
        }
    }
}
