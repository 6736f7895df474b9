/*!
 * backutil - Archive server directories that changed since their last backup
 *
 * Each server directory is compared against the newest archive in its
 * backup directory. Archive names embed a UTC timestamp with second
 * precision, so both sides of the comparison are floored to whole seconds.
 */

pub mod archive;
pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod report;
pub mod runner;
pub mod scanner;
pub mod selector;
pub mod staleness;
pub mod timestamp;
pub mod types;
pub mod utils;


// Re-export main components for easier access
pub use archive::{prune_archives, Archiver, CreatedArchive};
pub use config::{Args, Config, Settings};
pub use error::{BackupError, Result};
pub use plan::{build_plan, BackupPlan};
pub use report::{Outcome, ReportFormat, Reporter, RunReport, ServerReport};
pub use runner::Runner;
pub use scanner::latest_modification_time;
pub use selector::{latest_backup_file, latest_backup_file_for, require_latest_backup_file};
pub use staleness::is_backup_required;
pub use timestamp::{floor_to_second, format_archive_name, parse_timestamp, ArchiveName};
pub use types::{ArchiveFile, BackupDir, BackupRecord, ServerDir};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
