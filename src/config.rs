/*!
 * Configuration handling for backutil
 *
 * Settings come from a TOML file that is created with defaults on first
 * run; command-line flags override individual keys.
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::report::ReportFormat;

/// Default settings file name, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Output format selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Console tables (default)
    #[default]
    Table,
    /// JSON document on stdout
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => ReportFormat::ConsoleTable,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

/// Command-line arguments for backutil
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "backutil",
    version = env!("CARGO_PKG_VERSION"),
    about = "Archive server directories that changed since their last backup",
    long_about = "Scans every server directory, compares its newest modification time with the timestamp embedded in its latest archive, and creates a new zip archive for each server that changed."
)]
pub struct Args {
    /// Path to the settings file (created with defaults if missing)
    #[clap(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory containing one subdirectory per server (overrides settings)
    #[clap(long)]
    pub servers_directory: Option<PathBuf>,

    /// Directory receiving one backup directory per server (overrides settings)
    #[clap(long)]
    pub backups_directory: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (overrides settings)
    #[clap(long)]
    pub log_level: Option<String>,

    /// Report what would be backed up without writing anything
    #[clap(long)]
    pub dry_run: bool,

    /// Report format
    #[clap(long, value_enum, default_value_t = OutputFormat::default())]
    pub format: OutputFormat,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

impl Args {
    /// Log level from the command line, falling back to the settings file
    pub fn log_level_or(&self, settings: &Settings) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| settings.log_level.clone())
    }
}

/// Contents of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory containing the server directories
    pub servers_directory: String,

    /// Directory holding the backup directories
    pub backups_directory: String,

    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Delete archives older than `pruning_threshold` days
    pub enable_pruning: bool,

    /// Maximum archive age in days when pruning
    pub pruning_threshold: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servers_directory: String::new(),
            backups_directory: String::new(),
            log_level: "info".to_string(),
            enable_pruning: false,
            pruning_threshold: 60,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from `path`, writing the defaults there first if it does not exist.
    ///
    /// The flag is true when the file was created by this call.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool)> {
        let created = if path.exists() {
            false
        } else {
            Self::default().save(path)?;
            true
        };

        let content = fs::read_to_string(path)?;
        Ok((Self::from_toml(&content)?, created))
    }

    /// Write settings to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory containing one subdirectory per server
    pub servers_dir: PathBuf,

    /// Directory holding one backup directory per server
    pub backups_dir: PathBuf,

    /// Archive age limit in days, when pruning is enabled
    pub prune_after_days: Option<u64>,

    /// Plan only, create and delete nothing
    pub dry_run: bool,

    /// Report format
    pub report_format: ReportFormat,
}

impl Config {
    /// Combine settings and command-line overrides
    pub fn from_parts(args: &Args, settings: Settings) -> Result<Self> {
        let servers_dir = args
            .servers_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.servers_directory));
        let backups_dir = args
            .backups_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.backups_directory));

        crate::ensure!(
            !servers_dir.as_os_str().is_empty() && !backups_dir.as_os_str().is_empty(),
            Config,
            "Invalid directory configuration set. Edit {} and specify servers_directory and backups_directory.",
            args.config.display()
        );

        Ok(Self {
            servers_dir,
            backups_dir,
            prune_after_days: settings
                .enable_pruning
                .then_some(settings.pruning_threshold),
            dry_run: args.dry_run,
            report_format: args.format.into(),
        })
    }

    /// Build configuration for a servers/backups pair with default settings
    pub fn new(servers_dir: impl Into<PathBuf>, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            servers_dir: servers_dir.into(),
            backups_dir: backups_dir.into(),
            prune_after_days: None,
            dry_run: false,
            report_format: ReportFormat::ConsoleTable,
        }
    }
}
