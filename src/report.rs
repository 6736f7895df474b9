/*!
 * Reporting functionality for backutil
 *
 * Renders the outcome of a backup run either as console tables, using the
 * tabled library, or as a JSON document.
 */

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::error::Result;
use crate::utils::format_file_size;

/// What happened to one server during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Latest archive is at least as new as the server
    UpToDate,
    /// Backup needed, skipped because of a dry run
    Planned,
    /// New archive written
    BackedUp {
        /// Archive file name
        archive: String,
        /// Regular files stored
        files: u64,
        /// Archive size in bytes
        size: u64,
    },
    /// Archive creation failed
    Failed {
        /// Error message
        error: String,
    },
}

/// Per-server line of the report
#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    /// Server directory name
    pub name: String,
    /// Freshness, floored to seconds
    pub freshness: DateTime<Utc>,
    /// Timestamp of the latest archive before this run
    pub latest_backup: Option<DateTime<Utc>>,
    /// Result of the run
    pub outcome: Outcome,
    /// Archives removed by pruning
    pub pruned: usize,
}

/// Result of a complete backup run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One entry per server, sorted by name
    pub servers: Vec<ServerReport>,
    /// Wall time of the run
    pub duration: Duration,
    /// Whether archives were actually written
    pub dry_run: bool,
}

impl RunReport {
    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.servers
            .iter()
            .filter(|server| predicate(&server.outcome))
            .count()
    }

    /// Servers archived during this run
    pub fn backed_up(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::BackedUp { .. }))
    }

    /// Servers whose archive creation failed
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed { .. }))
    }

    /// Servers that did not need a backup
    pub fn up_to_date(&self) -> usize {
        self.count(|outcome| *outcome == Outcome::UpToDate)
    }

    /// Servers that would be archived without `--dry-run`
    pub fn planned(&self) -> usize {
        self.count(|outcome| *outcome == Outcome::Planned)
    }

    /// Archives deleted by pruning
    pub fn pruned(&self) -> usize {
        self.servers.iter().map(|server| server.pruned).sum()
    }
}

/// Format of the report output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
    /// JSON document
    Json,
}

/// Report generator for backup runs
pub struct Reporter {
    format: ReportFormat,
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "none".to_string(),
    }
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string for a run
    pub fn generate_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            ReportFormat::ConsoleTable => Ok(self.generate_console_report(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &RunReport) -> Result<()> {
        let rendered = self.generate_report(report)?;
        match self.format {
            ReportFormat::ConsoleTable => println!("\n{}", rendered),
            ReportFormat::Json => println!("{}", rendered),
        }
        Ok(())
    }

    fn styled(mut table: Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    // One row per server
    fn create_servers_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct ServerRow {
            #[tabled(rename = "Server")]
            name: String,

            #[tabled(rename = "Last Modified")]
            freshness: String,

            #[tabled(rename = "Latest Backup")]
            latest: String,

            #[tabled(rename = "Status")]
            status: String,
        }

        let rows: Vec<ServerRow> = report
            .servers
            .iter()
            .map(|server| ServerRow {
                name: server.name.clone(),
                freshness: format_time(Some(server.freshness)),
                latest: format_time(server.latest_backup),
                status: match &server.outcome {
                    Outcome::UpToDate => "up to date".to_string(),
                    Outcome::Planned => "backup needed".to_string(),
                    Outcome::BackedUp {
                        archive,
                        files,
                        size,
                    } => format!(
                        "archived {} ({} files, {})",
                        archive,
                        files,
                        format_file_size(*size)
                    ),
                    Outcome::Failed { error } => format!("failed: {}", error),
                },
            })
            .collect();

        Self::styled(Table::new(rows))
    }

    fn create_summary_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![SummaryRow {
            key: "Servers".to_string(),
            value: report.servers.len().to_string(),
        }];

        if report.dry_run {
            rows.push(SummaryRow {
                key: "Backups Needed".to_string(),
                value: report.planned().to_string(),
            });
        } else {
            rows.push(SummaryRow {
                key: "Backed Up".to_string(),
                value: report.backed_up().to_string(),
            });
            rows.push(SummaryRow {
                key: "Failed".to_string(),
                value: report.failed().to_string(),
            });
        }

        rows.push(SummaryRow {
            key: "Up To Date".to_string(),
            value: report.up_to_date().to_string(),
        });

        if report.pruned() > 0 {
            rows.push(SummaryRow {
                key: "Archives Pruned".to_string(),
                value: report.pruned().to_string(),
            });
        }

        rows.push(SummaryRow {
            key: "Process Time".to_string(),
            value: format!("{:.4?}", report.duration),
        });

        Self::styled(Table::new(rows))
    }

    fn generate_console_report(&self, report: &RunReport) -> String {
        let title = if report.dry_run {
            "DRY RUN, NOTHING WRITTEN"
        } else {
            "BACKUP COMPLETE"
        };

        format!(
            "SERVERS\n{}\n\n{}\n{}",
            self.create_servers_table(report),
            title,
            self.create_summary_table(report)
        )
    }
}
