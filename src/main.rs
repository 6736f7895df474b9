/*!
 * Command-line interface for backutil
 */

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use backutil::config::{Args, Config, Settings};
use backutil::report::Reporter;
use backutil::runner::Runner;
use backutil::{logging, Result};

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "backutil", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("The program has encountered a problem and must stop.");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    // Load settings, creating the file on first run
    let (settings, created) = Settings::load_or_create(&args.config)?;

    let level = args.log_level_or(&settings);
    logging::init(&level)?;
    debug!("Logging level: {}", level);

    if created {
        info!(
            "Configuration file \"{}\" created successfully.",
            args.config.display()
        );
    }

    let config = Config::from_parts(&args, settings)?;

    let progress = if config.dry_run {
        ProgressBar::hidden()
    } else {
        let progress = ProgressBar::new(0);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {wide_msg:.dim.white} {pos}/{len} ({percent}%) Elapsed: {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.enable_steady_tick(std::time::Duration::from_millis(100));
        progress
    };

    let runner = Runner::new(config.clone(), Arc::new(progress.clone()));
    let report = runner.run()?;

    progress.finish_and_clear();

    Reporter::new(config.report_format).print_report(&report)
}
