//! submission-harvest - Concurrent Top-Submission Harvester
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use submission_harvest::config::{CliArgs, HarvestConfig};
use submission_harvest::db::SubmissionStore;
use submission_harvest::feed::RedditClient;
use submission_harvest::pipeline::{run_harvest, Coordinator};
use submission_harvest::progress::{print_header, print_summary, write_rows, ProgressReporter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose);

    // Validate and create config
    let config = HarvestConfig::from_args(args).context("Invalid configuration")?;

    // Open the store first: without it there is nothing to harvest into
    let store = SubmissionStore::open(&config.db_path).context("Failed to open store")?;

    let feed = RedditClient::new(&config.base_url, &config.user_agent, config.http_timeout)
        .context("Failed to initialize feed client")?;

    let coordinator = Coordinator::new(config.sources.clone(), Arc::new(feed))
        .with_limit(config.limit)
        .with_wait_timeout(config.wait_timeout);

    // Setup signal handler for graceful shutdown
    let interrupt = coordinator.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, storing what has been fetched...");
        interrupt.interrupt();
    })
    .context("Failed to set signal handler")?;

    if config.show_progress {
        print_header(&config.sources, config.limit, &config.db_path);
    }

    let progress = config.show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Fetching top listings...");
    }

    let report = run_harvest(&coordinator, &store, |update| {
        if let Some(ref p) = progress {
            p.update(update);
        }
    })
    .context("Harvest failed")?;

    if let Some(ref p) = progress {
        if report.collect.completed() {
            p.finish("All sources fetched");
        } else {
            p.finish("Fetch stopped early");
        }
    }

    write_rows(&mut io::stdout().lock(), &report.rows).context("Failed to write results")?;

    if config.show_progress {
        print_summary(&report, &config.db_path);
    }

    if report.drain.failed > 0 {
        info!(failed = report.drain.failed, "Harvest completed with insert errors");
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("submission_harvest=debug,warn")
    } else {
        EnvFilter::new("submission_harvest=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
