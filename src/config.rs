//! Configuration types for submission-harvest
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - The static list of harvested sources

use crate::error::ConfigError;
use crate::feed::reddit::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::pipeline::SourceSpec;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Category label to source name, harvested on every run
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("ART", "Art"),
    ("TRUMP", "The_Donald"),
    ("LANDSCAPES", "EarthPorn"),
    ("ANIMALS", "aww"),
];

/// Default store base name (`admin.db`)
pub const DEFAULT_DB_NAME: &str = "admin";

/// Harvest old image submissions from a fixed set of subreddits into SQLite
#[derive(Parser, Debug, Clone)]
#[command(
    name = "submission-harvest",
    version,
    about = "Harvest old image submissions from a fixed set of subreddits into SQLite",
    long_about = "Fetches the all-time top listing of each configured subreddit in parallel,\n\
                  keeps submissions older than 90 days whose URL looks like an image,\n\
                  and appends them to a local SQLite store. The full store is printed\n\
                  when the run finishes.",
    after_help = "EXAMPLES:\n    \
        submission-harvest\n    \
        submission-harvest --limit 250 --db-name archive\n    \
        submission-harvest --wait-timeout 120 -v"
)]
pub struct CliArgs {
    /// Store base name; `.db` is appended
    #[arg(long, default_value = DEFAULT_DB_NAME, value_name = "NAME")]
    pub db_name: PathBuf,

    /// Maximum entries read per source (unlimited if not set)
    #[arg(short = 'l', long, value_name = "NUM")]
    pub limit: Option<usize>,

    /// Stop waiting for sources after this many seconds and store what arrived
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub http_timeout: u64,

    /// Feed host
    #[arg(long, default_value = DEFAULT_BASE_URL, value_name = "URL")]
    pub base_url: String,

    /// User-Agent sent with feed requests
    #[arg(long, default_value = DEFAULT_USER_AGENT, value_name = "UA")]
    pub user_agent: String,

    /// Quiet mode - suppress header, spinner and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Sources to harvest
    pub sources: Vec<SourceSpec>,

    /// Store file path (`<db_name>.db`)
    pub db_path: PathBuf,

    /// Per-source fetch cap
    pub limit: Option<usize>,

    /// Coordinator wait bound
    pub wait_timeout: Option<Duration>,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Feed host
    pub base_url: String,

    /// User-Agent for feed requests
    pub user_agent: String,

    /// Show header, spinner and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl HarvestConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let db_path = db_path_for(&args.db_name)?;

        if args.limit == Some(0) {
            return Err(ConfigError::InvalidLimit(0));
        }

        if let Some(secs) = args.wait_timeout {
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout { name: "wait", secs });
            }
        }

        if args.http_timeout == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "HTTP",
                secs: 0,
            });
        }

        let base_url = args.base_url.trim().to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        Ok(Self {
            sources: default_sources(),
            db_path,
            limit: args.limit,
            wait_timeout: args.wait_timeout.map(Duration::from_secs),
            http_timeout: Duration::from_secs(args.http_timeout),
            base_url,
            user_agent: args.user_agent,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

/// The static source list as specs
pub fn default_sources() -> Vec<SourceSpec> {
    DEFAULT_SOURCES
        .iter()
        .map(|(label, source)| SourceSpec::new(label, source))
        .collect()
}

/// Resolve a store base name to its file path
fn db_path_for(name: &Path) -> Result<PathBuf, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidDbName {
        name: name.display().to_string(),
        reason: reason.to_string(),
    };

    if name.as_os_str().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.file_name().is_none() {
        return Err(invalid("must name a file"));
    }

    let path = crate::db::SubmissionStore::file_for(name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidOutputPath {
                path: path.clone(),
                reason: format!("Parent directory '{}' does not exist", parent.display()),
            });
        }
    }

    Ok(path)
}
