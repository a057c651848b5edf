//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values. Every connection setting
//! can also come from the environment, matching how the export is run
//! from cron or CI.

use clap::Parser;
use std::path::PathBuf;

/// timereport - Azure DevOps time tracking CSV exporter
///
/// Runs a saved work-item query, expands parent/child hierarchy
/// relations, rolls 7pace Timetracker worklogs up from children into
/// their parents by activity category, and writes a semicolon-delimited
/// CSV export.
///
/// Examples:
///   timereport --org my-org --project my-project --query 6e5f...
///   AZDO_ORG=my-org AZDO_PROJECT=my-project QUERY_ID=6e5f... timereport
///   timereport --dry-run
///   timereport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Azure DevOps organization name
    #[arg(long, value_name = "ORG", env = "AZDO_ORG")]
    pub org: Option<String>,

    /// Azure DevOps project name
    #[arg(long, value_name = "PROJECT", env = "AZDO_PROJECT")]
    pub project: Option<String>,

    /// Saved query id (GUID) to run
    #[arg(long, value_name = "GUID", env = "QUERY_ID")]
    pub query: Option<String>,

    /// Azure DevOps personal access token
    #[arg(
        long,
        value_name = "TOKEN",
        env = "AZDO_PAT",
        hide_env_values = true
    )]
    pub azdo_pat: Option<String>,

    /// 7pace Timetracker API token
    #[arg(
        long,
        value_name = "TOKEN",
        env = "SEVENPACE_PAT",
        hide_env_values = true
    )]
    pub timehub_pat: Option<String>,

    /// 7pace Timetracker tenant URL
    ///
    /// Example: https://acme.timehub.7pace.com
    #[arg(long, value_name = "URL", env = "TIMEHUB_URL")]
    pub timehub_url: Option<String>,

    /// Activity name counted as development time
    #[arg(long, value_name = "NAME", env = "NOM_ACTIVITE_DEV")]
    pub activity_dev: Option<String>,

    /// Activity name counted as testing time
    #[arg(long, value_name = "NAME", env = "NOM_ACTIVITE_TEST")]
    pub activity_test: Option<String>,

    /// Directory the export CSV is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .timereport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Resolve the query and hierarchy without fetching worklogs or writing a file
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .timereport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Only flag-level constraints live here; required connection
    /// settings are checked after the config file is merged in.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref url) = self.timehub_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    "Timetracker URL must start with 'http://' or 'https://'".to_string()
                );
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
