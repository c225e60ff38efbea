//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ReviewLens - peer-review score aggregation
///
/// Reads a folder of review XML exports and computes per-paper and
/// per-reviewer statistics: score spread, confidence-weighted scores and
/// reviewer-bias-adjusted scores. Serve them over HTTP for a dashboard, or
/// write a one-shot Markdown/JSON report.
///
/// Examples:
///   reviewlens --data-dir ./reviews
///   reviewlens --data-dir ./reviews --format json -o summary.json
///   reviewlens --serve --data-dir ./reviews --port 8787
///   reviewlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Folder containing review XML files
    ///
    /// In report mode this is the folder to summarize. In serve mode it is the
    /// fallback for requests that do not pass `?dir=`.
    #[arg(short, long, value_name = "DIR", env = "REVIEWLENS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Run the HTTP server instead of writing a report
    #[arg(long)]
    pub serve: bool,

    /// Interface to bind in serve mode [default: 127.0.0.1]
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on in serve mode [default: 8787]
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory of dashboard front-end files [default: web]
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Output file path for the report [default: review_report.md]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Blank confidential remarks in served and written output
    #[arg(long)]
    pub redact_confidential: bool,

    /// Exit with code 2 if any review document failed to parse
    #[arg(long)]
    pub fail_on_parse_errors: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reviewlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .reviewlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        if !self.serve && (self.host.is_some() || self.port.is_some() || self.static_dir.is_some()) {
            return Err("--host, --port and --static-dir require --serve".to_string());
        }

        if let Some(ref data_dir) = self.data_dir {
            if data_dir.as_os_str().is_empty() {
                return Err("--data-dir must not be empty".to_string());
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
