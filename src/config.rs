//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.reviewlens.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".reviewlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Review data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of dashboard front-end files.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

/// Review data settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Folder used when a request or run does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dir: Option<PathBuf>,
}

/// Report generation and output policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Blank confidential remarks in served and written output.
    #[serde(default)]
    pub redact_confidential: bool,

    /// Number of most-contested papers listed in Markdown reports.
    #[serde(default = "default_contested_papers")]
    pub contested_papers: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            redact_confidential: false,
            contested_papers: default_contested_papers(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("review_report.md")
}

fn default_contested_papers() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref static_dir) = args.static_dir {
            self.server.static_dir = static_dir.clone();
        }

        if let Some(ref data_dir) = args.data_dir {
            self.data.default_dir = Some(data_dir.clone());
        }

        if let Some(ref output) = args.output {
            self.report.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.redact_confidential {
            self.report.redact_confidential = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
