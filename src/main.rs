//! ReviewLens - peer-review score aggregation
//!
//! Reads a folder of review XML exports, computes reviewer bias statistics
//! and per-paper scores, and either serves them over HTTP or writes a
//! Markdown/JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing folder, no parseable reviews, bad config, etc.)
//!   2 - Some documents failed to parse and --fail-on-parse-errors was set

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod scanner;
mod server;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ReviewLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .reviewlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the server address, default data folder, and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG`, when set, takes precedence over --verbose/--quiet.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch to serve or report mode. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.serve {
        run_server(config).await?;
        return Ok(0);
    }

    run_report(&args, &config)
}

/// Resolve a possibly relative path against the working directory.
fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Start the HTTP query shell.
async fn run_server(mut config: Config) -> Result<()> {
    let static_dir = absolutize(&config.server.static_dir)?;
    if !static_dir.is_dir() {
        bail!("Static directory does not exist: {}", static_dir.display());
    }
    config.server.static_dir = static_dir;

    if let Some(dir) = config.data.default_dir.take() {
        let dir = absolutize(&dir)?;
        if !dir.is_dir() {
            warn!("Default data directory does not exist yet: {}", dir.display());
        }
        config.data.default_dir = Some(dir);
    }

    if config.report.redact_confidential {
        info!("Confidential remarks will be redacted from responses");
    }

    println!("🌐 Serving on http://{}:{}", config.server.host, config.server.port);
    server::run(&config).await
}

/// Build a report for the configured folder and write it to disk.
fn run_report(args: &Args, config: &Config) -> Result<i32> {
    let Some(ref folder) = config.data.default_dir else {
        bail!("No review folder specified. Use --data-dir, set [data].default_dir, or run with --serve.");
    };
    let folder = absolutize(folder)?;

    println!("📂 Loading reviews from: {}", folder.display());
    let mut dashboard = analysis::build_dashboard(&folder)?;

    for message in &dashboard.parse_errors {
        eprintln!("   ⚠️  {}", message);
    }

    if config.report.redact_confidential {
        dashboard.redact_confidential();
    }

    println!("\n📝 Generating report...");
    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(
            &dashboard,
            Utc::now(),
            config.report.contested_papers,
        ),
    };
    report::save_report(&output, &config.report.output)?;

    let summary = &dashboard.summary;
    println!("\n📊 Review Summary:");
    println!(
        "   Documents parsed: {} of {}",
        dashboard.parsed_files, dashboard.xml_files
    );
    println!("   Papers: {}", summary.paper_count);
    println!("   Reviews: {}", summary.review_count);
    println!("   Scoring reviewers: {}", summary.reviewer_count);
    println!(
        "\n✅ Report saved to: {}",
        config.report.output.display()
    );

    if args.fail_on_parse_errors && dashboard.has_parse_errors() {
        eprintln!(
            "\n⛔ {} document(s) failed to parse. Failing (exit code 2).",
            dashboard.parse_errors.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
