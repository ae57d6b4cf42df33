//! Job crawler CLI
//!
//! Local execution entry point: one run, a scheduled loop, or a config check.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use job_crawler::{
    error::Result,
    models::{Config, StorageFormat},
    pipeline,
    services::MarkupExtractor,
    services::extractor::parse_selector,
    storage::create_storage,
    utils::http::HttpTransport,
};

/// Job notification crawler
#[derive(Parser, Debug)]
#[command(
    name = "job-crawler",
    version,
    about = "Scrapes job notifications into CSV, JSON or SQLite"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape once and save the results
    Run {
        /// Number of listing pages to fetch
        #[arg(long)]
        pages: Option<u32>,

        /// Output format: csv, json or sqlite
        #[arg(long)]
        format: Option<StorageFormat>,
    },

    /// Scrape now, then again on a fixed interval until Ctrl-C
    Schedule {
        /// Hours between runs
        #[arg(long)]
        interval_hours: Option<u64>,
    },

    /// Validate configuration and selectors
    Validate,
}

/// Writes every log line to stderr and to the log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn open_log_file(path: &str) -> io::Result<File> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
///
/// With a log file configured, output goes to both stderr and the file. A
/// file that cannot be opened is reported and logging stays on stderr.
fn init_logging(level: &str, file: Option<&str>, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();

    let file_error = match file.map(open_log_file) {
        Some(Ok(file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
            None
        }
        Some(Err(e)) => Some(e),
        None => None,
    };
    builder.init();

    if let (Some(path), Some(e)) = (file, file_error) {
        log::warn!("Cannot open log file {path}: {e}");
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let loaded = Config::load_or_default(&cli.config);
    let (level, log_file) = loaded
        .as_ref()
        .map(|c| (c.logging.level.clone(), c.logging.file.clone()))
        .unwrap_or_else(|_| ("info".to_string(), None));
    init_logging(&level, log_file.as_deref(), cli.verbose);

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {}", cli.config.display(), e);
            return Err(e);
        }
    };
    if config_found {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::warn!("Config file {} not found. Using defaults.", cli.config.display());
    }

    match cli.command {
        Command::Run { pages, format } => {
            if let Some(pages) = pages {
                config.pages_to_scrape = pages;
            }
            if let Some(format) = format {
                config.storage.format = format;
            }
            config.validate()?;

            let transport = Arc::new(HttpTransport::from_config(&config.scraper)?);
            let storage = create_storage(&config.storage)?;
            let summary = pipeline::run_crawler(&config, transport, storage.as_ref()).await?;

            match &summary.output {
                Some(path) => log::info!(
                    "Saved {} jobs to {}",
                    summary.records_saved,
                    path.display()
                ),
                None => log::info!("No new jobs found"),
            }
        }

        Command::Schedule { interval_hours } => {
            if let Some(hours) = interval_hours {
                config.schedule.interval_hours = hours;
            }
            config.validate()?;

            let interval = Duration::from_secs(config.schedule.interval_hours * 3600);
            pipeline::run_scheduled(&config, interval).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            parse_selector(&config.listing.entry_selector)?;
            for (field, selector) in config.selectors.entries() {
                parse_selector(selector)?;
                log::debug!("Selector {field}: {selector}");
            }
            MarkupExtractor::new(&config.selectors)?;

            log::info!(
                "Config OK: {} pages, {} whitelist / {} blacklist keywords, {} output",
                config.pages_to_scrape,
                config.whitelist_keywords.len(),
                config.blacklist_keywords.len(),
                config.storage.format
            );
        }
    }

    Ok(())
}
