// src/pipeline/crawl.rs

//! One complete crawl: seed, scrape, persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::orchestrator::Pipeline;
use crate::services::DedupIndex;
use crate::storage::{RecordStorage, scan_prior_output};
use crate::utils::http::Transport;

/// Summary of a crawl run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub prior_entries: usize,
    pub pages_total: usize,
    pub page_failures: usize,
    pub candidates_total: usize,
    pub detail_failures: usize,
    pub records_saved: usize,
    pub output: Option<PathBuf>,
}

/// Run the crawler once and persist its records.
///
/// Configuration defects surface before any request is sent. Page and
/// detail failures are counted in the summary; only a storage failure
/// fails the run.
pub async fn run_crawler(
    config: &Config,
    transport: Arc<dyn Transport>,
    storage: &dyn RecordStorage,
) -> Result<RunSummary> {
    let started_at = Local::now();
    let clock = std::time::Instant::now();
    log::info!("Starting scraper job at {}", started_at.format("%Y-%m-%d %H:%M:%S"));

    let mut pipeline = Pipeline::new(config, transport)?;

    let prior = scan_prior_output(Path::new(&config.storage.directory)).await;
    let mut index = DedupIndex::new();
    index.seed_from(&prior);
    log::info!(
        "Loaded {} fingerprints from {} prior entries",
        index.len(),
        prior.len()
    );

    let outcome = pipeline.run(&mut index).await?;
    let output = storage.save(&outcome.records).await?;

    let summary = RunSummary {
        started_at,
        elapsed: clock.elapsed(),
        prior_entries: prior.len(),
        pages_total: outcome.pages_total,
        page_failures: outcome.page_failures,
        candidates_total: outcome.candidates_total,
        detail_failures: outcome.detail_failures,
        records_saved: outcome.records.len(),
        output,
    };

    log::info!(
        "Scraper job completed in {:.2} seconds, found {} jobs",
        summary.elapsed.as_secs_f64(),
        summary.records_saved
    );
    log::info!(
        "Pages: {} ({} failed), candidates: {}, detail failures: {}",
        summary.pages_total,
        summary.page_failures,
        summary.candidates_total,
        summary.detail_failures
    );
    if let Some(path) = &summary.output {
        log::info!("Output: {}", path.display());
    }

    Ok(summary)
}
