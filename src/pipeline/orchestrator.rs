// src/pipeline/orchestrator.rs

//! Listing-to-record orchestration.
//!
//! A [`Pipeline`] walks `Idle -> CollectingListings -> ProcessingDetails -> Done`
//! exactly once. Pages are fetched sequentially in page order, then every
//! candidate's detail page in discovery order. A failed page or detail is
//! counted and skipped; everything gathered before it is kept.

use std::fmt;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, ListingCandidate, StructuredRecord};
use crate::services::{DedupIndex, DetailFetcher, ListingPaginator};
use crate::utils::http::Transport;

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CollectingListings,
    ProcessingDetails,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::CollectingListings => "collecting listings",
            PipelineState::ProcessingDetails => "processing details",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Records and counters produced by a run.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub records: Vec<StructuredRecord>,
    pub pages_total: usize,
    pub page_failures: usize,
    pub candidates_total: usize,
    pub detail_failures: usize,
}

/// Single-use orchestrator over a paginator and a detail fetcher.
pub struct Pipeline {
    paginator: ListingPaginator,
    fetcher: DetailFetcher,
    pages: u32,
    state: PipelineState,
}

impl Pipeline {
    /// Compile selectors and wire the services. Selector errors surface here,
    /// before any request is sent.
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            paginator: ListingPaginator::new(config, Arc::clone(&transport))?,
            fetcher: DetailFetcher::new(config, transport)?,
            pages: config.pages_to_scrape,
            state: PipelineState::Idle,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run once. `index` is consulted and extended as listings are accepted.
    pub async fn run(&mut self, index: &mut DedupIndex) -> Result<RunOutcome> {
        if self.state != PipelineState::Idle {
            return Err(AppError::validation(format!(
                "pipeline already used (state: {})",
                self.state
            )));
        }

        self.transition(PipelineState::CollectingListings);
        let mut outcome = RunOutcome {
            pages_total: self.pages as usize,
            ..RunOutcome::default()
        };
        let candidates = self.collect_listings(index, &mut outcome).await;
        outcome.candidates_total = candidates.len();

        self.transition(PipelineState::ProcessingDetails);
        for (i, candidate) in candidates.iter().enumerate() {
            log::debug!(
                "Processing job {}/{}: {}",
                i + 1,
                candidates.len(),
                candidate.normalized_title
            );
            match self.fetcher.fetch_detail(candidate).await {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    outcome.detail_failures += 1;
                    log::warn!("Failed to fetch job details from {}: {}", candidate.link, e);
                }
            }
        }

        self.transition(PipelineState::Done);
        Ok(outcome)
    }

    async fn collect_listings(
        &self,
        index: &mut DedupIndex,
        outcome: &mut RunOutcome,
    ) -> Vec<ListingCandidate> {
        let mut candidates = Vec::new();
        for page in 1..=self.pages {
            match self.paginator.try_fetch_page(page, index).await {
                Ok(found) => candidates.extend(found),
                Err(e) => {
                    outcome.page_failures += 1;
                    log::error!("Failed to get notification listings from page {page}: {e}");
                }
            }
        }
        log::info!(
            "Collected {} candidate listings from {} pages",
            candidates.len(),
            self.pages
        );
        candidates
    }

    fn transition(&mut self, next: PipelineState) {
        log::info!("Pipeline: {} -> {}", self.state, next);
        self.state = next;
    }
}
