//! Pipeline entry points for crawler operations.
//!
//! - `Pipeline`: Listing pages to structured records, one run
//! - `run_crawler`: Seed from prior output, run the pipeline, persist
//! - `run_scheduled`: Repeat `run_crawler` on a fixed interval

pub mod crawl;
pub mod orchestrator;
pub mod schedule;

pub use crawl::{RunSummary, run_crawler};
pub use orchestrator::{Pipeline, PipelineState, RunOutcome};
pub use schedule::run_scheduled;
