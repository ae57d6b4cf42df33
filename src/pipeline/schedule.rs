// src/pipeline/schedule.rs

//! Fixed-interval runner.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::crawl::run_crawler;
use crate::pipeline::orchestrator::Pipeline;
use crate::storage::{RecordStorage, create_storage};
use crate::utils::http::{HttpTransport, Transport};

/// Run immediately, then every `interval` until Ctrl-C.
///
/// Runs never overlap: a tick that fires while a run is in progress is
/// skipped. A failed run is logged and the schedule continues.
pub async fn run_scheduled(config: &Config, interval: Duration) -> Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config.scraper)?);
    let storage = create_storage(&config.storage)?;

    // Selector defects are fatal here rather than once per tick.
    Pipeline::new(config, Arc::clone(&transport))?;

    log::info!(
        "Scheduler started - job will run every {:.1} hours",
        interval.as_secs_f64() / 3600.0
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    let runs = schedule_loop(config, transport, storage.as_ref(), interval, shutdown).await;

    log::info!("Scheduler stopped after {runs} runs");
    Ok(())
}

/// Tick loop behind [`run_scheduled`]; returns the number of runs started.
pub async fn schedule_loop<F>(
    config: &Config,
    transport: Arc<dyn Transport>,
    storage: &dyn RecordStorage,
    interval: Duration,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut runs = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutting down scheduler...");
                break;
            }
            _ = ticker.tick() => {
                runs += 1;
                if let Err(e) = run_crawler(config, Arc::clone(&transport), storage).await {
                    log::error!("Error in scraper job: {e}");
                }
            }
        }
    }
    runs
}
