//! Batch orchestration
//!
//! Builds the worklist, fans the items out over a rayon pool sized to the
//! machine, and tallies outcomes. The batch is fire-and-forget: a failing
//! track is logged and counted, never a reason to stop the others.

pub mod processor;

pub use processor::process_track;

use crate::config::Settings;
use crate::discovery;
use crate::error::Result;
use crate::fetch::{Fetcher, YtDlpFetcher};
use crate::types::{TrackOutcome, TrackReport};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// What a batch run did, for the end-of-run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Run a batch with the default yt-dlp fetcher
pub fn run(settings: &Settings) -> Result<BatchResult> {
    run_with(settings, Arc::new(YtDlpFetcher::new()))
}

/// Run a batch with an injected fetcher
pub fn run_with(settings: &Settings, fetcher: Arc<dyn Fetcher>) -> Result<BatchResult> {
    let items = discovery::build(&settings.source, &settings.base_dir, settings.delimiter)?;

    if items.is_empty() {
        info!("nothing to process");
        return Ok(BatchResult {
            total: 0,
            succeeded: 0,
            failed: 0,
        });
    }

    info!(
        tracks = items.len(),
        features = ?settings.features.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        parallel = settings.parallel,
        "starting batch"
    );

    let progress = if settings.show_progress {
        let bar = ProgressBar::new(items.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let succeeded = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let handle_report = |report: TrackReport| {
        if report.succeeded() {
            succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            failed.fetch_add(1, Ordering::Relaxed);
            match &report.outcome {
                TrackOutcome::Completed => {}
                TrackOutcome::BadPath(reason)
                | TrackOutcome::FetchFailed(reason)
                | TrackOutcome::DecodeFailed(reason)
                | TrackOutcome::StoreFailed(reason) => {
                    warn!(id = %report.id, reason = %reason, "track failed");
                }
            }
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    };

    if settings.parallel {
        configure_thread_pool(settings.threads);
        items
            .par_iter()
            .map(|item| process_track(item, &settings.features, settings.force, fetcher.as_ref()))
            .for_each(handle_report);
    } else {
        items
            .iter()
            .map(|item| process_track(item, &settings.features, settings.force, fetcher.as_ref()))
            .for_each(handle_report);
    }

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let result = BatchResult {
        total: items.len(),
        succeeded: succeeded.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
    };
    info!(
        total = result.total,
        succeeded = result.succeeded,
        failed = result.failed,
        "batch finished"
    );
    Ok(result)
}

/// Size the global pool to the machine. Building it twice in one process is
/// fine; rayon rejects the second attempt and keeps the first pool.
fn configure_thread_pool(threads: usize) {
    let threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads
    };
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global();
}
