//! Per-track processing
//!
//! A track runs through fetch, decode, and one extract-or-skip pass per
//! requested feature. Each stage is fault-isolated: a feature that fails
//! never stops its siblings, and nothing a single track does can abort the
//! batch around it.

use crate::audio;
use crate::error::Result;
use crate::features::{self, FeatureKind};
use crate::fetch::Fetcher;
use crate::store::FeatureStore;
use crate::types::{AudioBuffer, FeatureReport, FeatureStatus, TrackOutcome, TrackReport, WorkItem};
use ndarray::ArrayD;
use std::path::Path;
use tracing::{debug, info, warn};

/// Process one track end to end and report what happened
pub fn process_track(
    item: &WorkItem,
    keys: &[FeatureKind],
    force: bool,
    fetcher: &dyn Fetcher,
) -> TrackReport {
    let id = match item.input.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem.to_string(),
        None => {
            warn!(path = %item.input.display(), "input path has no usable file stem");
            return TrackReport {
                id: item.input.display().to_string(),
                outcome: TrackOutcome::BadPath("no usable file stem".into()),
                features: Vec::new(),
            };
        }
    };

    // Fetch when the audio is missing, or unconditionally under --force so a
    // stale or truncated download gets replaced
    if !item.input.exists() || force {
        debug!(id = %id, fetcher = fetcher.name(), "fetching audio");
        if let Err(e) = fetcher.fetch(&id, &item.input) {
            warn!(id = %id, error = %e, "fetch failed");
            return TrackReport {
                id,
                outcome: TrackOutcome::FetchFailed(e.to_string()),
                features: Vec::new(),
            };
        }
        if !item.input.exists() {
            warn!(id = %id, "fetcher reported success but produced no file");
            return TrackReport {
                id,
                outcome: TrackOutcome::FetchFailed("fetcher produced no file".into()),
                features: Vec::new(),
            };
        }
    }

    let buffer = match audio::decode(&item.input) {
        Ok(buffer) => buffer,
        Err(e) => {
            warn!(id = %id, error = %e, "decode failed");
            return TrackReport {
                id,
                outcome: TrackOutcome::DecodeFailed(e.to_string()),
                features: Vec::new(),
            };
        }
    };
    debug!(
        id = %id,
        sample_rate = buffer.sample_rate,
        duration_secs = buffer.duration,
        "decoded audio"
    );

    let mut store = match FeatureStore::open(&item.output) {
        Ok(store) => store,
        Err(e) => {
            warn!(id = %id, error = %e, "could not open feature store");
            return TrackReport {
                id,
                outcome: TrackOutcome::StoreFailed(e.to_string()),
                features: Vec::new(),
            };
        }
    };

    let mut reports = Vec::with_capacity(keys.len());
    for &kind in keys {
        let status = extract_one(kind, &buffer, &item.input, force, &mut store);
        match &status {
            FeatureStatus::Written => info!(id = %id, feature = %kind, "feature written"),
            FeatureStatus::Skipped => debug!(id = %id, feature = %kind, "feature present, skipped"),
            FeatureStatus::Failed(reason) => {
                warn!(id = %id, feature = %kind, reason = %reason, "feature failed")
            }
        }
        reports.push(FeatureReport { kind, status });
    }

    TrackReport {
        id,
        outcome: TrackOutcome::Completed,
        features: reports,
    }
}

/// Extract-or-skip one feature. Force scope is per key: a forced key is
/// removed and recomputed, an unforced key already present is skipped.
fn extract_one(
    kind: FeatureKind,
    buffer: &AudioBuffer,
    input: &Path,
    force: bool,
    store: &mut FeatureStore,
) -> FeatureStatus {
    let key = kind.as_str();

    if store.contains(key) {
        if !force {
            return FeatureStatus::Skipped;
        }
        if let Err(e) = store.remove(key) {
            return FeatureStatus::Failed(e.to_string());
        }
    }

    match compute_and_write(kind, buffer, input, store) {
        Ok(()) => FeatureStatus::Written,
        Err(e) => FeatureStatus::Failed(e.to_string()),
    }
}

fn compute_and_write(
    kind: FeatureKind,
    buffer: &AudioBuffer,
    input: &Path,
    store: &mut FeatureStore,
) -> Result<()> {
    let array: ArrayD<f32> = features::compute(kind, buffer, input)?;
    store.write(kind.as_str(), &array)
}
