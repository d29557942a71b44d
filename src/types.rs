//! Core data types for ytfex
//!
//! These types represent the domain model and flow through the pipeline.

use crate::features::FeatureKind;
use std::path::PathBuf;

// =============================================================================
// Work items
// =============================================================================

/// One unit of batch work: a resolved input/output path pair.
///
/// Derived deterministically from `(base_dir, track id)` by the path rules in
/// [`crate::discovery::paths`]. Work items are created per batch run and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    /// Path of the source audio file (fetched here if absent)
    pub input: PathBuf,
    /// Path of the per-track feature container
    pub output: PathBuf,
}

impl WorkItem {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

// =============================================================================
// Audio buffer
// =============================================================================

/// Decoded mono audio ready for feature extraction
///
/// Owned exclusively by the track-processor invocation that decoded it;
/// never shared across tracks or across the worker pool.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero for an invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// Track processing outcomes
// =============================================================================

/// Stage at which a track's processing stopped, if it did
///
/// Nothing escalates out of the track processor; each failure mode is an
/// explicit variant so callers and tests can assert on the reason instead of
/// parsing log text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Decode succeeded; per-feature results are in the report
    Completed,
    /// No track identifier could be derived from the input path
    BadPath(String),
    /// Fetch raised, or the file was still absent after the fetch attempt
    FetchFailed(String),
    /// The audio file could not be decoded
    DecodeFailed(String),
    /// The feature container could not be opened or created
    StoreFailed(String),
}

/// Per-key result of the extraction policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureStatus {
    /// Computed and persisted in this run
    Written,
    /// Already present, not forced, left untouched
    Skipped,
    /// Computation or persistence failed; siblings were still attempted
    Failed(String),
}

/// Per-key entry in a [`TrackReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureReport {
    pub kind: FeatureKind,
    pub status: FeatureStatus,
}

/// Full result of processing one work item
#[derive(Debug, Clone)]
pub struct TrackReport {
    /// Track identifier, when one could be derived from the input path
    pub id: String,
    pub outcome: TrackOutcome,
    pub features: Vec<FeatureReport>,
}

impl TrackReport {
    pub fn new(id: impl Into<String>, outcome: TrackOutcome) -> Self {
        Self {
            id: id.into(),
            outcome,
            features: Vec::new(),
        }
    }

    /// Track-level success: decode succeeded. Per-feature failures do not
    /// flip this, so a retry run can skip the download and decode.
    pub fn succeeded(&self) -> bool {
        self.outcome == TrackOutcome::Completed
    }

    /// Status recorded for one feature kind, if it was attempted
    pub fn status_of(&self, kind: FeatureKind) -> Option<&FeatureStatus> {
        self.features
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| &f.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_buffer_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 22050], 22050);
        assert!((buffer.duration - 1.0).abs() < 1e-9);
        assert_eq!(buffer.len(), 22050);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_audio_buffer_zero_sample_rate() {
        let buffer = AudioBuffer::new(vec![0.0; 100], 0);
        assert_eq!(buffer.duration, 0.0);
    }

    #[test]
    fn test_report_success_ignores_feature_failures() {
        let mut report = TrackReport::new("abc123", TrackOutcome::Completed);
        report.features.push(FeatureReport {
            kind: FeatureKind::Cens,
            status: FeatureStatus::Failed("boom".into()),
        });
        assert!(report.succeeded());
    }

    #[test]
    fn test_report_fetch_failure_is_not_success() {
        let report = TrackReport::new("abc123", TrackOutcome::FetchFailed("gone".into()));
        assert!(!report.succeeded());
    }
}
