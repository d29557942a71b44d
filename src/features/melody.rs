//! Melody-derived chroma histogram
//!
//! Path-based: the file is decoded independently at 44100 Hz because the
//! melody pipeline needs the full bandwidth, not the shared 22050 Hz buffer.
//!
//! Pipeline: YIN predominant pitch track (0 Hz on unvoiced frames), pitch in
//! cents relative to a 55 Hz reference, floor-quantized to semitones,
//! min-max rescaled into a single octave [1, 12], then binned into a
//! time-indexed 12-bin histogram with per-window min-max normalization.

use crate::audio;
use crate::error::{Result, YtfexError};
use ndarray::{Array2, ArrayD};
use std::path::Path;

const FRAME_LENGTH: usize = 2048;
const HOP_LENGTH: usize = 512;
const FMIN: f32 = 55.0;
const FMAX: f32 = 1760.0;
const YIN_THRESHOLD: f32 = 0.15;

/// Pitch-class histogram window, in pitch frames
const HISTOGRAM_HOP: usize = 2;

/// Reference frequency for the cents scale (A1)
const CENTS_REF_HZ: f32 = 55.0;

/// Compute the melodia descriptor for an audio file, `12 x n_windows`
pub fn compute(path: &Path) -> Result<ArrayD<f32>> {
    let buffer = audio::decode_at(path, audio::MELODY_SAMPLE_RATE)
        .map_err(|e| YtfexError::feature_error("melodia", e.to_string()))?;

    let pitch = yin_pitch_track(&buffer.samples, buffer.sample_rate);
    if pitch.is_empty() {
        return Err(YtfexError::feature_error(
            "melodia",
            "audio shorter than one analysis frame",
        ));
    }

    Ok(descriptor(&pitch).into_dyn())
}

/// YIN pitch estimate per frame; 0.0 marks unvoiced frames
fn yin_pitch_track(y: &[f32], sample_rate: u32) -> Vec<f32> {
    if y.len() < FRAME_LENGTH || sample_rate == 0 {
        return Vec::new();
    }

    let sr = sample_rate as f32;
    let tau_min = ((sr / FMAX) as usize).max(2);
    let tau_max = ((sr / FMIN) as usize).min(FRAME_LENGTH / 2);
    if tau_min >= tau_max {
        return Vec::new();
    }

    // Fixed integration window so all lags are comparable
    let w = FRAME_LENGTH - tau_max;

    let mut track = Vec::new();
    let mut start = 0;
    while start + FRAME_LENGTH <= y.len() {
        let frame = &y[start..start + FRAME_LENGTH];
        track.push(yin_frame(frame, sr, tau_min, tau_max, w));
        start += HOP_LENGTH;
    }
    track
}

fn yin_frame(frame: &[f32], sr: f32, tau_min: usize, tau_max: usize, w: usize) -> f32 {
    // Difference function
    let mut diff = vec![0.0f32; tau_max + 1];
    for (tau, d) in diff.iter_mut().enumerate().take(tau_max + 1).skip(1) {
        let mut sum = 0.0f32;
        for j in 0..w {
            let delta = frame[j] - frame[j + tau];
            sum += delta * delta;
        }
        *d = sum;
    }

    // Cumulative mean normalized difference
    let mut cmndf = vec![1.0f32; tau_max + 1];
    let mut running = 0.0f32;
    for tau in 1..=tau_max {
        running += diff[tau];
        cmndf[tau] = if running > 0.0 {
            diff[tau] * tau as f32 / running
        } else {
            1.0
        };
    }

    // First local minimum under the threshold; unvoiced if none
    for tau in tau_min..tau_max {
        if cmndf[tau] < YIN_THRESHOLD && cmndf[tau] <= cmndf[tau + 1] {
            return sr / tau as f32;
        }
    }
    0.0
}

/// Turn a pitch track into the 12-bin chroma-like histogram
pub(crate) fn descriptor(pitch_hz: &[f32]) -> Array2<f32> {
    let semitones = to_semitones(pitch_hz);
    let mapped = map_into_single_octave(&semitones);
    histogram(&mapped)
}

/// Pitch to floor-quantized semitones relative to the 55 Hz reference;
/// unvoiced (non-positive) frames stay 0
fn to_semitones(pitch_hz: &[f32]) -> Vec<i64> {
    pitch_hz
        .iter()
        .map(|&f| {
            if f > 0.0 {
                let cents = 1200.0 * (f / CENTS_REF_HZ).log2();
                (cents / 100.0).floor() as i64
            } else {
                0
            }
        })
        .collect()
}

/// Min-max rescale positive semitone values into [1, 12] with integer floor
/// division; zeros (unvoiced) pass through
///
/// A track whose voiced frames all sit on one semitone has zero range; those
/// frames map to bin 1 instead of dividing by zero.
fn map_into_single_octave(semitones: &[i64]) -> Vec<i64> {
    let nonzero: Vec<i64> = semitones.iter().copied().filter(|&s| s != 0).collect();
    if nonzero.is_empty() {
        return vec![0; semitones.len()];
    }
    let min_d = nonzero.iter().copied().min().unwrap_or(0);
    let max_d = semitones.iter().copied().max().unwrap_or(0);
    let range = max_d - min_d;

    semitones
        .iter()
        .map(|&s| {
            if s > 0 {
                if range > 0 {
                    ((s - min_d) * 11).div_euclid(range) + 1
                } else {
                    1
                }
            } else {
                0
            }
        })
        .collect()
}

/// Count pitch classes 1..=12 over non-overlapping windows and min-max
/// normalize each window
///
/// A window with zero dynamic range across its bins is left all-zero rather
/// than dividing by zero. Output is `12 x n_windows`.
fn histogram(pitch_class: &[i64]) -> Array2<f32> {
    let n_windows = pitch_class.len().div_ceil(HISTOGRAM_HOP);
    let mut out = Array2::<f32>::zeros((12, n_windows));

    for (window, chunk) in pitch_class.chunks(HISTOGRAM_HOP).enumerate() {
        let mut counts = [0.0f32; 12];
        for &v in chunk {
            if (1..=12).contains(&v) {
                counts[(v - 1) as usize] += 1.0;
            }
        }

        let min = counts.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = counts.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;
        if range > 0.0 {
            for (bin, &count) in counts.iter().enumerate() {
                if count != 0.0 {
                    out[(bin, window)] = (count - min) / range;
                }
            }
        }
        // range == 0: the window stays all-zero
    }

    out
}
