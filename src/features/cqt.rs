//! Constant-Q transform variants
//!
//! A pseudo-CQT: one STFT frame per output column, with log-spaced bins
//! read off the linear spectrum by interpolation and scaled by the ratio of
//! FFT size to the ideal constant-Q filter length. Accurate enough for
//! fingerprinting, much cheaper than a true filterbank CQT.

use crate::error::{Result, YtfexError};
use crate::features::fft::{hann, FftPlan};
use ndarray::{Array2, ArrayD};
use num_complex::Complex32;

/// Minimum CQT center frequency (C1)
const FMIN: f32 = 32.70;
/// Total constant-Q bins (7 octaves)
const N_BINS: usize = 84;
/// Bins per octave
const BINS_PER_OCTAVE: usize = 12;

/// Hop length for `cqt_20` and `cens` at the canonical analysis rate
pub const HOP_LENGTH: usize = 512;

/// Sample rate for the `cqt_ch` variant
pub const CH_SAMPLE_RATE: u32 = 16000;
/// Hop duration for the `cqt_ch` variant (40 ms)
const CH_HOP_SECONDS: f32 = 0.04;

/// Time block size for the `cqt_20` variant
const CQT20_BLOCK: usize = 20;

/// `cqt_20`: CQT magnitude block-averaged along time
///
/// Trailing frames that do not fill a whole block are dropped, matching
/// truncating integer division of the frame count.
pub fn cqt_20(y: &[f32], sample_rate: u32) -> Result<ArrayD<f32>> {
    let mag = cqt_magnitude(y, sample_rate, HOP_LENGTH)
        .map_err(|reason| YtfexError::feature_error("cqt_20", reason))?;

    let (n_bins, n_frames) = (mag.shape()[0], mag.shape()[1]);
    let n_blocks = n_frames / CQT20_BLOCK;
    let mut out = Array2::<f32>::zeros((n_bins, n_blocks));
    for block in 0..n_blocks {
        for bin in 0..n_bins {
            let mut sum = 0.0f32;
            for t in block * CQT20_BLOCK..(block + 1) * CQT20_BLOCK {
                sum += mag[(bin, t)];
            }
            out[(bin, block)] = sum / CQT20_BLOCK as f32;
        }
    }
    Ok(out.into_dyn())
}

/// `cqt_ch`: CQT of the peak-normalized waveform at 16 kHz with a 40 ms hop
///
/// The caller resamples to [`CH_SAMPLE_RATE`] first. Output is time-major
/// (frames x bins).
pub fn cqt_ch(y16: &[f32]) -> Result<ArrayD<f32>> {
    let peak = y16.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
    let scale = 0.999 / peak.max(0.001);
    let normalized: Vec<f32> = y16.iter().map(|&v| v * scale).collect();

    let hop = (CH_HOP_SECONDS * CH_SAMPLE_RATE as f32) as usize;
    let mag = cqt_magnitude(&normalized, CH_SAMPLE_RATE, hop)
        .map_err(|reason| YtfexError::feature_error("cqt_ch", reason))?;

    let time_major = mag.reversed_axes().as_standard_layout().to_owned();
    Ok(time_major.into_dyn())
}

/// CQT magnitude spectrogram, `N_BINS x n_frames`
///
/// Shared by the cqt variants and the CENS chroma.
pub(crate) fn cqt_magnitude(
    y: &[f32],
    sample_rate: u32,
    hop_length: usize,
) -> std::result::Result<Array2<f32>, String> {
    if y.is_empty() {
        return Err("empty signal".to_string());
    }
    if sample_rate == 0 {
        return Err("zero sample rate".to_string());
    }

    // Log-spaced center frequencies
    let freqs: Vec<f32> = (0..N_BINS)
        .map(|b| FMIN * 2.0f32.powf(b as f32 / BINS_PER_OCTAVE as f32))
        .collect();

    // Ideal constant-Q filter length per bin, used for normalization and to
    // size the FFT so the lowest bin is resolved
    let q = 1.0 / (2.0f32.powf(1.0 / BINS_PER_OCTAVE as f32) - 1.0);
    let lengths: Vec<f32> = freqs
        .iter()
        .map(|&f| (sample_rate as f32 * q / f).max(1.0))
        .collect();
    let max_len = lengths.iter().cloned().fold(1.0f32, f32::max) as usize;
    let n_fft = max_len.next_power_of_two().max(512);

    let hop_length = hop_length.max(1);
    let n_frames = if y.len() > n_fft / 2 {
        (y.len() - n_fft / 2) / hop_length + 1
    } else {
        1
    };

    let window = hann(n_fft);
    let plan = FftPlan::new(n_fft);
    let mut out = Array2::<f32>::zeros((N_BINS, n_frames));
    let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];

    for frame in 0..n_frames {
        let center = frame * hop_length + n_fft / 2;
        for (i, b) in buffer.iter_mut().enumerate() {
            let idx = center as isize - (n_fft / 2) as isize + i as isize;
            let sample = if idx >= 0 && (idx as usize) < y.len() {
                y[idx as usize]
            } else {
                0.0
            };
            *b = Complex32::new(sample * window[i], 0.0);
        }
        plan.forward(&mut buffer);

        for (bin, &freq) in freqs.iter().enumerate() {
            // Interpolate the log-spaced bin from neighboring FFT bins
            let fft_bin = freq * n_fft as f32 / sample_rate as f32;
            let low = fft_bin.floor() as usize;
            let high = (low + 1).min(n_fft / 2);
            let frac = fft_bin - low as f32;

            let value = if low < n_fft / 2 {
                let v = buffer[low] * (1.0 - frac) + buffer[high] * frac;
                v.norm()
            } else {
                0.0
            };

            let scale = (n_fft as f32 / lengths[bin]).sqrt();
            out[(bin, frame)] = value * scale;
        }
    }

    Ok(out)
}
