//! Chroma energy normalized statistics (CENS)
//!
//! CQT magnitudes folded into 12 pitch classes, then made robust against
//! dynamics and timbre: per-frame L1 normalization, coarse quantization,
//! temporal smoothing, and per-frame L2 normalization.

use crate::error::{Result, YtfexError};
use crate::features::cqt;
use crate::features::fft::hann;
use ndarray::{Array2, ArrayD};

/// Quantization thresholds and the weight added for exceeding each
const QUANT_STEPS: [f32; 4] = [0.4, 0.2, 0.1, 0.05];
const QUANT_WEIGHT: f32 = 0.25;

/// Temporal smoothing window length in frames
const SMOOTH_LEN: usize = 41;

const N_CHROMA: usize = 12;

/// CENS chroma, `12 x n_frames`, at the standard 512-sample hop
pub fn chroma_cens(y: &[f32], sample_rate: u32) -> Result<ArrayD<f32>> {
    let mag = cqt::cqt_magnitude(y, sample_rate, cqt::HOP_LENGTH)
        .map_err(|reason| YtfexError::feature_error("cens", reason))?;

    let n_frames = mag.shape()[1];
    let mut chroma = Array2::<f32>::zeros((N_CHROMA, n_frames));

    // Fold CQT bins into pitch classes; bin 0 is C1, so class = bin % 12
    for bin in 0..mag.shape()[0] {
        let class = bin % N_CHROMA;
        for t in 0..n_frames {
            chroma[(class, t)] += mag[(bin, t)];
        }
    }

    // Per-frame L1 normalization; silent frames stay zero
    for t in 0..n_frames {
        let sum: f32 = (0..N_CHROMA).map(|c| chroma[(c, t)]).sum();
        if sum > 0.0 {
            for c in 0..N_CHROMA {
                chroma[(c, t)] /= sum;
            }
        }
    }

    // Coarse quantization
    for value in chroma.iter_mut() {
        let mut quantized = 0.0;
        for &step in &QUANT_STEPS {
            if *value > step {
                quantized += QUANT_WEIGHT;
            }
        }
        *value = quantized;
    }

    let smoothed = smooth_time(&chroma, SMOOTH_LEN);

    // Per-frame L2 normalization
    let mut out = smoothed;
    for t in 0..n_frames {
        let norm: f32 = (0..N_CHROMA)
            .map(|c| out[(c, t)] * out[(c, t)])
            .sum::<f32>()
            .sqrt();
        if norm > 0.0 {
            for c in 0..N_CHROMA {
                out[(c, t)] /= norm;
            }
        }
    }

    Ok(out.into_dyn())
}

/// Convolve each row with a normalized Hann window, same-length output
fn smooth_time(chroma: &Array2<f32>, win_len: usize) -> Array2<f32> {
    let n_frames = chroma.shape()[1];
    if win_len < 2 || n_frames == 0 {
        return chroma.clone();
    }

    let window = hann(win_len);
    let win_sum: f32 = window.iter().sum();
    let half = win_len / 2;
    let mut out = Array2::<f32>::zeros(chroma.raw_dim());

    for c in 0..chroma.shape()[0] {
        for t in 0..n_frames {
            let mut acc = 0.0f32;
            for (k, &w) in window.iter().enumerate() {
                let idx = t as isize + k as isize - half as isize;
                if idx >= 0 && (idx as usize) < n_frames {
                    acc += w * chroma[(c, idx as usize)];
                }
            }
            out[(c, t)] = acc / win_sum;
        }
    }

    out
}
