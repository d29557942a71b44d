//! FFT plan caching and STFT magnitude helper

use ndarray::Array2;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Cached forward FFT plan for one transform size
pub struct FftPlan {
    forward: Arc<dyn Fft<f32>>,
}

impl FftPlan {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(len),
        }
    }

    /// In-place forward transform; `buffer` must match the planned length
    pub fn forward(&self, buffer: &mut [Complex32]) {
        self.forward.process(buffer);
    }
}

/// Hann window of the given length
pub fn hann(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (len - 1) as f32).cos()))
        .collect()
}

/// Magnitude STFT with a Hann window, centered frames zero-padded at the
/// signal edges
///
/// Returns `(n_fft / 2 + 1) x n_frames`.
pub fn stft_magnitude(y: &[f32], n_fft: usize, hop_length: usize) -> Array2<f32> {
    let hop_length = hop_length.max(1);
    let n_freq = n_fft / 2 + 1;
    if y.is_empty() || n_fft == 0 {
        return Array2::zeros((n_freq, 0));
    }

    let n_frames = y.len() / hop_length + 1;
    let window = hann(n_fft);
    let plan = FftPlan::new(n_fft);
    let mut out = Array2::zeros((n_freq, n_frames));
    let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];

    for frame in 0..n_frames {
        let center = frame * hop_length;
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
        for f in 0..n_freq {
            out[(f, frame)] = buffer[f].norm();
        }
    }

    out
}
