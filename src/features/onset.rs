//! Onset strength envelope

use crate::error::{Result, YtfexError};
use crate::features::fft::stft_magnitude;
use ndarray::{Array1, ArrayD};

const N_FFT: usize = 2048;
const HOP_LENGTH: usize = 512;

/// Spectral-flux onset strength: per frame, the sum of positive magnitude
/// increases across frequency bins. 1-D, one value per STFT frame.
pub fn onset_strength(y: &[f32]) -> Result<ArrayD<f32>> {
    if y.is_empty() {
        return Err(YtfexError::feature_error("onset_env", "empty signal"));
    }

    let mag = stft_magnitude(y, N_FFT, HOP_LENGTH);
    let n_freq = mag.shape()[0];
    let n_frames = mag.shape()[1];

    let mut env = Array1::<f32>::zeros(n_frames);
    let mut prev = vec![0.0f32; n_freq];

    for t in 0..n_frames {
        let mut sum = 0.0f32;
        for f in 0..n_freq {
            let m = mag[(f, t)];
            sum += (m - prev[f]).max(0.0);
            prev[f] = m;
        }
        env[t] = sum;
    }

    Ok(env.into_dyn())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onset_env_is_one_dimensional() {
        let y = vec![0.1f32; 22050];
        let env = onset_strength(&y).unwrap();
        assert_eq!(env.ndim(), 1);
        assert_eq!(env.shape()[0], 22050 / HOP_LENGTH + 1);
    }

    #[test]
    fn test_onset_env_peaks_at_impulses() {
        // Clicks every 0.5s at 22050 Hz
        let sr = 22050usize;
        let mut y = vec![0.0f32; sr * 2];
        for click in (0..y.len()).step_by(sr / 2) {
            for i in click..(click + 64).min(y.len()) {
                y[i] = 0.9;
            }
        }
        let env = onset_strength(&y).unwrap();
        let max = env.iter().cloned().fold(0.0f32, f32::max);
        let mean = env.iter().sum::<f32>() / env.len() as f32;
        assert!(max > 4.0 * mean, "onset envelope should be peaky");
    }

    #[test]
    fn test_onset_env_empty_signal_errors() {
        assert!(onset_strength(&[]).is_err());
    }
}
