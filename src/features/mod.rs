//! Fingerprint feature computers
//!
//! Each [`FeatureKind`] maps to one computation strategy. The set is closed:
//! unknown key strings are rejected when the configuration is parsed, so a
//! typo fails fast instead of silently producing nothing.
//!
//! Kinds split into two groups. Buffer-based kinds work on the shared
//! decoded waveform; path-based kinds (`melodia`) re-read the file because
//! their pipeline performs its own decode at a different rate. The split is
//! deliberate and must stay: path-based kinds never reuse the shared buffer.

pub mod cens;
pub mod cqt;
mod fft;
pub mod melody;
pub mod onset;

use crate::error::{Result, YtfexError};
use crate::types::AudioBuffer;
use ndarray::ArrayD;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The closed set of feature kinds this crate can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Constant-Q magnitude, block-averaged along time (block size 20)
    Cqt20,
    /// Constant-Q on the peak-normalized waveform at 16 kHz, 40 ms hop
    CqtCh,
    /// Chroma energy normalized statistics
    Cens,
    /// Onset strength envelope
    OnsetEnv,
    /// Melody-derived chroma histogram (path-based)
    Melodia,
}

impl FeatureKind {
    /// All kinds, in default extraction order
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::CqtCh,
        FeatureKind::Cqt20,
        FeatureKind::Cens,
        FeatureKind::OnsetEnv,
        FeatureKind::Melodia,
    ];

    /// Stable dataset key inside the feature container
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Cqt20 => "cqt_20",
            FeatureKind::CqtCh => "cqt_ch",
            FeatureKind::Cens => "cens",
            FeatureKind::OnsetEnv => "onset_env",
            FeatureKind::Melodia => "melodia",
        }
    }

    /// Whether this kind reads the original file instead of the shared buffer
    pub fn is_path_based(self) -> bool {
        matches!(self, FeatureKind::Melodia)
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = YtfexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cqt_20" => Ok(FeatureKind::Cqt20),
            "cqt_ch" => Ok(FeatureKind::CqtCh),
            "cens" => Ok(FeatureKind::Cens),
            "onset_env" => Ok(FeatureKind::OnsetEnv),
            "melodia" => Ok(FeatureKind::Melodia),
            other => Err(YtfexError::ConfigError(format!(
                "unknown feature key '{other}' (expected one of: cqt_20, cqt_ch, cens, onset_env, melodia)"
            ))),
        }
    }
}

/// Parse a comma-separated feature key list, failing fast on unknown keys
pub fn parse_keys(keys: &[String]) -> Result<Vec<FeatureKind>> {
    keys.iter().map(|k| k.trim().parse()).collect()
}

/// Compute one feature for a track
///
/// `buffer` is the shared decode at the canonical analysis rate;
/// `input_path` is only read by path-based kinds.
pub fn compute(kind: FeatureKind, buffer: &AudioBuffer, input_path: &Path) -> Result<ArrayD<f32>> {
    match kind {
        FeatureKind::Cqt20 => cqt::cqt_20(&buffer.samples, buffer.sample_rate),
        FeatureKind::CqtCh => {
            let y16 = crate::audio::resample(&buffer.samples, buffer.sample_rate, cqt::CH_SAMPLE_RATE);
            cqt::cqt_ch(&y16)
        }
        FeatureKind::Cens => cens::chroma_cens(&buffer.samples, buffer.sample_rate),
        FeatureKind::OnsetEnv => onset::onset_strength(&buffer.samples),
        FeatureKind::Melodia => melody::compute(input_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for kind in FeatureKind::ALL {
            assert_eq!(kind.as_str().parse::<FeatureKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_key_fails_fast() {
        let result = "mfcc".parse::<FeatureKind>();
        assert!(matches!(result, Err(YtfexError::ConfigError(_))));
    }

    #[test]
    fn test_parse_keys_trims() {
        let keys = vec!["cqt_20".to_string(), " cens ".to_string()];
        let parsed = parse_keys(&keys).unwrap();
        assert_eq!(parsed, vec![FeatureKind::Cqt20, FeatureKind::Cens]);
    }

    #[test]
    fn test_path_based_split() {
        assert!(FeatureKind::Melodia.is_path_based());
        assert!(!FeatureKind::Cqt20.is_path_based());
        assert!(!FeatureKind::Cens.is_path_based());
    }
}
