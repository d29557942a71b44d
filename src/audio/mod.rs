//! Audio decoding

mod decoder;

pub use decoder::{decode, decode_at, resample, ANALYSIS_SAMPLE_RATE, MELODY_SAMPLE_RATE};
