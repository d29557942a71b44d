//! ytfex - Batch Audio Fingerprint Feature Extraction
//!
//! A command-line utility that fetches YouTube-sourced audio, decodes it,
//! and extracts a fixed family of research features (constant-Q variants,
//! chroma energy statistics, onset strength, and a melody-derived
//! histogram) into one compressed per-track archive.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `discovery`: Directory scanning, list files, and path rules
//! - `fetch`: Audio acquisition (yt-dlp backed, swappable)
//! - `audio`: Audio decoding and resampling using symphonia
//! - `features`: The feature computers and their shared DSP
//! - `store`: Per-track compressed feature archives
//! - `pipeline`: Per-track processing and parallel orchestration
//!
//! # Example
//!
//! ```no_run
//! use ytfex::config::{Cli, Settings};
//! use ytfex::pipeline;
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["ytfex", "single", "-y", "abc123"]);
//! let settings = Settings::from_cli(&cli).expect("invalid configuration");
//! let result = pipeline::run(&settings).expect("batch failed");
//! println!("Processed {} tracks", result.total);
//! ```

pub mod audio;
pub mod config;
pub mod discovery;
pub mod error;
pub mod features;
pub mod fetch;
pub mod pipeline;
pub mod store;
pub mod types;

// Re-export key types at crate root
pub use error::{Result, YtfexError};
pub use types::{AudioBuffer, TrackOutcome, TrackReport, WorkItem};
