//! Resolved run settings
//!
//! The CLI surface is parsed by clap; this module turns it into a validated
//! `Settings` value the pipeline consumes. Unknown feature keys fail fast
//! here, before any work starts.

use crate::config::cli::{Cli, Command};
use crate::error::{Result, YtfexError};
use crate::features::{self, FeatureKind};
use std::path::PathBuf;

/// Where the batch's work items come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkSource {
    /// Scan a directory tree for audio files
    Directory(PathBuf),
    /// Read identifiers from a list file
    List(PathBuf),
    /// One identifier from the command line
    Single(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source: WorkSource,
    pub base_dir: PathBuf,
    pub features: Vec<FeatureKind>,
    pub parallel: bool,
    pub threads: usize,
    pub force: bool,
    pub delimiter: Option<u8>,
    pub show_progress: bool,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let features = if cli.features.is_empty() {
            FeatureKind::ALL.to_vec()
        } else {
            features::parse_keys(&cli.features)?
        };

        let (source, delimiter) = match &cli.command {
            Command::Dir => (WorkSource::Directory(cli.input_dir.clone()), None),
            Command::List {
                list_file,
                delimiter,
            } => {
                let delimiter = match delimiter {
                    Some(c) if c.is_ascii() => Some(*c as u8),
                    Some(c) => {
                        return Err(YtfexError::ConfigError(format!(
                            "delimiter must be a single ASCII character, got '{c}'"
                        )))
                    }
                    None => None,
                };
                (WorkSource::List(list_file.clone()), delimiter)
            }
            Command::Single { yt_id } => {
                if yt_id.trim().is_empty() {
                    return Err(YtfexError::ConfigError(
                        "track identifier must not be empty".into(),
                    ));
                }
                (WorkSource::Single(yt_id.trim().to_string()), None)
            }
        };

        Ok(Self {
            source,
            base_dir: cli.input_dir.clone(),
            features,
            parallel: !cli.serial,
            threads: cli.threads,
            force: cli.force,
            delimiter,
            show_progress: !cli.no_progress && !cli.quiet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_select_all_features() {
        let cli = Cli::parse_from(["ytfex", "dir"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.features, FeatureKind::ALL.to_vec());
        assert!(settings.parallel);
        assert!(!settings.force);
    }

    #[test]
    fn test_unknown_feature_key_fails_fast() {
        let cli = Cli::parse_from(["ytfex", "dir", "--features", "cens,spectrogram"]);
        let result = Settings::from_cli(&cli);
        assert!(matches!(result, Err(YtfexError::ConfigError(_))));
    }

    #[test]
    fn test_feature_subset_parses() {
        let cli = Cli::parse_from(["ytfex", "single", "-y", "abc123", "--features", "cens,melodia"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(
            settings.features,
            vec![FeatureKind::Cens, FeatureKind::Melodia]
        );
        assert_eq!(settings.source, WorkSource::Single("abc123".into()));
    }

    #[test]
    fn test_list_delimiter_maps_to_byte() {
        let cli = Cli::parse_from(["ytfex", "list", "-l", "ids.csv", "--delimiter", ";"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.delimiter, Some(b';'));
        assert_eq!(settings.source, WorkSource::List("ids.csv".into()));
    }

    #[test]
    fn test_empty_single_id_is_config_error() {
        let cli = Cli::parse_from(["ytfex", "single", "-y", "  "]);
        assert!(matches!(
            Settings::from_cli(&cli),
            Err(YtfexError::ConfigError(_))
        ));
    }

    #[test]
    fn test_serial_flag_disables_parallelism() {
        let cli = Cli::parse_from(["ytfex", "dir", "--serial"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert!(!settings.parallel);
    }
}
