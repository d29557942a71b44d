//! yt-dlp based fetcher

use crate::error::{Result, YtfexError};
use crate::fetch::Fetcher;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Fetcher that downloads the best audio stream via the `yt-dlp` binary and
/// extracts it to mp3
pub struct YtDlpFetcher {
    binary: String,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
        }
    }

    /// Use a different yt-dlp binary (absolute path or name on PATH)
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Output template passed to yt-dlp
///
/// The audio-extraction post-processor appends `.mp3` to the template when
/// the downloaded container has a different extension, so the template must
/// be the destination without its extension or the file lands at
/// `<dest>.mp3.mp3` and the existence re-check fails.
fn output_template(dest: &Path) -> PathBuf {
    dest.with_extension("")
}

impl Fetcher for YtDlpFetcher {
    fn fetch(&self, id: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| YtfexError::FetchError {
                id: id.to_string(),
                reason: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }

        let url = format!("https://www.youtube.com/watch?v={id}");
        debug!("Fetching {} -> {}", url, dest.display());

        let output = Command::new(&self.binary)
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("192K")
            .arg("--output")
            .arg(output_template(dest))
            .arg(&url)
            .output()
            .map_err(|e| YtfexError::FetchError {
                id: id.to_string(),
                reason: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp exited with {} for {}", output.status, id);
            return Err(YtfexError::FetchError {
                id: id.to_string(),
                reason: stderr.lines().last().unwrap_or("yt-dlp failed").to_string(),
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
