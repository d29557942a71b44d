//! Recursive audio file scanning

use crate::discovery::paths::{self, FEATURES_DIR};
use crate::error::{Result, YtfexError};
use crate::types::WorkItem;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions accepted by the directory scanner
///
/// Fetched tracks are always mp3, but a pre-populated audio tree may carry
/// other formats symphonia can decode.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aiff", "aif"];

/// Scan a directory tree for audio files and resolve their work items
///
/// Files below the feature container tree (`audio_features/`) are skipped so
/// a scan of the base directory never picks up its own outputs.
pub fn scan(root: &Path) -> Result<Vec<WorkItem>> {
    if !root.exists() {
        return Err(YtfexError::FileNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(YtfexError::ConfigError(format!(
            "scan root is not a directory: {}",
            root.display()
        )));
    }

    let mut items = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !has_audio_extension(path) {
            continue;
        }
        if is_under_features_dir(root, path) {
            continue;
        }
        match paths::output_path_for_file(root, path) {
            Some(output) => {
                debug!("Discovered: {}", path.display());
                items.push(WorkItem::new(path, output));
            }
            None => warn!("Cannot derive output path for {}", path.display()),
        }
    }

    info!("Discovered {} audio files under {}", items.len(), root.display());

    if items.is_empty() {
        warn!("No supported audio files found in {}", root.display());
    }

    Ok(items)
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            AUDIO_EXTENSIONS.iter().any(|&a| a == ext)
        })
        .unwrap_or(false)
}

fn is_under_features_dir(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rel| rel.iter().any(|c| c == FEATURES_DIR))
        .unwrap_or(false)
}
