//! Deterministic path derivation
//!
//! Work item paths are a pure function of `(base_dir, track id)`:
//!
//! - shard: the decimal Unicode scalar value of the id's first character,
//!   which bounds directory fan-out without any extra state
//! - input:  `<base>/<shard>/<id>.mp3`
//! - output: `<base>/audio_features/<shard>/<id>.npz`
//!
//! The directory-scan entry point applies the same rule relative to the scan
//! root, so both entry points derive identical paths for the same file.

use std::path::{Path, PathBuf};

/// Audio file extension used for fetched tracks
pub const AUDIO_EXT: &str = "mp3";

/// Feature container extension
pub const STORE_EXT: &str = "npz";

/// Directory segment holding feature containers, sibling to the shards
pub const FEATURES_DIR: &str = "audio_features";

/// Shard directory name for a track identifier
///
/// Returns `None` for an empty identifier.
pub fn shard(id: &str) -> Option<String> {
    id.chars().next().map(|c| (c as u32).to_string())
}

/// Input audio path for a track identifier under a base directory
pub fn input_path(base_dir: &Path, id: &str) -> Option<PathBuf> {
    let shard = shard(id)?;
    Some(base_dir.join(shard).join(format!("{id}.{AUDIO_EXT}")))
}

/// Output container path for a track identifier under a base directory
pub fn output_path(base_dir: &Path, id: &str) -> Option<PathBuf> {
    let shard = shard(id)?;
    Some(
        base_dir
            .join(FEATURES_DIR)
            .join(shard)
            .join(format!("{id}.{STORE_EXT}")),
    )
}

/// Output container path for an audio file discovered under a scan root
///
/// The file's path relative to the root is mirrored below
/// `<root>/audio_features/` with the extension swapped, matching the
/// id-based rule when the layout is `<root>/<shard>/<id>.mp3`.
pub fn output_path_for_file(root: &Path, file: &Path) -> Option<PathBuf> {
    let rel = file.strip_prefix(root).ok()?;
    let mut out = root.join(FEATURES_DIR).join(rel);
    out.set_extension(STORE_EXT);
    Some(out)
}
