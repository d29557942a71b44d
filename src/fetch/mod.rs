//! Audio fetching
//!
//! The fetcher resolves an opaque track identifier to a local audio file.
//! It is a trait so the pipeline can be exercised without network access;
//! the production implementation shells out to `yt-dlp`.

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use crate::error::Result;
use std::path::Path;

/// Audio fetching backend
///
/// Success is signaled by the file existing at `dest` afterwards; a fetcher
/// may return `Ok` without producing a file (an unavailable video), so
/// callers must re-check existence after the call.
pub trait Fetcher: Send + Sync {
    /// Materialize the audio for `id` at `dest`
    fn fetch(&self, id: &str, dest: &Path) -> Result<()>;

    /// Get the name of this fetcher (for logging)
    fn name(&self) -> &'static str;
}
