//! End-to-end pipeline tests
//!
//! These run the real batch pipeline over WAV fixtures on disk, with the
//! fetcher swapped for test doubles. Symphonia probes files by content, so
//! fixtures written with the `.mp3` extension the path rules expect still
//! decode.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use ytfex::config::{Settings, WorkSource};
use ytfex::error::{Result, YtfexError};
use ytfex::features::FeatureKind;
use ytfex::fetch::Fetcher;
use ytfex::pipeline;
use ytfex::store::FeatureStore;

fn write_sine_wav(path: &Path, freq: f32, seconds: f32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let n = (44100.0 * seconds) as usize;
    for i in 0..n {
        let v = (2.0 * PI * freq * i as f32 / 44100.0).sin();
        writer
            .write_sample((v * i16::MAX as f32 * 0.5) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

/// Materializes a sine fixture for every requested id and counts calls
struct FixtureFetcher {
    calls: AtomicUsize,
}

impl FixtureFetcher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Fetcher for FixtureFetcher {
    fn fetch(&self, _id: &str, dest: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        write_sine_wav(dest, 440.0, 2.0);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, id: &str, _dest: &Path) -> Result<()> {
        Err(YtfexError::FetchError {
            id: id.to_string(),
            reason: "offline".into(),
        })
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

fn settings(base: &Path, source: WorkSource, features: Vec<FeatureKind>) -> Settings {
    Settings {
        source,
        base_dir: base.to_path_buf(),
        features,
        parallel: false,
        threads: 1,
        force: false,
        delimiter: None,
        show_progress: false,
    }
}

fn output_for(base: &Path, id: &str) -> PathBuf {
    let shard = (id.chars().next().unwrap() as u32).to_string();
    base.join("audio_features")
        .join(shard)
        .join(format!("{id}.npz"))
}

#[test]
fn test_single_id_fetches_and_writes_all_features() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let fetcher = Arc::new(FixtureFetcher::new());

    let settings = settings(
        base,
        WorkSource::Single("abc123".into()),
        FeatureKind::ALL.to_vec(),
    );
    let result = pipeline::run_with(&settings, fetcher.clone()).unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.succeeded, 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    // Shard of 'a' is its decimal scalar value, 97
    let output = output_for(base, "abc123");
    assert_eq!(output, base.join("audio_features/97/abc123.npz"));
    let store = FeatureStore::open(&output).unwrap();
    for key in ["cqt_20", "cqt_ch", "cens", "onset_env", "melodia"] {
        assert!(store.contains(key), "missing feature {key}");
    }
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let fetcher = Arc::new(FixtureFetcher::new());

    let settings = settings(
        base,
        WorkSource::Single("abc123".into()),
        vec![FeatureKind::OnsetEnv, FeatureKind::Cens],
    );
    pipeline::run_with(&settings, fetcher.clone()).unwrap();
    let first_mtime = std::fs::metadata(output_for(base, "abc123"))
        .unwrap()
        .modified()
        .unwrap();

    // Audio and features are in place: the second run neither refetches nor
    // rewrites the archive
    let result = pipeline::run_with(&settings, fetcher.clone()).unwrap();
    assert_eq!(result.succeeded, 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    let second_mtime = std::fs::metadata(output_for(base, "abc123"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(first_mtime, second_mtime);
}

#[test]
fn test_force_is_scoped_to_requested_keys() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let fetcher = Arc::new(FixtureFetcher::new());

    let mut all = settings(
        base,
        WorkSource::Single("abc123".into()),
        vec![FeatureKind::OnsetEnv, FeatureKind::Cens],
    );
    pipeline::run_with(&all, fetcher.clone()).unwrap();

    // Force a rerun of onset_env only; cens stays in the archive untouched
    all.features = vec![FeatureKind::OnsetEnv];
    all.force = true;
    let result = pipeline::run_with(&all, fetcher.clone()).unwrap();
    assert_eq!(result.succeeded, 1);

    let store = FeatureStore::open(&output_for(base, "abc123")).unwrap();
    assert!(store.contains("onset_env"));
    assert!(store.contains("cens"));
}

#[test]
fn test_list_run_deduplicates_ids() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let list = base.join("ids.txt");
    std::fs::write(&list, "abc\nxyz\nabc\n").unwrap();
    let fetcher = Arc::new(FixtureFetcher::new());

    let settings = settings(
        base,
        WorkSource::List(list),
        vec![FeatureKind::OnsetEnv],
    );
    let result = pipeline::run_with(&settings, fetcher).unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.succeeded, 2);
    assert!(output_for(base, "abc").exists());
    assert!(output_for(base, "xyz").exists());
}

#[test]
fn test_csv_list_with_yt_id_column() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let list = base.join("ids.csv");
    std::fs::write(&list, "title,yt_id\nSong A,aaa\nSong B,bbb\n").unwrap();
    let fetcher = Arc::new(FixtureFetcher::new());

    let settings = settings(base, WorkSource::List(list), vec![FeatureKind::OnsetEnv]);
    let result = pipeline::run_with(&settings, fetcher).unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.succeeded, 2);
}

#[test]
fn test_directory_scan_matches_id_paths() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    // Lay the audio out the way the path rules shard it
    let audio = base.join("97").join("abc.mp3");
    write_sine_wav(&audio, 330.0, 2.0);
    let fetcher = Arc::new(FixtureFetcher::new());

    let settings = settings(
        base,
        WorkSource::Directory(base.to_path_buf()),
        vec![FeatureKind::OnsetEnv],
    );
    let result = pipeline::run_with(&settings, fetcher.clone()).unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.succeeded, 1);
    // The file was already on disk, so nothing was fetched
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert!(output_for(base, "abc").exists());
}

#[test]
fn test_fetch_failures_do_not_halt_the_batch() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    // One id already has audio on disk, two need a (failing) fetch
    write_sine_wav(&base.join("97").join("aaa.mp3"), 440.0, 2.0);
    let list = base.join("ids.txt");
    std::fs::write(&list, "aaa\nbbb\nccc\n").unwrap();

    let settings = settings(base, WorkSource::List(list), vec![FeatureKind::OnsetEnv]);
    let result = pipeline::run_with(&settings, Arc::new(OfflineFetcher)).unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed, 2);
    assert!(output_for(base, "aaa").exists());
    assert!(!output_for(base, "bbb").exists());
}

#[test]
fn test_parallel_run_produces_same_archives() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let list = base.join("ids.txt");
    std::fs::write(&list, "aaa\nbbb\nccc\nddd\n").unwrap();

    let mut settings = settings(base, WorkSource::List(list), vec![FeatureKind::OnsetEnv]);
    settings.parallel = true;
    settings.threads = 2;
    let result = pipeline::run_with(&settings, Arc::new(FixtureFetcher::new())).unwrap();
    assert_eq!(result.total, 4);
    assert_eq!(result.succeeded, 4);
    for id in ["aaa", "bbb", "ccc", "ddd"] {
        let store = FeatureStore::open(&output_for(base, id)).unwrap();
        assert!(store.contains("onset_env"));
    }
}

#[test]
fn test_missing_list_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let settings = settings(
        base,
        WorkSource::List(base.join("nope.txt")),
        vec![FeatureKind::OnsetEnv],
    );
    let result = pipeline::run_with(&settings, Arc::new(OfflineFetcher));
    assert!(matches!(result, Err(YtfexError::WorklistError { .. })));
}
