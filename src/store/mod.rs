//! Per-track feature store
//!
//! One compressed `.npz` archive per track, each feature under its key as an
//! independent named dataset. Absence of a key is the signal to recompute;
//! presence means skip. Writes go through a temp file and an atomic rename so
//! a crash mid-write never leaves a torn archive behind.

use crate::error::{Result, YtfexError};
use ndarray::ArrayD;
use ndarray_npy::{NpzReader, NpzWriter};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub struct FeatureStore {
    path: PathBuf,
    entries: BTreeMap<String, ArrayD<f32>>,
}

impl FeatureStore {
    /// Open a store, loading any datasets already on disk. A missing file is
    /// an empty store; the archive is only created on the first write.
    pub fn open(path: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();

        if path.exists() {
            let file = File::open(path)
                .map_err(|e| YtfexError::store_error(path, e.to_string()))?;
            let mut reader = NpzReader::new(file)
                .map_err(|e| YtfexError::store_error(path, e.to_string()))?;
            let names = reader
                .names()
                .map_err(|e| YtfexError::store_error(path, e.to_string()))?;
            for name in names {
                let array: ArrayD<f32> = reader
                    .by_name(&name)
                    .map_err(|e| YtfexError::store_error(path, e.to_string()))?;
                // NpzReader reports the inner member names with their .npy
                // suffix; keys are stored without it
                let key = name.strip_suffix(".npy").unwrap_or(&name).to_string();
                entries.insert(key, array);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Drop a dataset and persist the remaining ones
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    /// Write a dataset under `key`, persisting the whole archive
    pub fn write(&mut self, key: &str, array: &ArrayD<f32>) -> Result<()> {
        self.entries.insert(key.to_string(), array.clone());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| YtfexError::store_error(parent, e.to_string()))?;
        }

        let tmp = self.path.with_extension("npz.tmp");
        {
            let file = File::create(&tmp)
                .map_err(|e| YtfexError::store_error(&tmp, e.to_string()))?;
            let mut writer = NpzWriter::new_compressed(file);
            for (key, array) in &self.entries {
                writer
                    .add_array(key.as_str(), array)
                    .map_err(|e| YtfexError::store_error(&self.path, e.to_string()))?;
            }
            writer
                .finish()
                .map_err(|e| YtfexError::store_error(&self.path, e.to_string()))?;
        }
        fs::rename(&tmp, &self.path)
            .map_err(|e| YtfexError::store_error(&self.path, e.to_string()))?;
        Ok(())
    }
}
