//! JSON file certificate store.
//!
//! The whole list lives in one file as a pretty-printed JSON array. Reads
//! reload and scan the file; appends rewrite it in full.
//!
//! Appends are serialized by an async mutex and the file is replaced by
//! renaming a sibling temporary file, so concurrent appends never lose
//! records and readers never see a half-written array.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;

use super::types::CertificateRecord;

/// Append-only certificate store backed by a single JSON file.
#[derive(Debug)]
pub struct CertificateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CertificateStore {
    /// Create a store over the given file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the raw entries of the stored array.
    ///
    /// A missing, empty, unreadable or corrupt file, or one whose top level
    /// is not an array, yields an empty list.
    async fn load_entries(&self) -> Vec<Value> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {} does not exist yet", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Error reading {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        if data.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!("{} does not hold a JSON array", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Error parsing {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Load every record.
    ///
    /// Entries that are not objects are skipped here but kept in the file.
    pub async fn load(&self) -> Vec<CertificateRecord> {
        self.load_entries()
            .await
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Skipping store entry in {}: {}", self.path.display(), e);
                    None
                }
            })
            .collect()
    }

    /// Find the first record with the given code.
    pub async fn find(&self, code: &str) -> Option<CertificateRecord> {
        self.load().await.into_iter().find(|c| c.code == code)
    }

    /// Number of entries currently stored.
    pub async fn len(&self) -> usize {
        self.load_entries().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Append a record and rewrite the file.
    ///
    /// Existing entries are written back exactly as they were read.
    pub async fn append(&self, record: CertificateRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load_entries().await;
        entries.push(serde_json::to_value(&record)?);

        let json = serde_json::to_string_pretty(&entries)?;
        self.write_atomic(json.as_bytes()).await?;

        debug!(
            "Wrote {} certificates to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn write_atomic(&self, contents: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| self.io_error(e))?;

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(e));
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
