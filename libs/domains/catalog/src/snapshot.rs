//! JSON persistence for the retrieval store.
//!
//! A snapshot stores one entry per position holding both the vector and its
//! record, so the pairing survives a round trip by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::error::{CatalogError, CatalogResult};
use crate::models::CatalogRecord;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub vector: Vec<f32>,
    pub record: CatalogRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: u32,
    pub dimension: usize,
    pub saved_at: DateTime<Utc>,
    pub entries: Vec<SnapshotEntry>,
}

impl CatalogSnapshot {
    pub fn new(dimension: usize, entries: Vec<SnapshotEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            dimension,
            saved_at: Utc::now(),
            entries,
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CatalogError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if let Some((position, entry)) = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.vector.len() != self.dimension)
        {
            return Err(CatalogError::Snapshot(format!(
                "entry {} has {} components, expected {}",
                position,
                entry.vector.len(),
                self.dimension
            )));
        }
        Ok(())
    }

    /// Write the snapshot atomically: serialize to a sibling temp file, then rename.
    pub async fn save(&self, path: &Path) -> CatalogResult<()> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| CatalogError::Snapshot(format!("serialize failed: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory", parent, e))?;
        }

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_error("write", &tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error("rename", path, e));
        }

        info!(
            path = %path.display(),
            entries = self.entries.len(),
            "Catalog snapshot saved"
        );
        Ok(())
    }

    /// Load a snapshot, or `None` if `path` does not exist.
    pub async fn load(path: &Path) -> CatalogResult<Option<Self>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", path, e)),
        };

        let snapshot: CatalogSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            CatalogError::Snapshot(format!("{} is not a valid snapshot: {}", path.display(), e))
        })?;
        snapshot.validate()?;

        info!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            saved_at = %snapshot.saved_at,
            "Catalog snapshot loaded"
        );
        Ok(Some(snapshot))
    }
}

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Sibling temp file, unique per save within and across processes.
fn temp_path(path: &Path) -> PathBuf {
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.tmp", std::process::id(), sequence));
    path.with_file_name(name)
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CatalogError {
    CatalogError::Snapshot(format!("{} {}: {}", action, path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("catalog-snapshot-{}-{}", std::process::id(), name))
            .join("catalog.json")
    }

    fn sample() -> CatalogSnapshot {
        CatalogSnapshot::new(
            2,
            vec![
                SnapshotEntry {
                    vector: vec![0.25, -1.0],
                    record: CatalogRecord::new("Orders", "customer order history"),
                },
                SnapshotEntry {
                    vector: vec![3.0, 4.0],
                    record: CatalogRecord {
                        cve_id: "CVE-2024-0001".to_string(),
                        ..CatalogRecord::new("Users", "user accounts")
                    },
                },
            ],
        )
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = scratch_path("roundtrip");
        let snapshot = sample();

        snapshot.save(&path).await.unwrap();
        let loaded = CatalogSnapshot::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .map(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let path = Path::new("/var/lib/catalog/store.json");
        let first = temp_path(path);
        let second = temp_path(path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let path = scratch_path("missing");
        assert!(CatalogSnapshot::load(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let path = scratch_path("garbage");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            CatalogSnapshot::load(&path).await,
            Err(CatalogError::Snapshot(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_validate_rejects_wrong_vector_length() {
        let mut snapshot = sample();
        snapshot.entries[1].vector.push(0.0);
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_validate_rejects_unknown_version() {
        let mut snapshot = sample();
        snapshot.version = 99;
        assert!(snapshot.validate().is_err());
    }
}
