//! Filesystem-based key-value storage.
//!
//! Each key lives in its own file under the base directory. Batches are
//! committed through a transaction directory:
//!
//! ```text
//! /var/lib/storyloom/
//! ├── story.ndjson
//! ├── cursor.json
//! ├── used_phrases.txt
//! └── .txn/
//!     └── 0190a1b2-...        (one staged batch)
//!         ├── story.ndjson    (new value)
//!         ├── cursor.json     (new value)
//!         └── COMMIT          (manifest; its presence is the commit point)
//! ```
//!
//! A batch becomes durable the moment `COMMIT` is renamed into place. Staged
//! values are then moved over the live files. On open, committed batches that
//! were interrupted are replayed and uncommitted ones are discarded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storyloom_error::{StorageError, StorageErrorKind, StoryloomResult};
use storyloom_interface::{KeyValueStore, StateKey, WriteBatch, WriteOp};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const TXN_DIR: &str = ".txn";
const COMMIT_MARKER: &str = "COMMIT";
const COMMIT_STAGING: &str = "COMMIT.tmp";

/// Ordered list of keys touched by a committed batch.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    ops: Vec<ManifestOp>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestOp {
    key: StateKey,
    remove: bool,
}

/// Filesystem storage backend.
///
/// Callers are expected to serialize writers; concurrent `apply` calls on the
/// same directory are not coordinated.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    /// Open (or create) a store rooted at `base_path`.
    ///
    /// Interrupted batches left behind by a crash are resolved before the
    /// store is returned.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or a committed batch
    /// cannot be replayed.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> StoryloomResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        let store = Self { base_path };
        let replayed = store.recover()?;

        tracing::info!(
            path = %store.base_path.display(),
            replayed,
            "Opened filesystem store"
        );
        Ok(store)
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: StateKey) -> PathBuf {
        self.base_path.join(key.file_name())
    }

    fn txn_root(&self) -> PathBuf {
        self.base_path.join(TXN_DIR)
    }

    /// Replay committed transactions and drop uncommitted ones.
    fn recover(&self) -> StoryloomResult<usize> {
        let root = self.txn_root();
        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    root.display(),
                    e
                )))
                .into());
            }
        };

        // uuid v7 names sort in creation order
        let mut pending: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        pending.sort();

        let mut replayed = 0;
        for txn in pending {
            if txn.join(COMMIT_MARKER).exists() {
                tracing::warn!(txn = %txn.display(), "Replaying interrupted transaction");
                finish_transaction(&self.base_path, &txn)?;
                replayed += 1;
            } else {
                tracing::warn!(txn = %txn.display(), "Discarding uncommitted transaction");
                std::fs::remove_dir_all(&txn).map_err(|e| {
                    StorageError::new(StorageErrorKind::FileWrite(format!(
                        "discard {}: {}",
                        txn.display(),
                        e
                    )))
                })?;
            }
        }
        Ok(replayed)
    }

    /// Write staged values and the commit marker for one batch.
    async fn stage(&self, txn: &Path, ops: &[WriteOp]) -> StoryloomResult<()> {
        tokio::fs::create_dir_all(txn).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                txn.display(),
                e
            )))
        })?;

        for op in ops {
            if let WriteOp::Put { key, value } = op {
                write_synced(&txn.join(key.file_name()), value.as_bytes()).await?;
            }
        }

        let manifest = Manifest {
            ops: ops
                .iter()
                .map(|op| ManifestOp {
                    key: op.key(),
                    remove: matches!(op, WriteOp::Remove { .. }),
                })
                .collect(),
        };
        let encoded = serde_json::to_vec(&manifest).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialization(format!(
                "transaction manifest: {}",
                e
            )))
        })?;

        let staging = txn.join(COMMIT_STAGING);
        write_synced(&staging, &encoded).await?;
        tokio::fs::rename(&staging, txn.join(COMMIT_MARKER))
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "commit {}: {}",
                    txn.display(),
                    e
                )))
            })?;
        Ok(())
    }
}

/// Keep only the last operation per key, in the order those last operations
/// were issued.
fn collapse(ops: Vec<WriteOp>) -> Vec<WriteOp> {
    let mut collapsed: Vec<WriteOp> = Vec::with_capacity(ops.len());
    for op in ops {
        collapsed.retain(|existing| existing.key() != op.key());
        collapsed.push(op);
    }
    collapsed
}

async fn write_synced(path: &Path, data: &[u8]) -> StoryloomResult<()> {
    let write_error = |e: std::io::Error| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    };

    let mut file = tokio::fs::File::create(path).await.map_err(write_error)?;
    file.write_all(data).await.map_err(write_error)?;
    file.sync_all().await.map_err(write_error)?;
    Ok(())
}

/// Move the staged values of a committed transaction into place.
///
/// Idempotent: a value already moved by an earlier, interrupted attempt is
/// skipped.
fn finish_transaction(base: &Path, txn: &Path) -> StoryloomResult<()> {
    let marker = txn.join(COMMIT_MARKER);
    let raw = std::fs::read(&marker).map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            marker.display(),
            e
        )))
    })?;
    let manifest: Manifest = serde_json::from_slice(&raw).map_err(|e| {
        StorageError::new(StorageErrorKind::Corrupt {
            key: marker.display().to_string(),
            message: e.to_string(),
        })
    })?;

    for op in manifest.ops {
        let target = base.join(op.key.file_name());
        if op.remove {
            match std::fs::remove_file(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                        "remove {}: {}",
                        target.display(),
                        e
                    )))
                    .into());
                }
            }
        } else {
            let staged = txn.join(op.key.file_name());
            if staged.exists() {
                std::fs::rename(&staged, &target).map_err(|e| {
                    StorageError::new(StorageErrorKind::FileWrite(format!(
                        "rename {} to {}: {}",
                        staged.display(),
                        target.display(),
                        e
                    )))
                })?;
            }
        }
    }

    std::fs::remove_dir_all(txn).map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "cleanup {}: {}",
            txn.display(),
            e
        )))
    })?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileSystemStore {
    #[tracing::instrument(skip(self), fields(path = %self.base_path.display()))]
    async fn get(&self, key: StateKey) -> StoryloomResult<Option<String>> {
        let path = self.key_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => {
                tracing::debug!(%key, bytes = value.len(), "Read stored value");
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    #[tracing::instrument(skip(self, batch), fields(path = %self.base_path.display(), ops = batch.len()))]
    async fn apply(&self, batch: WriteBatch) -> StoryloomResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let ops = collapse(batch.into_ops());
        let txn = self.txn_root().join(Uuid::now_v7().to_string());

        if let Err(e) = self.stage(&txn, &ops).await {
            let _ = tokio::fs::remove_dir_all(&txn).await;
            return Err(e);
        }

        // Committed: finishing runs to completion even if the caller is cancelled
        let base = self.base_path.clone();
        let finished_txn = txn.clone();
        tokio::task::spawn_blocking(move || finish_transaction(&base, &finished_txn))
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::Unavailable(format!(
                    "transaction {} did not finish: {}",
                    txn.display(),
                    e
                )))
            })??;

        tracing::debug!(ops = ops.len(), "Applied batch");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
