//! Persisted-state layer: one JSON config record and one ABI sidecar per
//! strategy, written through an injected storage backend.

pub mod artifact_store;
pub mod config_store;

pub use artifact_store::{ArtifactStore, ContractArtifact};
pub use config_store::{ConfigStore, StrategyConfig};

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::registry::Strategy;

/// Storage backend for persisted per-strategy state.
///
/// Keys are relative file names (e.g. `config/arbitrage_config.json`).
/// `write` must be all-or-nothing: a reader never observes a truncated value.
#[async_trait]
pub trait StateBackend: Send + Sync + 'static {
    /// Read the full value for `name`, or `None` when no record exists.
    async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace the value for `name` in full.
    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Filesystem backend rooted at the data directory.
///
/// Writes go to a uniquely named temp file in the target directory followed by
/// a rename, so a crash mid-write never leaves a partial record visible.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl StateBackend for FileBackend {
    async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(name);
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
        // create_dir_all tolerates a concurrent create of the same directory.
        tokio::fs::create_dir_all(parent).await?;

        let tmp = parent.join(format!(
            ".{}.tmp-{}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Uuid::new_v4().simple()
        ));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(name).cloned())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.entries
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Named async locks keyed by strategy.
///
/// The persist step of a deployment run holds this lock so that config update
/// and artifact save commit as a unit per strategy; different strategies never
/// contend.
#[derive(Default)]
pub struct StrategyLocks {
    locks: DashMap<Strategy, Arc<Mutex<()>>>,
}

impl StrategyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, strategy: Strategy) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(strategy)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("config/a.json").await.unwrap(), None);
        backend.write("config/a.json", b"{}").await.unwrap();
        assert_eq!(
            backend.read("config/a.json").await.unwrap(),
            Some(b"{}".to_vec())
        );
    }

    #[tokio::test]
    async fn file_backend_creates_directories_and_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());

        backend.write("config/a.json", b"first").await.unwrap();
        backend.write("config/a.json", b"second").await.unwrap();
        assert_eq!(
            backend.read("config/a.json").await.unwrap(),
            Some(b"second".to_vec())
        );

        // No temp files left behind after successful writes.
        let mut entries = tokio::fs::read_dir(dir.path().join("config")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["a.json".to_string()]);
    }

    #[tokio::test]
    async fn strategy_locks_serialize_same_strategy_only() {
        let locks = Arc::new(StrategyLocks::new());

        let guard = locks.acquire(Strategy::Arbitrage).await;
        // A different strategy's lock is immediately available.
        let other = locks.acquire(Strategy::Hft).await;
        drop(other);

        // The same strategy's lock is held.
        let locks2 = locks.clone();
        let contended = tokio::spawn(async move {
            let _g = locks2.acquire(Strategy::Arbitrage).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!contended.is_finished());

        drop(guard);
        contended.await.unwrap();
    }
}
