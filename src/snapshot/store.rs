//! Snapshot Store: the two hand-off files shared with external programs
//!
//! Each file has its own async mutex so at most one writer touches it at a
//! time inside this process. Writes land in a sibling temp file first and are
//! renamed into place, so a reader sees either the old file or the new one.
//! Nothing stops an external process (the analyzer) from writing the output
//! file concurrently; the last write wins.

use crate::config::BridgeConfig;
use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Owner of the input snapshot and output result paths
#[derive(Debug)]
pub struct SnapshotStore {
    base_dir: PathBuf,
    input_path: PathBuf,
    output_path: PathBuf,
    input_lock: Mutex<()>,
    output_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            input_path: config.input_path(),
            output_path: config.output_path(),
            input_lock: Mutex::new(()),
            output_lock: Mutex::new(()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub async fn input_exists(&self) -> bool {
        tokio::fs::try_exists(&self.input_path).await.unwrap_or(false)
    }

    /// Raw input snapshot text, or `None` when nothing has been exported
    pub async fn read_input(&self) -> Result<Option<String>> {
        read_optional(&self.input_path).await
    }

    /// Raw output text, or `None` when nothing has been written
    pub async fn read_output(&self) -> Result<Option<String>> {
        read_optional(&self.output_path).await
    }

    /// Replace the input snapshot wholesale
    pub async fn write_input(&self, bytes: &[u8]) -> Result<()> {
        let _guard = self.input_lock.lock().await;
        write_atomic(&self.input_path, bytes).await
    }

    /// Replace the output file wholesale
    pub async fn write_output(&self, bytes: &[u8]) -> Result<()> {
        let _guard = self.output_lock.lock().await;
        write_atomic(&self.output_path, bytes).await
    }

    /// Hold the output file against in-process writers
    pub async fn lock_output(&self) -> MutexGuard<'_, ()> {
        self.output_lock.lock().await
    }

    /// Delete the output file so the next reader only sees a fresh write
    pub async fn remove_output(&self) -> std::io::Result<()> {
        let _guard = self.output_lock.lock().await;
        match tokio::fs::remove_file(&self.output_path).await {
            Ok(()) => {
                debug!("Removed stale output {:?}", self.output_path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Delete both files if present; failures are logged and swallowed
    pub async fn cleanup(&self) {
        let _input = self.input_lock.lock().await;
        let _output = self.output_lock.lock().await;

        for path in [&self.input_path, &self.output_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!("Removed {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {:?}: {}", path, e),
            }
        }
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::new(&BridgeConfig::for_base_dir(dir.path()))
    }

    #[tokio::test]
    async fn test_missing_files_read_as_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(!store.input_exists().await);
        assert!(store.read_input().await.unwrap().is_none());
        assert!(store.read_output().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_wholesale() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.write_input(b"{\"a\": \"a much longer first document\"}").await.unwrap();
        store.write_input(b"{}").await.unwrap();

        assert_eq!(store.read_input().await.unwrap().as_deref(), Some("{}"));
        assert!(!store.input_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_creates_base_dir() {
        let dir = TempDir::new().unwrap();
        let config = BridgeConfig::for_base_dir(dir.path().join("nested").join("hearth"));
        let store = SnapshotStore::new(&config);

        store.write_output(b"[]").await.unwrap();
        assert_eq!(store.read_output().await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_remove_output_leaves_input() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.write_input(b"{}").await.unwrap();
        store.write_output(b"{\"success\":true}").await.unwrap();

        store.remove_output().await.unwrap();
        store.remove_output().await.unwrap();

        assert!(store.read_output().await.unwrap().is_none());
        assert!(store.input_exists().await);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.write_input(b"{}").await.unwrap();
        store.write_output(b"{}").await.unwrap();

        store.cleanup().await;
        store.cleanup().await;

        assert!(!store.input_path().exists());
        assert!(!store.output_path().exists());
    }
}
