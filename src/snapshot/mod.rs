//! Snapshot hand-off between the application, the host and the analyzer
//!
//! - [`sanitize`]: clamp pass over the raw application snapshot
//! - [`store`]: the two well-known files and their write discipline

pub mod sanitize;
pub mod store;

pub use sanitize::sanitize_snapshot;
pub use store::SnapshotStore;

use crate::error::Result;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Sanitize a raw snapshot and write it to the input path
///
/// This is the only route by which application data reaches the input file.
pub async fn export_snapshot(store: &SnapshotStore, raw: &Value) -> Result<PathBuf> {
    let sanitized = sanitize_snapshot(raw);
    let bytes = serde_json::to_vec_pretty(&sanitized)?;
    store.write_input(&bytes).await?;

    info!(
        "Exported snapshot: {} members, {} logs, {} drifts",
        sanitized.members.len(),
        sanitized.recent_logs.len(),
        sanitized.drifts.len()
    );

    Ok(store.input_path().to_path_buf())
}
