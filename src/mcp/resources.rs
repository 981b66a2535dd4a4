//! MCP resources: the two snapshot files, addressed by `file://` URIs

use crate::error::{HearthError, Result};
use crate::snapshot::SnapshotStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub const FILE_SCHEME: &str = "file://";
pub const JSON_MIME: &str = "application/json";

/// Resource descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

pub fn file_uri(path: &Path) -> String {
    format!("{}{}", FILE_SCHEME, path.display())
}

/// Serves `resources/list` and `resources/read`
pub struct ResourceHandler {
    store: Arc<SnapshotStore>,
}

impl ResourceHandler {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn list_resources(&self) -> Vec<Resource> {
        vec![
            Resource {
                uri: file_uri(self.store.input_path()),
                name: "Family snapshot".to_string(),
                description: "Sanitized family data exported by the app".to_string(),
                mime_type: JSON_MIME.to_string(),
            },
            Resource {
                uri: file_uri(self.store.output_path()),
                name: "Analysis output".to_string(),
                description: "Latest drift analysis result or saved suggestions".to_string(),
                mime_type: JSON_MIME.to_string(),
            },
        ]
    }

    /// Whether `path` is one of the two files returned by [`list_resources`](Self::list_resources)
    pub fn is_listed(&self, path: &Path) -> bool {
        path == self.store.input_path() || path == self.store.output_path()
    }

    /// Read a resource by URI
    ///
    /// The scheme prefix is stripped and the remainder read as a path; the
    /// only check is that the file exists. Paths outside the listed
    /// resources are served but logged.
    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        let path = uri.strip_prefix(FILE_SCHEME).unwrap_or(uri);
        if self.is_listed(Path::new(path)) {
            debug!("Reading resource {}", path);
        } else {
            warn!("Host read unlisted resource {}", path);
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(HearthError::ResourceNotFound(uri.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": JSON_MIME,
                "text": text
            }]
        }))
    }
}
