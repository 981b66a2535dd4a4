//! Hearth Bridge - capability bridge between the Hearth family app and AI hosts
//!
//! A long-lived process that:
//! - speaks framed JSON-RPC over stdio, exposing tools, resources and prompts
//!   over a bounded family snapshot
//! - sanitizes raw application snapshots before they reach disk
//! - runs an external drift analyzer as a subprocess under a fixed path,
//!   argument vector, timeout and typed result contract
//!
//! # Architecture
//!
//! - **Snapshot**: clamp pass and the two hand-off files
//! - **Analysis**: feature-gated subprocess bridge
//! - **MCP**: frame parser, dispatcher and capability registry
//!
//! # Example
//!
//! ```no_run
//! use hearth_bridge::{BridgeConfig, McpServer};
//! use std::sync::Arc;
//!
//! # async fn example() -> hearth_bridge::Result<()> {
//! let config = BridgeConfig::load(None)?;
//! Arc::new(McpServer::from_config(&config)).run().await?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod mcp;
pub mod snapshot;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use analysis::{AnalysisBridge, AnalysisError};
pub use config::BridgeConfig;
pub use error::{HearthError, Result};
pub use mcp::{McpServer, ToolHandler};
pub use snapshot::{export_snapshot, sanitize_snapshot, SnapshotStore};
pub use types::{AnalysisResult, Effort, SanitizedSnapshot, Suggestion};
