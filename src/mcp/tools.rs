//! MCP tool implementations
//!
//! Four tools over the snapshot store:
//! - read_family_export: raw sanitized snapshot
//! - analyze_family_drifts: counts and weekly stats from the snapshot
//! - write_suggestions: persist sanitized activity suggestions
//! - run_drift_analysis: run the external analyzer (the one slow tool)

use crate::analysis::AnalysisBridge;
use crate::error::{HearthError, Result};
use crate::snapshot::sanitize::{sanitize_snapshot, sanitize_suggestion, MAX_SUGGESTIONS};
use crate::snapshot::SnapshotStore;
use crate::types::{Focus, SanitizedSnapshot, SuggestionBatch};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const READ_FAMILY_EXPORT: &str = "read_family_export";
pub const ANALYZE_FAMILY_DRIFTS: &str = "analyze_family_drifts";
pub const WRITE_SUGGESTIONS: &str = "write_suggestions";
pub const RUN_DRIFT_ANALYSIS: &str = "run_drift_analysis";

/// Soft-miss text returned when no snapshot has been exported yet
pub const NO_DATA_MESSAGE: &str =
    "No family data available yet. Export a snapshot from the Hearth app first.";

/// Source label stamped on persisted suggestions
pub const SUGGESTION_SOURCE: &str = "hearth-bridge";

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: Value,
}

/// Tool handler that dispatches to the appropriate implementation
pub struct ToolHandler {
    store: Arc<SnapshotStore>,
    bridge: Arc<AnalysisBridge>,
}

impl ToolHandler {
    pub fn new(store: Arc<SnapshotStore>, bridge: Arc<AnalysisBridge>) -> Self {
        Self { store, bridge }
    }

    /// Get list of all available tools
    pub fn list_tools() -> Vec<Tool> {
        vec![
            Tool {
                name: READ_FAMILY_EXPORT.to_string(),
                description: "Read the latest sanitized family snapshot (members, recent logs, drifts, weekly stats) as JSON.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            Tool {
                name: ANALYZE_FAMILY_DRIFTS.to_string(),
                description: "Summarize the exported snapshot: member and log counts, unacknowledged drifts and weekly statistics.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "focus": {
                            "type": "string",
                            "enum": ["energy", "connection", "goals", "all"],
                            "description": "Area to highlight in the summary",
                            "default": "all"
                        }
                    }
                }),
            },
            Tool {
                name: WRITE_SUGGESTIONS.to_string(),
                description: "Save suggested family activities so the app can show them.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "suggestions": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "activity": {"type": "string", "maxLength": 200},
                                    "rationale": {"type": "string", "maxLength": 500},
                                    "effort": {"type": "string", "enum": ["low", "medium", "high"]}
                                },
                                "required": ["activity", "rationale", "effort"]
                            }
                        }
                    },
                    "required": ["suggestions"]
                }),
            },
            Tool {
                name: RUN_DRIFT_ANALYSIS.to_string(),
                description: "Run the external drift analyzer against the exported snapshot and return its findings.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ]
    }

    /// Whether a tool may take long enough that it should not hold up the read loop
    pub fn is_long_running(name: &str) -> bool {
        name == RUN_DRIFT_ANALYSIS
    }

    /// Execute a tool and return its text content
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<String> {
        debug!("Executing tool: {}", name);

        match name {
            READ_FAMILY_EXPORT => self.read_family_export().await,
            ANALYZE_FAMILY_DRIFTS => self.analyze_family_drifts(arguments).await,
            WRITE_SUGGESTIONS => self.write_suggestions(arguments).await,
            RUN_DRIFT_ANALYSIS => self.run_drift_analysis().await,
            _ => Err(HearthError::UnknownTool(name.to_string())),
        }
    }

    async fn read_family_export(&self) -> Result<String> {
        Ok(self
            .store
            .read_input()
            .await?
            .unwrap_or_else(|| NO_DATA_MESSAGE.to_string()))
    }

    async fn analyze_family_drifts(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct AnalyzeParams {
            focus: Option<String>,
        }

        let focus = match serde_json::from_value::<AnalyzeParams>(params) {
            Ok(p) => Focus::from_param(p.focus.as_deref()),
            Err(e) => {
                warn!("Ignoring malformed analyze arguments: {}", e);
                Focus::All
            }
        };

        let Some(text) = self.store.read_input().await? else {
            return Ok(NO_DATA_MESSAGE.to_string());
        };
        // The file may predate the current record shape; re-clamp rather than reject
        let raw: Value = serde_json::from_str(&text)?;
        Ok(summarize(&sanitize_snapshot(&raw), focus))
    }

    async fn write_suggestions(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct WriteParams {
            suggestions: Vec<Value>,
        }

        let params: WriteParams = serde_json::from_value(params)
            .map_err(|e| HearthError::InvalidParams(format!("suggestions: {}", e)))?;

        if params.suggestions.len() > MAX_SUGGESTIONS {
            warn!(
                "Dropping {} suggestions over the limit of {}",
                params.suggestions.len() - MAX_SUGGESTIONS,
                MAX_SUGGESTIONS
            );
        }

        let batch = SuggestionBatch {
            generated_at: Utc::now(),
            source: SUGGESTION_SOURCE.to_string(),
            suggestions: params
                .suggestions
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(sanitize_suggestion)
                .collect(),
        };

        self.store
            .write_output(&serde_json::to_vec_pretty(&batch)?)
            .await?;

        info!("Saved {} suggestions", batch.suggestions.len());
        Ok(format!(
            "Saved {} suggestions for the family.",
            batch.suggestions.len()
        ))
    }

    async fn run_drift_analysis(&self) -> Result<String> {
        let result = self.bridge.run_analysis().await;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

/// Human-readable digest of a snapshot
pub fn summarize(snapshot: &SanitizedSnapshot, focus: Focus) -> String {
    let stats = &snapshot.weekly_stats;
    let mut out = String::new();

    let _ = writeln!(out, "Family drift summary (focus: {})", focus.as_str());
    let _ = writeln!(out, "Exported at: {}", snapshot.exported_at);
    let _ = writeln!(out, "Members: {}", snapshot.members.len());
    let _ = writeln!(out, "Recent logs: {}", snapshot.recent_logs.len());
    let _ = writeln!(out, "Unacknowledged drifts: {}", snapshot.unacknowledged_drifts());
    let _ = writeln!(
        out,
        "Weekly stats: {} logs this week, {} active members, average energy {}, average connection {}",
        stats.logs_this_week,
        stats.active_members,
        format_rating(stats.average_energy),
        format_rating(stats.average_connection)
    );

    match focus {
        Focus::Energy => {
            let energy = mean(snapshot.recent_logs.iter().filter_map(|l| l.energy));
            let _ = writeln!(out, "Mean logged energy: {}", format_rating(energy));
        }
        Focus::Connection => {
            let connection = mean(snapshot.recent_logs.iter().filter_map(|l| l.connection));
            let _ = writeln!(out, "Mean logged connection: {}", format_rating(connection));
        }
        Focus::Goals => {
            let goal_drifts = snapshot
                .drifts
                .iter()
                .filter(|d| d.drift_type.to_lowercase().contains("goal"))
                .count();
            let _ = writeln!(out, "Goal-related drifts: {}", goal_drifts);
        }
        Focus::All => {}
    }

    out
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0u32), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn format_rating(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "n/a".to_string())
}
