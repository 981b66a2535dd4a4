//! Core data types for the Hearth capability bridge
//!
//! Covers the sanitized snapshot written for external consumers, the
//! suggestion records written back by the host, and the analysis result
//! produced by the external analyzer. JSON field names are camelCase to match
//! the application that produces the raw snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bounded, sanitized family snapshot (the on-disk input artifact)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedSnapshot {
    /// When the application produced the snapshot
    pub exported_at: String,
    pub members: Vec<MemberRecord>,
    pub recent_logs: Vec<LogRecord>,
    pub drifts: Vec<DriftRecord>,
    pub weekly_stats: WeeklyStats,
}

/// One family member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Rating in `[0, 10]`
    pub energy_level: Option<f64>,
    /// Rating in `[0, 10]`
    pub connection_score: Option<f64>,
    pub is_active: bool,
}

/// One daily check-in log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub member_id: String,
    pub date: String,
    pub energy: Option<f64>,
    pub mood: Option<f64>,
    pub connection: Option<f64>,
    pub highlights: String,
    pub challenges: String,
    pub notes: String,
    pub shared: bool,
}

/// A detected drift/flag raised by the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRecord {
    pub member_id: String,
    pub drift_type: String,
    pub severity: String,
    pub sentence: String,
    pub acknowledged: bool,
    pub detected_at: String,
}

/// Fixed-shape weekly statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub logs_this_week: u32,
    pub average_energy: Option<f64>,
    pub average_connection: Option<f64>,
    pub active_members: u32,
}

impl SanitizedSnapshot {
    /// Drift records the family has not yet acknowledged
    pub fn unacknowledged_drifts(&self) -> usize {
        self.drifts.iter().filter(|d| !d.acknowledged).count()
    }
}

/// Effort level of a suggested activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// Resolve a loosely-typed value; anything unrecognized becomes `Medium`
    pub fn coerce(value: Option<&serde_json::Value>) -> Self {
        match value
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            Some("low") => Effort::Low,
            Some("high") => Effort::High,
            _ => Effort::Medium,
        }
    }
}

/// A sanitized activity suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub activity: String,
    pub rationale: String,
    pub effort: Effort,
}

/// Suggestions as persisted to the output path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBatch {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub suggestions: Vec<Suggestion>,
}

/// Focus area for the drift summary tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    Energy,
    Connection,
    Goals,
    All,
}

impl Focus {
    /// Parse a focus parameter; missing or unrecognized values mean `All`
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("energy") => Focus::Energy,
            Some("connection") => Focus::Connection,
            Some("goals") => Focus::Goals,
            _ => Focus::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::Energy => "energy",
            Focus::Connection => "connection",
            Focus::Goals => "goals",
            Focus::All => "all",
        }
    }
}

/// One drift finding reported by the external analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftFinding {
    #[serde(rename = "type")]
    pub drift_type: String,
    pub severity: String,
    pub observation: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Result of an external analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drifts: Option<Vec<DriftFinding>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable machine tag of the failure, when the bridge produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl AnalysisResult {
    /// Failed result carrying an explanation and a machine tag
    pub fn failure(kind: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            drifts: None,
            summary: None,
            error: Some(message.into()),
            error_kind: Some(kind.to_string()),
        }
    }
}
