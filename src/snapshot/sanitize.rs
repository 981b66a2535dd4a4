//! Clamp pass turning a loosely-typed domain snapshot into a bounded record
//!
//! Every rule here is total: any JSON value produces a valid
//! [`SanitizedSnapshot`]. Strings are cut to a fixed number of characters,
//! lists keep a prefix of at most a fixed length, ratings land in `[0, 10]`
//! or become `null`, and booleans are always `true`/`false`. Running the pass
//! over its own output is a no-op.

use crate::types::{
    DriftRecord, Effort, LogRecord, MemberRecord, SanitizedSnapshot, Suggestion, WeeklyStats,
};
use crate::utils::string::clamp_chars;
use chrono::Utc;
use serde_json::Value;

pub const MAX_MEMBERS: usize = 20;
pub const MAX_LOGS: usize = 30;
pub const MAX_DRIFTS: usize = 20;

pub const MAX_ID_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_LABEL_LEN: usize = 50;
pub const MAX_DATE_LEN: usize = 40;
pub const MAX_TEXT_LEN: usize = 500;

pub const MAX_SUGGESTIONS: usize = 20;
pub const MAX_ACTIVITY_LEN: usize = 200;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

/// Upper bound for statistics counters
pub const MAX_COUNT: u32 = 100_000;

/// Sanitize a raw snapshot document
pub fn sanitize_snapshot(raw: &Value) -> SanitizedSnapshot {
    let exported_at = raw
        .get("exportedAt")
        .and_then(Value::as_str)
        .map(|ts| clamp_chars(ts, MAX_DATE_LEN))
        .filter(|ts| !ts.trim().is_empty())
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    SanitizedSnapshot {
        exported_at,
        members: bounded_list(raw.get("members"), MAX_MEMBERS, sanitize_member),
        recent_logs: bounded_list(raw.get("recentLogs"), MAX_LOGS, sanitize_log),
        drifts: bounded_list(raw.get("drifts"), MAX_DRIFTS, sanitize_drift),
        weekly_stats: sanitize_stats(raw.get("weeklyStats")),
    }
}

fn sanitize_member(v: &Value) -> MemberRecord {
    MemberRecord {
        id: text(v.get("id"), MAX_ID_LEN),
        name: text(v.get("name"), MAX_NAME_LEN),
        role: text(v.get("role"), MAX_LABEL_LEN),
        energy_level: rating(v.get("energyLevel")),
        connection_score: rating(v.get("connectionScore")),
        is_active: flag(v.get("isActive")),
    }
}

fn sanitize_log(v: &Value) -> LogRecord {
    LogRecord {
        member_id: text(v.get("memberId"), MAX_ID_LEN),
        date: text(v.get("date"), MAX_DATE_LEN),
        energy: rating(v.get("energy")),
        mood: rating(v.get("mood")),
        connection: rating(v.get("connection")),
        highlights: text(v.get("highlights"), MAX_TEXT_LEN),
        challenges: text(v.get("challenges"), MAX_TEXT_LEN),
        notes: text(v.get("notes"), MAX_TEXT_LEN),
        shared: flag(v.get("shared")),
    }
}

fn sanitize_drift(v: &Value) -> DriftRecord {
    DriftRecord {
        member_id: text(v.get("memberId"), MAX_ID_LEN),
        drift_type: text(v.get("driftType"), MAX_LABEL_LEN),
        severity: text(v.get("severity"), MAX_LABEL_LEN),
        sentence: text(v.get("sentence"), MAX_TEXT_LEN),
        acknowledged: flag(v.get("acknowledged")),
        detected_at: text(v.get("detectedAt"), MAX_DATE_LEN),
    }
}

fn sanitize_stats(v: Option<&Value>) -> WeeklyStats {
    let Some(v) = v else {
        return WeeklyStats::default();
    };

    WeeklyStats {
        logs_this_week: count(v.get("logsThisWeek")),
        average_energy: rating(v.get("averageEnergy")),
        average_connection: rating(v.get("averageConnection")),
        active_members: count(v.get("activeMembers")),
    }
}

/// Clamp one host-supplied suggestion; unknown effort levels become medium
pub fn sanitize_suggestion(v: &Value) -> Suggestion {
    Suggestion {
        activity: text(v.get("activity"), MAX_ACTIVITY_LEN),
        rationale: text(v.get("rationale"), MAX_TEXT_LEN),
        effort: Effort::coerce(v.get("effort")),
    }
}

/// Prefix of at most `max` items; anything but an array is empty
fn bounded_list<T>(v: Option<&Value>, max: usize, f: impl Fn(&Value) -> T) -> Vec<T> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().take(max).map(f).collect())
        .unwrap_or_default()
}

/// Strings pass through clamped; scalars are stringified; everything else is empty
pub fn text(v: Option<&Value>, max: usize) -> String {
    match v {
        Some(Value::String(s)) => clamp_chars(s, max),
        Some(Value::Number(n)) => clamp_chars(&n.to_string(), max),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numeric (or numeric-string) ratings clamped into `[0, 10]`
pub fn rating(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !n.is_finite() {
        return None;
    }

    let clamped = n.clamp(RATING_MIN, RATING_MAX);
    // Collapse -0.0 so it serializes as 0.0
    Some(if clamped == 0.0 { 0.0 } else { clamped })
}

/// Permissive truthiness: explicit falsy words and zero are false, the rest true
pub fn flag(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !matches!(
            s.trim().to_lowercase().as_str(),
            "" | "false" | "0" | "no" | "off" | "null" | "undefined"
        ),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Non-negative whole counter, capped at [`MAX_COUNT`]
pub fn count(v: Option<&Value>) -> u32 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match n {
        Some(n) if n.is_finite() && n > 0.0 => n.floor().min(MAX_COUNT as f64) as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_clamps_and_coerces() {
        assert_eq!(rating(Some(&json!(14))), Some(10.0));
        assert_eq!(rating(Some(&json!(-3.5))), Some(0.0));
        assert_eq!(rating(Some(&json!("7.5"))), Some(7.5));
        assert_eq!(rating(Some(&json!("tired"))), None);
        assert_eq!(rating(Some(&json!(true))), None);
        assert_eq!(rating(None), None);
    }

    #[test]
    fn test_flag_truthiness() {
        assert!(flag(Some(&json!(true))));
        assert!(flag(Some(&json!(1))));
        assert!(flag(Some(&json!("yes"))));
        assert!(!flag(Some(&json!("false"))));
        assert!(!flag(Some(&json!("  "))));
        assert!(!flag(Some(&json!(0))));
        assert!(!flag(Some(&Value::Null)));
        assert!(!flag(None));
    }

    #[test]
    fn test_count_bounds() {
        assert_eq!(count(Some(&json!(-4))), 0);
        assert_eq!(count(Some(&json!(3.9))), 3);
        assert_eq!(count(Some(&json!("12"))), 12);
        assert_eq!(count(Some(&json!(1e12))), MAX_COUNT);
        assert_eq!(count(Some(&json!([1]))), 0);
    }

    #[test]
    fn test_lists_keep_prefix() {
        let logs: Vec<Value> = (0..45).map(|i| json!({"memberId": format!("m{}", i)})).collect();
        let snapshot = sanitize_snapshot(&json!({"recentLogs": logs}));

        assert_eq!(snapshot.recent_logs.len(), MAX_LOGS);
        assert_eq!(snapshot.recent_logs[0].member_id, "m0");
        assert_eq!(snapshot.recent_logs[MAX_LOGS - 1].member_id, "m29");
    }

    #[test]
    fn test_malformed_document() {
        let snapshot = sanitize_snapshot(&json!({
            "exportedAt": "2026-10-12T08:00:00Z",
            "members": "not a list",
            "drifts": [42, null, {"sentence": "x".repeat(900), "acknowledged": "no"}],
            "weeklyStats": {"logsThisWeek": "lots", "averageEnergy": 99}
        }));

        assert_eq!(snapshot.exported_at, "2026-10-12T08:00:00Z");
        assert!(snapshot.members.is_empty());
        assert_eq!(snapshot.drifts.len(), 3);
        assert_eq!(snapshot.drifts[0].sentence, "");
        assert_eq!(snapshot.drifts[2].sentence.chars().count(), MAX_TEXT_LEN);
        assert!(!snapshot.drifts[2].acknowledged);
        assert_eq!(snapshot.weekly_stats.logs_this_week, 0);
        assert_eq!(snapshot.weekly_stats.average_energy, Some(10.0));
    }

    #[test]
    fn test_suggestion_clamp() {
        let s = sanitize_suggestion(&json!({
            "activity": "a".repeat(300),
            "rationale": 12,
            "effort": "urgent"
        }));
        assert_eq!(s.activity.chars().count(), MAX_ACTIVITY_LEN);
        assert_eq!(s.rationale, "12");
        assert_eq!(s.effort, Effort::Medium);
    }

    #[test]
    fn test_missing_timestamp_is_filled() {
        let snapshot = sanitize_snapshot(&json!({}));
        assert!(!snapshot.exported_at.is_empty());
        assert_eq!(snapshot.weekly_stats, WeeklyStats::default());
    }
}
