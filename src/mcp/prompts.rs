//! Canned prompt templates offered to the host

use crate::error::{HearthError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const WEEKLY_ANALYSIS: &str = "weekly_analysis";
pub const ACTIVITY_SUGGESTIONS: &str = "activity_suggestions";

const WEEKLY_ANALYSIS_BODY: &str = "\
Review this week's family snapshot.

1. Call read_family_export to load the latest data.
2. Call analyze_family_drifts to see counts and weekly statistics.
3. Look for patterns in energy, mood and connection across members.
4. Point out any unacknowledged drifts and what they might mean.
5. Close with two or three gentle observations the family can discuss.

Keep the tone warm and specific. Do not diagnose or judge.";

const ACTIVITY_SUGGESTIONS_BODY: &str = "\
Suggest activities that could help this family reconnect.

1. Call read_family_export to understand members, energy levels and recent logs.
2. Propose three to five activities that fit the family's current energy.
3. For each, give a short rationale tied to something in the data.
4. Rate effort as low, medium or high.
5. Save them with write_suggestions.

Prefer small, realistic ideas over big plans.";

/// Prompt descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

pub fn list_prompts() -> Vec<Prompt> {
    vec![
        Prompt {
            name: WEEKLY_ANALYSIS.to_string(),
            description: "Walk through the week's family data and surface drifts".to_string(),
            arguments: vec![],
        },
        Prompt {
            name: ACTIVITY_SUGGESTIONS.to_string(),
            description: "Propose reconnecting activities and save them".to_string(),
            arguments: vec![],
        },
    ]
}

/// Return a prompt body by exact name
pub fn get_prompt(name: &str) -> Result<Value> {
    let (description, body) = match name {
        WEEKLY_ANALYSIS => ("Weekly family analysis", WEEKLY_ANALYSIS_BODY),
        ACTIVITY_SUGGESTIONS => ("Family activity suggestions", ACTIVITY_SUGGESTIONS_BODY),
        _ => return Err(HearthError::PromptNotFound(name.to_string())),
    };

    Ok(json!({
        "description": description,
        "messages": [{
            "role": "user",
            "content": {
                "type": "text",
                "text": body
            }
        }]
    }))
}
