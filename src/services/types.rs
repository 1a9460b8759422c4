use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema description handed to the structured executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSchema {
    pub name: String,
    /// DDL or prose describing tables and columns.
    pub description: String,
}

pub const DEFAULT_SCHEMA: &str = "\
players(player_id, player_name, team_abbreviation, position)
player_season_stats(player_id, season, games_played, points, rebounds, assists, steals, blocks, \
minutes, field_goal_pct, three_point_pct, free_throw_pct, true_shooting_pct, per)
teams(team_id, team_name, team_abbreviation, conference, wins, losses, season)";

impl Default for StructuredSchema {
    fn default() -> Self {
        Self {
            name: "nba".to_string(),
            description: DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl StructuredSchema {
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let description = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "schema".to_string());
        Ok(Self { name, description })
    }
}

/// Columns whose values name players or teams.
const ENTITY_COLUMNS: &[&str] = &[
    "player",
    "player_name",
    "name",
    "team",
    "team_name",
    "full_name",
];

/// Tabular result of a structured query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredRows {
    /// Generated query text (e.g. SQL), when the executor reports it.
    #[serde(default, alias = "sql")]
    pub query: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl StructuredRows {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Distinct string values from entity-like columns, in row order.
    pub fn entity_names(&self, limit: usize) -> Vec<String> {
        let entity_cols: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| ENTITY_COLUMNS.contains(&c.to_ascii_lowercase().as_str()))
            .map(|(i, _)| i)
            .collect();

        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for &col in &entity_cols {
                if let Some(serde_json::Value::String(value)) = row.get(col)
                    && !value.trim().is_empty()
                    && !names.iter().any(|n| n.eq_ignore_ascii_case(value))
                {
                    names.push(value.clone());
                    if names.len() >= limit {
                        return names;
                    }
                }
            }
        }
        names
    }

    /// Pipe-separated rendering for prompts.
    pub fn render(&self) -> String {
        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            let cells: Vec<String> = row
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            out.push_str(&cells.join(" | "));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One prior message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Everything the synthesis step sees for one question.
#[derive(Debug, Clone, Default)]
pub struct SynthesisRequest {
    pub question: String,
    pub structured: Option<StructuredRows>,
    pub retrieved: Vec<String>,
    pub history: Vec<Turn>,
    /// Set when a path failed, so the answer can acknowledge the gap.
    pub evidence_gap: Option<String>,
}

impl SynthesisRequest {
    pub fn has_evidence(&self) -> bool {
        self.structured.as_ref().is_some_and(|rows| !rows.is_empty()) || !self.retrieved.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synthesis {
    pub text: String,
    /// The model said it could not answer from the evidence.
    pub declined: bool,
}
