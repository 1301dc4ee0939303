//! Routine and execution-history record types.
//!
//! Defines [`Routine`] (a named, ordered list of [`RoutineStep`]s), [`StepType`]
//! (the five step categories), [`HistoryEntry`] (one execution record), and
//! [`BackupData`] (the on-disk backup envelope).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Name used for routines persisted without one.
pub const UNNAMED_ROUTINE: &str = "unnamed_routine";

/// Timestamp format shared by `created`, `last_run`, and history entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time rendered with [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The category of a routine step. Serialized as its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    #[serde(rename = "Light Control")]
    LightControl,
    #[serde(rename = "Music Control")]
    MusicControl,
    #[serde(rename = "TV Control")]
    TvControl,
    #[serde(rename = "Voice Command")]
    VoiceCommand,
    #[serde(rename = "Wait")]
    Wait,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LightControl => "Light Control",
            Self::MusicControl => "Music Control",
            Self::TvControl => "TV Control",
            Self::VoiceCommand => "Voice Command",
            Self::Wait => "Wait",
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Light Control" => Ok(Self::LightControl),
            "Music Control" => Ok(Self::MusicControl),
            "TV Control" => Ok(Self::TvControl),
            "Voice Command" => Ok(Self::VoiceCommand),
            "Wait" => Ok(Self::Wait),
            _ => Err(format!("unknown step type: {s}")),
        }
    }
}

/// The payload of a step: free text, or a number of seconds for `Wait`.
///
/// Numbers keep their original JSON representation so `5` stays `5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepAction {
    Seconds(serde_json::Number),
    Text(String),
}

impl StepAction {
    /// Numeric value of the action, accepting numeric strings.
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Seconds(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for StepAction {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<u64> for StepAction {
    fn from(n: u64) -> Self {
        Self::Seconds(n.into())
    }
}

/// One step of a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub action: StepAction,
}

impl RoutineStep {
    pub fn new(step_type: StepType, action: impl Into<StepAction>) -> Self {
        Self {
            step_type,
            action: action.into(),
        }
    }
}

/// A saved routine. Keys this crate does not know about are kept in `extra`
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<RoutineStep>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn unnamed() -> String {
    UNNAMED_ROUTINE.to_string()
}

impl Routine {
    /// New routine stamped with the current local time.
    pub fn new(name: impl Into<String>, description: impl Into<String>, steps: Vec<RoutineStep>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps,
            created: now_timestamp(),
            last_run: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Outcome of a routine execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Partial,
    Failed,
    /// Any status string written by another tool.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One entry of `routine_history.json`.
///
/// Every field has a default so entries written by older tools still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub routine_name: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub status: ExecutionStatus,
    /// Wall time in seconds.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: f64,
    #[serde(default)]
    pub notes: String,
}

/// Accept a number, a numeric string, or text like `"2m 30s"`. Anything
/// else reads as zero.
fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(text) => parse_duration_text(&text).unwrap_or(0.0),
        Raw::Other(_) => 0.0,
    })
}

/// Parse `"12.5"`, `"45s"`, `"2m 30s"` or `"1h 5m"` into seconds.
pub fn parse_duration_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(secs) = text.parse::<f64>() {
        return Some(secs);
    }

    let mut total = 0.0;
    let mut matched = false;
    for part in text.split_whitespace() {
        let unit_at = part.find(|c: char| c.is_ascii_alphabetic())?;
        let (value, unit) = part.split_at(unit_at);
        let value: f64 = value.parse().ok()?;
        total += value
            * match unit {
                "h" => 3600.0,
                "m" | "min" => 60.0,
                "s" | "sec" => 1.0,
                _ => return None,
            };
        matched = true;
    }
    matched.then_some(total)
}

/// Backup envelope: every routine file keyed by filename, plus history.
///
/// `routine_history` is optional: a backup without it leaves the current
/// history alone on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub custom_routines: BTreeMap<String, Routine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_history: Option<Vec<HistoryEntry>>,
    pub backup_timestamp: String,
    pub backup_name: String,
}
