//! Parameter definitions for the routine tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::routine::action::parse_step;
use crate::routine::types::{RoutineStep, StepAction, StepType};

/// One step as supplied by the client.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StepInput {
    #[schemars(
        description = "Step type: 'Light Control', 'Music Control', 'TV Control', 'Voice Command', or 'Wait'"
    )]
    pub r#type: String,

    #[schemars(
        description = "Action text (e.g. 'Turn On', 'Set Color: Orange', 'Play', 'Launch: Netflix', 'Ahoy matey!') or, for Wait, a number of seconds"
    )]
    pub action: serde_json::Value,
}

impl StepInput {
    /// Validate the step type and action and build a [`RoutineStep`].
    pub fn into_step(self) -> Result<RoutineStep, String> {
        let step_type: StepType = self.r#type.parse()?;
        let action = match self.action {
            serde_json::Value::String(s) => StepAction::Text(s),
            serde_json::Value::Number(n) => StepAction::Seconds(n),
            other => return Err(format!("step action must be a string or number, got {other}")),
        };
        let step = RoutineStep { step_type, action };
        parse_step(&step)?;
        Ok(step)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RoutineNameParams {
    #[schemars(description = "Name of the routine")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SaveRoutineParams {
    #[schemars(description = "Routine name. Routines whose names sanitize to the same filename overwrite each other.")]
    pub name: String,

    #[schemars(description = "What the routine does")]
    pub description: Option<String>,

    #[schemars(description = "Ordered steps, executed one after another")]
    pub steps: Vec<StepInput>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateRoutineParams {
    #[schemars(description = "Current name of the routine to update")]
    pub name: String,

    #[schemars(description = "New name; the routine file is renamed to match")]
    pub new_name: Option<String>,

    #[schemars(description = "Replacement description")]
    pub description: Option<String>,

    #[schemars(description = "Replacement list of steps")]
    pub steps: Option<Vec<StepInput>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RoutineHistoryParams {
    #[schemars(description = "Only return executions of this routine")]
    pub routine_name: Option<String>,

    #[schemars(description = "Maximum number of most recent entries to return. Defaults to 20.")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BackupParams {
    #[schemars(description = "Backup name. Defaults to backup_YYYYMMDD_HHMMSS.")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RestoreParams {
    #[schemars(description = "Name of a backup in the backups directory (as listed by list_backups)")]
    pub backup_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_input_validates_type_and_action() {
        let ok = StepInput {
            r#type: "Light Control".into(),
            action: serde_json::json!("Set Color: Blue"),
        };
        assert_eq!(ok.into_step().unwrap().step_type, StepType::LightControl);

        let wait = StepInput {
            r#type: "Wait".into(),
            action: serde_json::json!(2),
        };
        assert_eq!(wait.into_step().unwrap().action.as_seconds(), Some(2.0));

        let bad_type = StepInput {
            r#type: "Climate".into(),
            action: serde_json::json!("Cool"),
        };
        assert!(bad_type.into_step().is_err());

        let bad_action = StepInput {
            r#type: "Voice Command".into(),
            action: serde_json::json!({"text": "hi"}),
        };
        assert!(bad_action.into_step().is_err());
    }
}
