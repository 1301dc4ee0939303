//! Sequential routine execution.
//!
//! Steps run strictly in order. `Wait` steps sleep in-process; every other
//! step is parsed into an [`Action`] and handed to a [`StepHandler`]. A failing
//! step is recorded and the routine carries on.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::action::{parse_step, Action};
use super::storage::RoutineStorage;
use super::types::{now_timestamp, ExecutionStatus, HistoryEntry, Routine, StepType};
use crate::devices::lights::LightController;

/// Executes one non-wait action.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Perform `action`, returning a short human-readable result.
    async fn handle(&self, action: &Action) -> Result<String>;
}

/// Routes light steps to the light controller. Music, TV and voice steps have
/// no adapter here: they fail unless `dry_run` is set, in which case every
/// step is only logged.
pub struct DeviceStepHandler {
    lights: Arc<LightController>,
    dry_run: bool,
}

impl DeviceStepHandler {
    pub fn new(lights: Arc<LightController>, dry_run: bool) -> Self {
        Self { lights, dry_run }
    }
}

#[async_trait]
impl StepHandler for DeviceStepHandler {
    async fn handle(&self, action: &Action) -> Result<String> {
        if self.dry_run {
            info!(?action, "dry run: skipping step");
            return Ok(format!("dry run: {} step skipped", action.step_type()));
        }

        match action {
            Action::Light(command) => {
                let report = self.lights.execute(command).await?;
                if report.updated == 0 {
                    return Err(anyhow!("{}", report.response));
                }
                Ok(report.response)
            }
            Action::Wait(_) => Ok("wait handled by executor".into()),
            other => Err(anyhow!("no adapter configured for {}", other.step_type())),
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step_type: StepType,
    pub action: String,
    pub success: bool,
    pub message: String,
}

/// Result of a full routine run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub routine_name: String,
    pub status: ExecutionStatus,
    pub duration: f64,
    pub steps: Vec<StepOutcome>,
    pub notes: String,
}

impl ExecutionReport {
    pub fn to_history_entry(&self, timestamp: String) -> HistoryEntry {
        HistoryEntry {
            routine_name: self.routine_name.clone(),
            timestamp,
            status: self.status,
            duration: self.duration,
            notes: self.notes.clone(),
        }
    }
}

pub struct RoutineExecutor {
    storage: RoutineStorage,
    handler: Arc<dyn StepHandler>,
    max_wait: Duration,
}

impl RoutineExecutor {
    pub fn new(storage: RoutineStorage, handler: Arc<dyn StepHandler>, max_wait: Duration) -> Self {
        Self {
            storage,
            handler,
            max_wait,
        }
    }

    /// Load the routine called `name`, run it, stamp `last_run`, and append
    /// the outcome to history.
    ///
    /// `last_run` is written back to the file the routine was loaded from. A
    /// failure to persist either is logged; the report is still returned
    /// because the steps have already run.
    pub async fn run(&self, name: &str) -> Result<ExecutionReport> {
        let storage = self.storage.clone();
        let lookup = name.to_string();
        let routine = tokio::task::spawn_blocking(move || storage.get(&lookup))
            .await
            .context("storage task failed")?
            .ok_or_else(|| anyhow!("routine not found: {name}"))?;

        let started_at = now_timestamp();
        let report = self.execute(&routine).await;

        let entry = report.to_history_entry(started_at.clone());
        let storage = self.storage.clone();
        let key = name.to_string();
        let (marked, recorded) = tokio::task::spawn_blocking(move || {
            (storage.mark_run(&key, &started_at), storage.record_execution(entry))
        })
        .await
        .context("storage task failed")?;

        if let Err(e) = marked {
            error!(routine = %name, error = %e, "failed to update last_run");
        }
        if let Err(e) = recorded {
            error!(routine = %name, error = %e, "failed to record routine execution");
        }

        Ok(report)
    }

    /// Run every step of `routine` without touching storage.
    pub async fn execute(&self, routine: &Routine) -> ExecutionReport {
        info!(routine = %routine.name, steps = routine.steps.len(), "running routine");
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(routine.steps.len());

        for (index, step) in routine.steps.iter().enumerate() {
            let result = match parse_step(step) {
                Ok(Action::Wait(duration)) => Ok(self.wait(duration).await),
                Ok(action) => self.handler.handle(&action).await.map_err(|e| format!("{e:#}")),
                Err(e) => Err(e),
            };

            let (success, message) = match result {
                Ok(message) => (true, message),
                Err(message) => {
                    warn!(routine = %routine.name, index, error = %message, "routine step failed");
                    (false, message)
                }
            };
            outcomes.push(StepOutcome {
                index,
                step_type: step.step_type,
                action: step.action.as_text(),
                success,
                message,
            });
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        let status = if outcomes.is_empty() || succeeded == 0 {
            ExecutionStatus::Failed
        } else if succeeded == outcomes.len() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Partial
        };

        let notes = if outcomes.is_empty() {
            "routine has no steps".to_string()
        } else {
            outcomes
                .iter()
                .filter(|o| !o.success)
                .map(|o| format!("step {} ({}): {}", o.index + 1, o.step_type, o.message))
                .collect::<Vec<_>>()
                .join("; ")
        };

        let duration = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(routine = %routine.name, %status, duration, "routine finished");

        ExecutionReport {
            routine_name: routine.name.clone(),
            status,
            duration,
            steps: outcomes,
            notes,
        }
    }

    async fn wait(&self, requested: Duration) -> String {
        let actual = requested.min(self.max_wait);
        tokio::time::sleep(actual).await;
        if actual < requested {
            format!(
                "waited {:.1}s (capped from {:.1}s)",
                actual.as_secs_f64(),
                requested.as_secs_f64()
            )
        } else {
            format!("waited {:.1}s", actual.as_secs_f64())
        }
    }
}
