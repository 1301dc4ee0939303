pub mod light_params;
pub mod routine_params;

use light_params::{DiscoverDevicesParams, SetLightBrightnessParams, SetLightColorParams};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use routine_params::{
    BackupParams, RestoreParams, RoutineHistoryParams, RoutineNameParams, SaveRoutineParams,
    StepInput, UpdateRoutineParams,
};
use serde::Serialize;
use std::sync::Arc;

use crate::devices::lights::LightController;
use crate::routine::executor::RoutineExecutor;
use crate::routine::types::{Routine, RoutineStep};
use crate::routine::{sanitize_filename, RoutineStorage, StorageResult};

const DEFAULT_HISTORY_ENTRIES: usize = 20;

/// The Salty MCP tool handler. Holds the routine store, the light controller
/// and the executor, and exposes them as MCP tools via `#[tool_router]`.
#[derive(Clone)]
pub struct SaltyTools {
    tool_router: ToolRouter<Self>,
    storage: RoutineStorage,
    lights: Arc<LightController>,
    executor: Arc<RoutineExecutor>,
}

/// Run a synchronous storage call off the async runtime.
async fn blocking<T, F>(storage: &RoutineStorage, f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&RoutineStorage) -> StorageResult<T> + Send + 'static,
{
    let storage = storage.clone();
    tokio::task::spawn_blocking(move || f(&storage))
        .await
        .map_err(|e| format!("storage task failed: {e}"))?
        .map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

fn convert_steps(steps: Vec<StepInput>) -> Result<Vec<RoutineStep>, String> {
    steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| step.into_step().map_err(|e| format!("step {}: {e}", i + 1)))
        .collect()
}

#[tool_router]
impl SaltyTools {
    pub fn new(
        storage: RoutineStorage,
        lights: Arc<LightController>,
        executor: Arc<RoutineExecutor>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            storage,
            lights,
            executor,
        }
    }

    // ── Routines ────────────────────────────────────────────────────

    #[tool(description = "List every saved routine with its steps, creation time and last run.")]
    pub async fn list_routines(&self) -> Result<String, String> {
        tracing::info!("list_routines called");
        let routines = blocking(&self.storage, |s| Ok(s.load_all())).await?;
        to_json(&serde_json::json!({
            "total": routines.len(),
            "routines": routines,
        }))
    }

    #[tool(description = "Get a single routine by name.")]
    pub async fn get_routine(
        &self,
        Parameters(params): Parameters<RoutineNameParams>,
    ) -> Result<String, String> {
        let name = params.name;
        let lookup = name.clone();
        match blocking(&self.storage, move |s| Ok(s.get(&lookup))).await? {
            Some(routine) => to_json(&routine),
            None => Err(format!("routine not found: {name}")),
        }
    }

    #[tool(description = "Save a new routine. Step types: Light Control (Turn On, Turn Off, Dim, Set Color: <color>, Set Brightness: <0-100>), Music Control (Play, Pause, Next, Previous, Volume: <0-100>, Playlist: <id>), TV Control (Power On, Power Off, Home, Launch: <app>, Volume Up, ...), Voice Command (<text to speak>), Wait (<seconds>). A routine with the same name is overwritten.")]
    pub async fn save_routine(
        &self,
        Parameters(params): Parameters<SaveRoutineParams>,
    ) -> Result<String, String> {
        if params.name.trim().is_empty() {
            return Err("routine name must not be empty".into());
        }
        let steps = convert_steps(params.steps)?;
        let routine = Routine::new(params.name, params.description.unwrap_or_default(), steps);

        tracing::info!(name = %routine.name, steps = routine.steps.len(), "save_routine called");

        let name = routine.name.clone();
        let path = blocking(&self.storage, move |s| s.add(&routine)).await?;
        to_json(&serde_json::json!({
            "saved": name,
            "file": path.file_name().map(|f| f.to_string_lossy().into_owned()),
        }))
    }

    #[tool(description = "Update an existing routine. Only the supplied fields change; setting new_name renames the routine.")]
    pub async fn update_routine(
        &self,
        Parameters(params): Parameters<UpdateRoutineParams>,
    ) -> Result<String, String> {
        let steps = params.steps.map(convert_steps).transpose()?;
        let name = params.name;
        tracing::info!(name = %name, "update_routine called");

        let routine = blocking(&self.storage, move |s| {
            let mut routine = s
                .get(&name)
                .ok_or_else(|| crate::routine::StorageError::NotFound(name.clone()))?;
            if let Some(new_name) = params.new_name.filter(|n| !n.trim().is_empty()) {
                routine.name = new_name;
            }
            if let Some(description) = params.description {
                routine.description = description;
            }
            if let Some(steps) = steps {
                routine.steps = steps;
            }
            s.update(&name, &routine)?;
            Ok(routine)
        })
        .await?;

        to_json(&routine)
    }

    #[tool(description = "Delete a routine by name.")]
    pub async fn delete_routine(
        &self,
        Parameters(params): Parameters<RoutineNameParams>,
    ) -> Result<String, String> {
        tracing::info!(name = %params.name, "delete_routine called");
        let name = params.name;
        let deleted = name.clone();
        blocking(&self.storage, move |s| s.delete(&name)).await?;
        to_json(&serde_json::json!({ "deleted": deleted }))
    }

    #[tool(description = "Run a routine now. Steps execute in order; a failed step is reported and the rest still run.")]
    pub async fn run_routine(
        &self,
        Parameters(params): Parameters<RoutineNameParams>,
    ) -> Result<String, String> {
        tracing::info!(name = %params.name, "run_routine called");
        let report = self
            .executor
            .run(&params.name)
            .await
            .map_err(|e| format!("{e:#}"))?;
        to_json(&report)
    }

    #[tool(description = "Show recent routine executions, newest first, optionally for one routine.")]
    pub async fn routine_history(
        &self,
        Parameters(params): Parameters<RoutineHistoryParams>,
    ) -> Result<String, String> {
        let limit = params.limit.unwrap_or(DEFAULT_HISTORY_ENTRIES);
        let history = blocking(&self.storage, |s| Ok(s.load_history())).await?;

        let entries: Vec<_> = history
            .into_iter()
            .rev()
            .filter(|e| {
                params
                    .routine_name
                    .as_deref()
                    .map_or(true, |name| e.routine_name == name)
            })
            .take(limit)
            .collect();

        to_json(&serde_json::json!({
            "total": entries.len(),
            "history": entries,
        }))
    }

    #[tool(description = "Routine statistics: counts, success rate, most used routine and storage size.")]
    pub async fn routine_stats(&self) -> Result<String, String> {
        let stats = blocking(&self.storage, |s| Ok(s.stats())).await?;
        to_json(&stats)
    }

    #[tool(description = "Back up every routine and the execution history into a single file.")]
    pub async fn backup_routines(
        &self,
        Parameters(params): Parameters<BackupParams>,
    ) -> Result<String, String> {
        tracing::info!(name = ?params.name, "backup_routines called");
        let path = blocking(&self.storage, move |s| s.backup(params.name.as_deref())).await?;
        to_json(&serde_json::json!({ "backup_file": path }))
    }

    #[tool(description = "Restore routines and history from a named backup. Replaces ALL current routines.")]
    pub async fn restore_routines(
        &self,
        Parameters(params): Parameters<RestoreParams>,
    ) -> Result<String, String> {
        let stem = params.backup_name.trim_end_matches(".json");
        let file = format!("{}.json", sanitize_filename(stem));
        tracing::info!(backup = %file, "restore_routines called");

        let result = blocking(&self.storage, move |s| {
            let path = s.backups_dir().join(&file);
            s.restore(path)
        })
        .await?;
        to_json(&result)
    }

    #[tool(description = "List available backups, newest first.")]
    pub async fn list_backups(&self) -> Result<String, String> {
        let backups = blocking(&self.storage, |s| s.list_backups()).await?;
        to_json(&serde_json::json!({
            "total": backups.len(),
            "backups": backups,
        }))
    }

    // ── Lights ──────────────────────────────────────────────────────

    #[tool(description = "Discover smart devices on the network. Results are cached; set force_refresh to bypass the cache.")]
    pub async fn discover_devices(
        &self,
        Parameters(params): Parameters<DiscoverDevicesParams>,
    ) -> Result<String, String> {
        let force = params.force_refresh.unwrap_or(false);
        tracing::info!(force, "discover_devices called");
        let listing = self.lights.discover(force).await.map_err(|e| format!("{e:#}"))?;
        to_json(&listing)
    }

    #[tool(description = "Turn on all smart lights and plugs.")]
    pub async fn turn_on_lights(&self) -> Result<String, String> {
        let report = self.lights.turn_on_all().await.map_err(|e| format!("{e:#}"))?;
        to_json(&report)
    }

    #[tool(description = "Turn off all smart lights and plugs.")]
    pub async fn turn_off_lights(&self) -> Result<String, String> {
        let report = self.lights.turn_off_all().await.map_err(|e| format!("{e:#}"))?;
        to_json(&report)
    }

    #[tool(description = "Set the color of all color-capable lights. White-only bulbs fall back to a warm color temperature.")]
    pub async fn set_light_color(
        &self,
        Parameters(params): Parameters<SetLightColorParams>,
    ) -> Result<String, String> {
        let report = self
            .lights
            .set_color(&params.color)
            .await
            .map_err(|e| format!("{e:#}"))?;
        to_json(&report)
    }

    #[tool(description = "Set the brightness (0-100) of all dimmable lights.")]
    pub async fn set_light_brightness(
        &self,
        Parameters(params): Parameters<SetLightBrightnessParams>,
    ) -> Result<String, String> {
        let report = self
            .lights
            .set_brightness(params.brightness)
            .await
            .map_err(|e| format!("{e:#}"))?;
        to_json(&report)
    }

    #[tool(description = "Report the power, brightness and color state of every device.")]
    pub async fn get_light_status(&self) -> Result<String, String> {
        let listing = self.lights.status().await.map_err(|e| format!("{e:#}"))?;
        let lights = self
            .lights
            .light_aliases()
            .await
            .map_err(|e| format!("{e:#}"))?;
        to_json(&serde_json::json!({
            "response": listing.response,
            "devices": listing.devices,
            "lights": lights,
        }))
    }

    #[tool(description = "Show device cache freshness: age, expiry and number of cached devices.")]
    pub async fn device_cache_status(&self) -> Result<String, String> {
        to_json(&self.lights.cache().status().await)
    }

    #[tool(description = "Drop the device cache and re-discover immediately.")]
    pub async fn rebuild_device_cache(&self) -> Result<String, String> {
        tracing::info!("rebuild_device_cache called");
        let cache = self.lights.cache();
        cache.invalidate().await;
        let devices = cache.devices(true).await.map_err(|e| format!("{e:#}"))?;
        to_json(&serde_json::json!({
            "rebuilt": true,
            "devices": devices.len(),
            "status": cache.status().await,
        }))
    }
}

#[tool_handler]
impl ServerHandler for SaltyTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Salty is a home controller. Use save_routine to create routines, \
                 run_routine to execute them, and the light tools to control smart \
                 lights directly."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
