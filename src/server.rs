//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire the
//! routine store, the device cache and the executor into a running server.

use crate::config::SaltyConfig;
use crate::devices::backend::{DeviceBackend, VirtualBackend};
use crate::devices::cache::DeviceCache;
use crate::devices::lights::LightController;
use crate::routine::executor::{DeviceStepHandler, RoutineExecutor, StepHandler};
use crate::routine::RoutineStorage;
use crate::tools::SaltyTools;
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;
use std::time::Duration;

/// Everything a tool handler needs, built once and shared by every session.
#[derive(Clone)]
pub struct SharedState {
    pub storage: RoutineStorage,
    pub lights: Arc<LightController>,
    pub executor: Arc<RoutineExecutor>,
}

impl SharedState {
    pub fn tools(&self) -> SaltyTools {
        SaltyTools::new(
            self.storage.clone(),
            Arc::clone(&self.lights),
            Arc::clone(&self.executor),
        )
    }
}

/// Open the routine store and build the device stack from `config`.
pub fn setup_shared_state(config: &SaltyConfig) -> Result<SharedState> {
    let routines_dir = config.resolved_routines_dir();
    let storage = RoutineStorage::open(&routines_dir)
        .with_context(|| format!("failed to open routine storage at {}", routines_dir.display()))?
        .with_history_limit(config.storage.history_limit);
    tracing::info!(dir = %routines_dir.display(), "routine storage ready");

    let backend: Arc<dyn DeviceBackend> =
        Arc::new(VirtualBackend::from_config(&config.devices.virtual_devices));
    let cache = Arc::new(DeviceCache::new(
        backend,
        Duration::from_secs(config.devices.cache_duration_secs),
        Duration::from_secs(config.devices.max_stale_secs),
    ));
    let lights = Arc::new(LightController::new(cache));
    tracing::info!(
        virtual_devices = config.devices.virtual_devices.len(),
        cache_secs = config.devices.cache_duration_secs,
        "device layer ready"
    );

    let handler: Arc<dyn StepHandler> = Arc::new(DeviceStepHandler::new(
        Arc::clone(&lights),
        config.executor.dry_run,
    ));
    let executor = Arc::new(RoutineExecutor::new(
        storage.clone(),
        handler,
        Duration::from_secs(config.executor.max_wait_secs),
    ));
    if config.executor.dry_run {
        tracing::warn!("dry run enabled: routine steps are logged, not executed");
    }

    Ok(SharedState {
        storage,
        lights,
        executor,
    })
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: SaltyConfig) -> Result<()> {
    tracing::info!("starting Salty MCP server on stdio");

    let state = setup_shared_state(&config)?;
    let transport = rmcp::transport::stdio();

    let server = state.tools().serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: SaltyConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Salty MCP server on HTTP");

    let state = setup_shared_state(&config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(state.tools()),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
