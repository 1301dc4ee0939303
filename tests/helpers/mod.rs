#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use salty::devices::backend::{DeviceBackend, DeviceChange, VirtualBackend};
use salty::devices::cache::DeviceCache;
use salty::devices::lights::LightController;
use salty::devices::types::{DeviceInfo, DeviceKind};
use salty::routine::types::{Routine, RoutineStep, StepType};
use salty::routine::RoutineStorage;

/// A routine store in a fresh temporary directory. Keep the `TempDir` alive
/// for as long as the store is used.
pub fn temp_storage() -> (TempDir, RoutineStorage) {
    let dir = TempDir::new().unwrap();
    let storage = RoutineStorage::open(dir.path()).unwrap();
    (dir, storage)
}

/// A two-step light routine.
pub fn light_routine(name: &str) -> Routine {
    Routine::new(
        name,
        "test routine",
        vec![
            RoutineStep::new(StepType::LightControl, "Turn On"),
            RoutineStep::new(StepType::LightControl, "Set Color: Blue"),
        ],
    )
}

/// One color bulb, one white bulb and one plug.
pub fn test_devices() -> Vec<DeviceInfo> {
    vec![
        DeviceInfo::new("Living Room", DeviceKind::Bulb, "10.0.0.10"),
        DeviceInfo::new("Hallway", DeviceKind::WhiteBulb, "10.0.0.11"),
        DeviceInfo::new("Fan", DeviceKind::Plug, "10.0.0.12"),
    ]
}

/// Backend that counts discoveries and can be told to fail.
pub struct ScriptedBackend {
    inner: VirtualBackend,
    pub discover_calls: AtomicUsize,
    pub fail_discovery: AtomicBool,
    discovery_delay: Duration,
    unreachable_host: Option<String>,
}

impl ScriptedBackend {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            inner: VirtualBackend::new(devices),
            discover_calls: AtomicUsize::new(0),
            fail_discovery: AtomicBool::new(false),
            discovery_delay: Duration::ZERO,
            unreachable_host: None,
        }
    }

    pub fn with_discovery_delay(mut self, delay: Duration) -> Self {
        self.discovery_delay = delay;
        self
    }

    /// Commands sent to `host` fail as if the device were offline.
    pub fn with_unreachable(mut self, host: &str) -> Self {
        self.unreachable_host = Some(host.to_string());
        self
    }

    pub fn discoveries(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_discovery.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceBackend for ScriptedBackend {
    async fn discover(&self) -> Result<Vec<DeviceInfo>> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if !self.discovery_delay.is_zero() {
            tokio::time::sleep(self.discovery_delay).await;
        }
        if self.fail_discovery.load(Ordering::SeqCst) {
            bail!("network unreachable");
        }
        self.inner.discover().await
    }

    async fn apply(&self, device: &DeviceInfo, change: DeviceChange) -> Result<DeviceInfo> {
        if self.unreachable_host.as_deref() == Some(device.host.as_str()) {
            bail!("connection timed out");
        }
        self.inner.apply(device, change).await
    }
}

/// A cache with a long freshness window over `backend`.
pub fn cache_over(backend: Arc<ScriptedBackend>) -> Arc<DeviceCache> {
    Arc::new(DeviceCache::new(
        backend,
        Duration::from_secs(30),
        Duration::from_secs(300),
    ))
}

pub fn light_controller(backend: Arc<ScriptedBackend>) -> Arc<LightController> {
    Arc::new(LightController::new(cache_over(backend)))
}
