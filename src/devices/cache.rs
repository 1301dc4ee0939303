//! Time-based device discovery cache.
//!
//! Discovery is slow, so results are kept for `cache_duration`. All access goes
//! through one async mutex, which means concurrent callers on a cold or expired
//! cache trigger exactly one discovery and then share its result.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backend::DeviceBackend;
use super::types::DeviceInfo;

struct CacheEntry {
    devices: Vec<DeviceInfo>,
    fetched_at: Instant,
}

/// Snapshot of cache freshness, reported by the `device_cache_status` tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub cache_valid: bool,
    pub cached_devices: usize,
    pub cache_age_seconds: u64,
    pub cache_duration_seconds: u64,
    pub cache_expires_in: u64,
}

pub struct DeviceCache {
    backend: Arc<dyn DeviceBackend>,
    cache_duration: Duration,
    max_stale: Duration,
    state: Mutex<Option<CacheEntry>>,
}

impl DeviceCache {
    /// `cache_duration` is how long a discovery stays fresh; `max_stale` is how
    /// old an entry may be and still be served when re-discovery fails.
    pub fn new(backend: Arc<dyn DeviceBackend>, cache_duration: Duration, max_stale: Duration) -> Self {
        Self {
            backend,
            cache_duration,
            max_stale,
            state: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &Arc<dyn DeviceBackend> {
        &self.backend
    }

    /// Cached devices, re-discovering when the entry is expired or
    /// `force_refresh` is set.
    pub async fn devices(&self, force_refresh: bool) -> Result<Vec<DeviceInfo>> {
        let mut state = self.state.lock().await;

        if !force_refresh {
            if let Some(entry) = state.as_ref() {
                if entry.fetched_at.elapsed() < self.cache_duration {
                    debug!(count = entry.devices.len(), "serving devices from cache");
                    return Ok(entry.devices.clone());
                }
            }
        }

        debug!(force_refresh, "discovering devices");
        match self.backend.discover().await {
            Ok(devices) => {
                info!(count = devices.len(), "device cache refreshed");
                *state = Some(CacheEntry {
                    devices: devices.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(devices)
            }
            Err(e) => {
                if let Some(entry) = state.as_ref() {
                    let age = entry.fetched_at.elapsed();
                    if age < self.max_stale {
                        warn!(
                            error = %e,
                            age_secs = age.as_secs(),
                            "device discovery failed, serving stale cache"
                        );
                        return Ok(entry.devices.clone());
                    }
                }
                Err(e.context("device discovery failed"))
            }
        }
    }

    /// Overwrite one cached device (matched by host) after a control command.
    pub async fn replace(&self, device: DeviceInfo) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.as_mut() {
            if let Some(slot) = entry.devices.iter_mut().find(|d| d.host == device.host) {
                *slot = device;
            }
        }
    }

    /// Drop the cached entry so the next lookup re-discovers.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
        info!("device cache invalidated");
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        let duration_secs = self.cache_duration.as_secs();

        match state.as_ref() {
            Some(entry) => {
                let age = entry.fetched_at.elapsed();
                let valid = age < self.cache_duration;
                CacheStatus {
                    cache_valid: valid,
                    cached_devices: entry.devices.len(),
                    cache_age_seconds: age.as_secs(),
                    cache_duration_seconds: duration_secs,
                    cache_expires_in: self.cache_duration.saturating_sub(age).as_secs(),
                }
            }
            None => CacheStatus {
                cache_valid: false,
                cached_devices: 0,
                cache_age_seconds: 0,
                cache_duration_seconds: duration_secs,
                cache_expires_in: 0,
            },
        }
    }
}
