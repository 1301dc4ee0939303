//! Device discovery and control seam.
//!
//! [`DeviceBackend`] is what the cache and light controller talk to. The
//! [`VirtualBackend`] keeps configured devices in memory, which is what the
//! server uses when no vendor integration is wired in.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use super::color::Hsv;
use super::types::DeviceInfo;
use crate::config::VirtualDeviceConfig;

/// A single state change sent to one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum DeviceChange {
    Power { on: bool },
    Hsv(Hsv),
    ColorTemp { kelvin: u32 },
    Brightness { level: u8 },
}

#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Find every reachable device on the network.
    async fn discover(&self) -> Result<Vec<DeviceInfo>>;

    /// Apply `change` to `device` and return its state afterwards.
    async fn apply(&self, device: &DeviceInfo, change: DeviceChange) -> Result<DeviceInfo>;
}

/// In-memory devices declared in configuration.
pub struct VirtualBackend {
    devices: Mutex<Vec<DeviceInfo>>,
}

impl VirtualBackend {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices: Mutex::new(devices),
        }
    }

    pub fn from_config(devices: &[VirtualDeviceConfig]) -> Self {
        Self::new(
            devices
                .iter()
                .map(|d| DeviceInfo::new(&d.alias, d.kind, &d.host))
                .collect(),
        )
    }
}

#[async_trait]
impl DeviceBackend for VirtualBackend {
    async fn discover(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.lock().await.clone())
    }

    async fn apply(&self, device: &DeviceInfo, change: DeviceChange) -> Result<DeviceInfo> {
        let mut devices = self.devices.lock().await;
        let target = devices
            .iter_mut()
            .find(|d| d.host == device.host)
            .ok_or_else(|| anyhow!("device {} at {} is not reachable", device.alias, device.host))?;

        match change {
            DeviceChange::Power { on } => target.is_on = on,
            DeviceChange::Hsv(hsv) => {
                if !target.kind.supports_hsv() {
                    bail!("{} does not support color", target.alias);
                }
                target.hsv = Some(hsv);
            }
            DeviceChange::ColorTemp { kelvin } => {
                if !target.kind.supports_color_temp() {
                    bail!("{} does not support color temperature", target.alias);
                }
                target.color_temp = Some(kelvin);
                target.hsv = None;
            }
            DeviceChange::Brightness { level } => {
                if !target.kind.supports_brightness() {
                    bail!("{} does not support brightness", target.alias);
                }
                target.brightness = Some(level.min(100));
            }
        }

        tracing::debug!(alias = %target.alias, ?change, "virtual device updated");
        Ok(target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::types::DeviceKind;

    #[tokio::test]
    async fn virtual_backend_applies_changes() {
        let backend = VirtualBackend::new(vec![DeviceInfo::new("Lamp", DeviceKind::Bulb, "10.0.0.2")]);
        let lamp = backend.discover().await.unwrap().remove(0);
        assert!(!lamp.is_on);

        let lamp = backend
            .apply(&lamp, DeviceChange::Power { on: true })
            .await
            .unwrap();
        assert!(lamp.is_on);

        let rediscovered = backend.discover().await.unwrap();
        assert!(rediscovered[0].is_on);
    }

    #[tokio::test]
    async fn virtual_backend_rejects_unsupported_change() {
        let backend = VirtualBackend::new(vec![DeviceInfo::new("Fan", DeviceKind::Plug, "10.0.0.3")]);
        let fan = backend.discover().await.unwrap().remove(0);
        let err = backend
            .apply(&fan, DeviceChange::Brightness { level: 50 })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not support brightness"));
    }
}
