//! Whole-house light commands fanned out over the cached device list.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

use super::backend::DeviceChange;
use super::cache::DeviceCache;
use super::color::{parse_color, rgb_to_hsv};
use super::types::DeviceInfo;

/// Color temperature used for devices that cannot render HSV.
pub const FALLBACK_COLOR_TEMP: u32 = 2700;

const NO_DEVICES: &str = "No smart devices found on the network";

/// A command addressed to every light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum LightCommand {
    TurnOn,
    TurnOff,
    SetColor { color: String },
    SetBrightness { level: u8 },
}

/// Outcome of a fan-out command.
#[derive(Debug, Clone, Serialize)]
pub struct LightReport {
    pub response: String,
    pub updated: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Device list plus a human-readable rendering.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceListing {
    pub response: String,
    pub devices: Vec<DeviceInfo>,
}

pub struct LightController {
    cache: Arc<DeviceCache>,
}

impl LightController {
    pub fn new(cache: Arc<DeviceCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<DeviceCache> {
        &self.cache
    }

    /// List devices, optionally bypassing the cache.
    pub async fn discover(&self, force_refresh: bool) -> Result<DeviceListing> {
        let devices = self.non_empty_devices(force_refresh).await?;
        let mut response = format!("Found {} smart device(s):\n", devices.len());
        for d in &devices {
            let _ = write!(response, "\n- {} ({}) at {}", d.alias, d.kind, d.host);
            render_state(&mut response, d);
        }
        Ok(DeviceListing { response, devices })
    }

    /// Current state of every device.
    pub async fn status(&self) -> Result<DeviceListing> {
        let devices = self.non_empty_devices(false).await?;
        let mut response = format!("Status of {} smart device(s):\n", devices.len());
        for d in &devices {
            let _ = write!(response, "\n- {} ({})", d.alias, d.host);
            render_state(&mut response, d);
            if let Some(k) = d.color_temp {
                let _ = write!(response, "\n  Color Temp: {k}K");
            }
        }
        Ok(DeviceListing { response, devices })
    }

    /// Aliases of the devices that are lights (not plugs or power strips).
    pub async fn light_aliases(&self) -> Result<Vec<String>> {
        Ok(self
            .cache
            .devices(false)
            .await?
            .into_iter()
            .filter(|d| d.kind.is_light())
            .map(|d| d.alias)
            .collect())
    }

    pub async fn execute(&self, command: &LightCommand) -> Result<LightReport> {
        match command {
            LightCommand::TurnOn => self.turn_on_all().await,
            LightCommand::TurnOff => self.turn_off_all().await,
            LightCommand::SetColor { color } => self.set_color(color).await,
            LightCommand::SetBrightness { level } => self.set_brightness(*level).await,
        }
    }

    pub async fn turn_on_all(&self) -> Result<LightReport> {
        info!("turning on all devices");
        let (updated, total, warnings) = self
            .fan_out(|_| Some(DeviceChange::Power { on: true }))
            .await?;
        Ok(LightReport {
            response: format!("Turned on {updated} out of {total} devices"),
            updated,
            total,
            warnings,
        })
    }

    pub async fn turn_off_all(&self) -> Result<LightReport> {
        info!("turning off all devices");
        let (updated, total, warnings) = self
            .fan_out(|_| Some(DeviceChange::Power { on: false }))
            .await?;
        Ok(LightReport {
            response: format!("Turned off {updated} out of {total} devices"),
            updated,
            total,
            warnings,
        })
    }

    /// Set every color-capable light to `color`. Tunable white bulbs fall back
    /// to [`FALLBACK_COLOR_TEMP`].
    pub async fn set_color(&self, color: &str) -> Result<LightReport> {
        let rgb = parse_color(color).map_err(anyhow::Error::msg)?;
        let hsv = rgb_to_hsv(rgb);
        info!(color = %color, ?hsv, "setting light color");

        let (updated, total, warnings) = self
            .fan_out(|d| {
                if d.kind.supports_hsv() {
                    Some(DeviceChange::Hsv(hsv))
                } else if d.kind.supports_color_temp() {
                    Some(DeviceChange::ColorTemp {
                        kelvin: FALLBACK_COLOR_TEMP,
                    })
                } else {
                    None
                }
            })
            .await?;
        Ok(LightReport {
            response: format!("Set color to {color} for {updated} out of {total} devices"),
            updated,
            total,
            warnings,
        })
    }

    pub async fn set_brightness(&self, level: u8) -> Result<LightReport> {
        if level > 100 {
            bail!("brightness must be between 0 and 100, got {level}");
        }
        info!(level, "setting light brightness");

        let (updated, total, warnings) = self
            .fan_out(|d| {
                d.kind
                    .supports_brightness()
                    .then_some(DeviceChange::Brightness { level })
            })
            .await?;
        Ok(LightReport {
            response: format!("Set brightness to {level}% for {updated} out of {total} devices"),
            updated,
            total,
            warnings,
        })
    }

    async fn non_empty_devices(&self, force_refresh: bool) -> Result<Vec<DeviceInfo>> {
        let devices = self.cache.devices(force_refresh).await?;
        if devices.is_empty() {
            bail!(NO_DEVICES);
        }
        Ok(devices)
    }

    /// Send the change chosen by `plan` to each device in turn. Devices for
    /// which `plan` returns `None` are counted but left alone. Returns
    /// `(updated, total, warnings)`.
    async fn fan_out<F>(&self, plan: F) -> Result<(usize, usize, Vec<String>)>
    where
        F: Fn(&DeviceInfo) -> Option<DeviceChange>,
    {
        let devices = self.non_empty_devices(false).await?;
        let backend = Arc::clone(self.cache.backend());

        let mut updated = 0;
        let mut warnings = Vec::new();
        for device in &devices {
            let Some(change) = plan(device) else {
                continue;
            };
            match backend.apply(device, change).await {
                Ok(new_state) => {
                    updated += 1;
                    self.cache.replace(new_state).await;
                }
                Err(e) => {
                    let msg = format!("{}: {e}", device.alias);
                    warn!(host = %device.host, error = %e, "device command failed");
                    warnings.push(msg);
                }
            }
        }
        Ok((updated, devices.len(), warnings))
    }
}

fn render_state(out: &mut String, d: &DeviceInfo) {
    let _ = write!(out, "\n  Status: {}", if d.is_on { "On" } else { "Off" });
    if let Some(b) = d.brightness {
        let _ = write!(out, "\n  Brightness: {b}%");
    }
}
