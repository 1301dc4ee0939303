//! Smart-device records as seen by discovery.

use serde::{Deserialize, Serialize};

use super::color::Hsv;

/// Hardware class of a discovered device. Capabilities follow from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Full-color bulb (HSV, color temperature, brightness).
    Bulb,
    /// Tunable white bulb (color temperature and brightness, no HSV).
    WhiteBulb,
    /// Full-color light strip.
    LightStrip,
    /// Wall dimmer (brightness only).
    Dimmer,
    Plug,
    PowerStrip,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulb => "bulb",
            Self::WhiteBulb => "white_bulb",
            Self::LightStrip => "light_strip",
            Self::Dimmer => "dimmer",
            Self::Plug => "plug",
            Self::PowerStrip => "power_strip",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(
            self,
            Self::Bulb | Self::WhiteBulb | Self::LightStrip | Self::Dimmer
        )
    }

    pub fn supports_hsv(&self) -> bool {
        matches!(self, Self::Bulb | Self::LightStrip)
    }

    pub fn supports_color_temp(&self) -> bool {
        matches!(self, Self::Bulb | Self::WhiteBulb | Self::LightStrip)
    }

    pub fn supports_brightness(&self) -> bool {
        self.is_light()
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Snapshot of one device's identity and state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub alias: String,
    pub kind: DeviceKind,
    /// Network address; unique per device.
    pub host: String,
    pub is_on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsv: Option<Hsv>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u32>,
}

impl DeviceInfo {
    /// A powered-off device with capability-appropriate defaults.
    pub fn new(alias: impl Into<String>, kind: DeviceKind, host: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            kind,
            host: host.into(),
            is_on: false,
            brightness: kind.supports_brightness().then_some(100),
            hsv: None,
            color_temp: kind.supports_color_temp().then_some(2700),
        }
    }
}
