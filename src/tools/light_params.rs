//! Parameter definitions for the smart-light tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DiscoverDevicesParams {
    #[schemars(description = "Bypass the device cache and re-discover (default: false)")]
    pub force_refresh: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetLightColorParams {
    #[schemars(
        description = "Color name (red, orange, yellow, green, blue, purple, pink, white, warm_white, cool_white) or hex code like '#FF8800'"
    )]
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetLightBrightnessParams {
    #[schemars(description = "Brightness percentage 0-100")]
    pub brightness: u8,
}
