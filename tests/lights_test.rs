mod helpers;

use helpers::{light_controller, test_devices, ScriptedBackend};
use salty::devices::lights::{LightCommand, FALLBACK_COLOR_TEMP};
use salty::devices::types::{DeviceInfo, DeviceKind};
use std::sync::Arc;

#[tokio::test]
async fn turn_on_reaches_every_device() {
    let backend = Arc::new(ScriptedBackend::new(test_devices()));
    let lights = light_controller(backend);

    let report = lights.turn_on_all().await.unwrap();
    assert_eq!(report.updated, 3);
    assert_eq!(report.total, 3);
    assert_eq!(report.response, "Turned on 3 out of 3 devices");
    assert!(report.warnings.is_empty());

    let status = lights.status().await.unwrap();
    assert!(status.devices.iter().all(|d| d.is_on), "cache reflects new state");
}

#[tokio::test]
async fn set_color_uses_hsv_or_white_fallback() {
    let backend = Arc::new(ScriptedBackend::new(test_devices()));
    let lights = light_controller(backend);

    let report = lights.set_color("blue").await.unwrap();
    assert_eq!(report.updated, 2, "the plug is skipped");
    assert_eq!(report.total, 3);
    assert_eq!(report.response, "Set color to blue for 2 out of 3 devices");

    let devices = lights.status().await.unwrap().devices;
    let living = devices.iter().find(|d| d.alias == "Living Room").unwrap();
    assert_eq!(living.hsv.unwrap().hue, 240);
    let hallway = devices.iter().find(|d| d.alias == "Hallway").unwrap();
    assert_eq!(hallway.color_temp, Some(FALLBACK_COLOR_TEMP));
    assert!(hallway.hsv.is_none());
}

#[tokio::test]
async fn invalid_hex_color_is_rejected() {
    let backend = Arc::new(ScriptedBackend::new(test_devices()));
    let lights = light_controller(backend);
    assert!(lights.set_color("#12345").await.is_err());
}

#[tokio::test]
async fn brightness_applies_to_dimmable_lights() {
    let backend = Arc::new(ScriptedBackend::new(test_devices()));
    let lights = light_controller(backend);

    let report = lights.set_brightness(40).await.unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(report.response, "Set brightness to 40% for 2 out of 3 devices");

    assert!(lights.set_brightness(101).await.is_err());
}

#[tokio::test]
async fn unreachable_device_becomes_a_warning() {
    let backend = Arc::new(ScriptedBackend::new(test_devices()).with_unreachable("10.0.0.11"));
    let lights = light_controller(backend);

    let report = lights.execute(&LightCommand::TurnOff).await.unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(report.total, 3);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("Hallway:"));
}

#[tokio::test]
async fn no_devices_is_an_error() {
    let backend = Arc::new(ScriptedBackend::new(Vec::new()));
    let lights = light_controller(backend);

    let err = lights.turn_on_all().await.unwrap_err();
    assert!(err.to_string().contains("No smart devices found"));
    assert!(lights.discover(false).await.is_err());
}

#[tokio::test]
async fn discover_lists_devices_and_light_aliases() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        DeviceInfo::new("Desk Strip", DeviceKind::LightStrip, "10.0.0.20"),
        DeviceInfo::new("Heater", DeviceKind::PowerStrip, "10.0.0.21"),
    ]));
    let lights = light_controller(backend.clone());

    let listing = lights.discover(true).await.unwrap();
    assert_eq!(listing.devices.len(), 2);
    assert!(listing.response.starts_with("Found 2 smart device(s)"));
    assert!(listing.response.contains("Desk Strip (light_strip) at 10.0.0.20"));

    assert_eq!(lights.light_aliases().await.unwrap(), ["Desk Strip"]);
    assert_eq!(backend.discoveries(), 1);
}
