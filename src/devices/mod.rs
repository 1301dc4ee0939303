//! Smart-device discovery cache and light control.
//!
//! [`cache::DeviceCache`] sits in front of a [`backend::DeviceBackend`] and
//! [`lights::LightController`] fans whole-house commands out over the cached
//! device list.

pub mod backend;
pub mod cache;
pub mod color;
pub mod lights;
pub mod types;
