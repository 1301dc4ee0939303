//! Salty: a home controller exposed to AI agents over MCP.
//!
//! Salty stores user-defined *routines* (ordered lists of light, music, TV,
//! voice and wait steps), runs them on demand, and keeps a bounded execution
//! history. Smart lights are reached through a [`devices::backend::DeviceBackend`]
//! whose discovery results are held in a time-based cache.
//!
//! # Storage layout
//!
//! | Path | Contents |
//! |------|----------|
//! | `<routines_dir>/custom_routines/<name>.json` | One file per routine |
//! | `<routines_dir>/routine_history.json` | Most recent executions (capped) |
//! | `<routines_dir>/backups/<backup>.json` | Full snapshots |
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`routine`]: routine model, file storage, backup/restore, statistics and execution
//! - [`devices`]: device model, color parsing, discovery cache and light fan-out
//! - [`tools`]: the MCP tool surface
//! - [`server`]: stdio and Streamable HTTP transports

pub mod config;
pub mod devices;
pub mod routine;
pub mod server;
pub mod tools;
