// src/core/mod.rs

pub mod compiler;
pub mod config_loader;
pub mod context;
/// Load, unload, swap and reload transitions.
pub mod engine;
pub mod environment;
/// The `LOADEDENVMASTER` list.
pub mod loaded_set;
/// Configuration file location and search path.
pub mod paths;
pub mod registry;
/// Facade used by the CLI and host programs.
pub mod session;
/// Version comparison under a match policy.
pub mod version;
