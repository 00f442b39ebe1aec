// src/cli/handlers/mod.rs

// One module per command (or family of commands).

/// `allreload` and `allunload`.
pub mod all;
/// `avail`.
pub mod avail;
/// Argument parsing and backend selection shared by handlers.
pub mod commons;
/// `disp`.
pub mod display;
/// `help` and the usage table.
pub mod help;
/// `list`.
pub mod list;
/// `load`, `unload` and `reload`.
pub mod load;
/// `swap`.
pub mod swap;
