//! Per-session shell environment management through versioned module
//! descriptors.
//!
//! The binary prints shell commands for the caller to `eval`. Host programs can
//! instead drive a [`core::session::Session`] with the in-process backend and
//! read the converged environment back.

/// Command-line front end.
pub mod cli;
/// Fixed names and limits.
pub mod constants;
pub mod core;
/// Crate-level error type.
pub mod errors;
/// Module names, modes and the compiled descriptor tree.
pub mod models;
pub mod system;
