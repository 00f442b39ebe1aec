//! # System Interaction Layer
//!
//! Everything that produces output for the world outside the process.
//!
//! ## Modules
//!
//! - **`shell`**: The shell backends. They turn environment mutations into
//!   commands for the calling shell (or apply them in-process, or report them)
//!   and define the commands/diagnostics stream split.
//! - **`format`**: Terminal-width aware rendering of titles, column listings
//!   and tables for the diagnostics stream.

/// Diagnostics rendering.
pub mod format;
pub mod shell;
