// src/cli/handlers/commons.rs

// Shared helpers for the handlers.

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::dispatcher::DispatchError,
    system::shell::{self, ShellBackend},
};

/// Arguments of every command that takes one or more module names.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct ModuleArgs {
    /// Module names, `package` or `package/version`.
    #[arg(required = true, allow_hyphen_values = true)]
    pub modules: Vec<String>,
}

/// Arguments of commands that take none.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct NoArgs {}

/// Parses handler arguments, turning clap's complaint into a usage error.
pub fn parse_args<T: Parser>(command: &str, args: &[String]) -> Result<T> {
    T::try_parse_from(args).map_err(|e| {
        let rendered = e.to_string();
        let first_line = rendered.lines().next().unwrap_or_default();
        let reason = first_line.trim_start_matches("error: ").trim();
        DispatchError::Usage(format!("'{}': {}", command, reason)).into()
    })
}

/// Builds the backend for the dialect named on the command line.
pub fn backend(name: &str) -> Result<Box<dyn ShellBackend>> {
    shell::shell_from_str(name).with_context(|| format!("Cannot emit commands for '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_args_require_a_name() {
        let err = parse_args::<ModuleArgs>("load", &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::Usage(msg)) if msg.starts_with("'load'")
        ));
        let parsed = parse_args::<ModuleArgs>("load", &["gcc".into(), "cmake/3.1".into()]).unwrap();
        assert_eq!(parsed.modules, vec!["gcc", "cmake/3.1"]);
    }

    #[test]
    fn test_no_args_rejects_extras() {
        assert!(parse_args::<NoArgs>("list", &[]).is_ok());
        assert!(parse_args::<NoArgs>("list", &["gcc".into()]).is_err());
    }
}
