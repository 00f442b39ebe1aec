// src/errors.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, evaluating or applying modules.
///
/// Every variant is fatal to the current invocation; nested `load`/`swap`
/// statements hand them back to their caller unchanged.
#[derive(Error, Debug)]
pub enum EnvMasterError {
    /// The requested module matches nothing on the search path.
    #[error("Can't find module '{0}'")]
    NoModule(String),

    /// A candidate file is not a module descriptor, or a descriptor/version-pin
    /// file could not be parsed.
    #[error("Failed to parse '{}': {reason}", path.display())]
    Parse {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A directory a module depends on does not exist.
    #[error("{0}")]
    Path(String),

    /// None of the prerequisites are loaded.
    #[error(
        "None of the specified prerequisites ({}) required for module {module} are loaded",
        required.join(",")
    )]
    PrereqFailed {
        /// The module declaring the prerequisites.
        module: String,
        /// The unmet list.
        required: Vec<String>,
    },

    /// A conflicting module is loaded.
    #[error("Module {conflicting} already loaded which is listed as a conflict for module {module}")]
    ConflictFailed {
        /// The module declaring the conflict.
        module: String,
        /// The loaded module it conflicts with.
        conflicting: String,
    },

    /// An availability scan found no descriptors anywhere.
    #[error("No module files found")]
    NoAvailableModules,

    /// The shell dialect requested on the command line is not supported.
    #[error(transparent)]
    Shell(#[from] crate::system::shell::ShellError),

    /// `load`/`swap` statements re-entered the engine too many times.
    #[error("Maximum module nesting depth ({0}) exceeded while loading '{1}'. Check for cycles.")]
    NestingTooDeep(u32, String),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::core::config_loader::ConfigError),

    /// Filesystem or output stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used by the core.
pub type Result<T> = std::result::Result<T, EnvMasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prereq_failed_display_lists_requirements() {
        let err = EnvMasterError::PrereqFailed {
            module: "gcc/5.0".into(),
            required: vec!["binutils".into(), "gmp/6.1".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("binutils,gmp/6.1"));
        assert!(msg.contains("gcc/5.0"));
    }

    #[test]
    fn test_parse_error_display_includes_path() {
        let err = EnvMasterError::Parse {
            path: PathBuf::from("/opt/modules/gcc/5.0"),
            reason: "not a module file".into(),
        };
        assert!(err.to_string().contains("/opt/modules/gcc/5.0"));
        assert!(err.to_string().contains("not a module file"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EnvMasterError = io_err.into();
        assert!(matches!(err, EnvMasterError::Io(_)));
    }
}
