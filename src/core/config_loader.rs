//! # Config Loader
//!
//! Loads the optional `config.toml` that tunes where modules are searched for
//! and which subdirectories `setAll` probes. A missing file is not an error:
//! the built-in defaults mirror a conventional Unix installation layout.

use crate::core::{environment::Environment, paths};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;

/// Errors that can occur while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The TOML content is invalid.
    #[error("Failed to parse TOML file at '{}': {source}", path.display())]
    TomlParse {
        /// The configuration file.
        path: PathBuf,
        /// The underlying parsing error from the `toml` crate.
        #[source]
        source: toml::de::Error,
    },
}

/// Runtime configuration.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EnvMasterConfig {
    /// Module roots searched before those listed in `$ENVMASTERPATH`.
    pub search_paths: Vec<PathBuf>,
    /// Variable receiving library directories.
    pub library_path_var: String,
    /// Candidate subdirectories probed by `setAll`.
    pub subdirs: SubdirConfig,
}

/// Candidate subdirectories, relative to a package root. For every kind except
/// `python`, the first usable candidate wins.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SubdirConfig {
    /// Executables.
    pub bin: Vec<String>,
    /// Libraries.
    pub lib: Vec<String>,
    /// Headers.
    pub include: Vec<String>,
    /// Man pages.
    pub man: Vec<String>,
    /// Interpreter site packages. A `*` matches within a single path segment.
    pub python: Vec<String>,
}

impl Default for EnvMasterConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            library_path_var: default_library_path_var().to_string(),
            subdirs: SubdirConfig::default(),
        }
    }
}

impl Default for SubdirConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            bin: strings(&["bin"]),
            lib: strings(&["lib"]),
            include: strings(&["include"]),
            man: strings(&["share/man", "man"]),
            python: strings(&["lib/python*/site-packages", "lib64/python*/site-packages"]),
        }
    }
}

fn default_library_path_var() -> &'static str {
    if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

impl EnvMasterConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str, path: PathBuf) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParse { path, source })
    }
}

/// Loads the configuration file located through `env`, or the defaults when
/// there is none.
pub fn load_config(env: &Environment) -> Result<EnvMasterConfig, ConfigError> {
    let config_path = match paths::get_config_file_path(env) {
        Ok(path) => path,
        Err(e) => {
            log::debug!("{}. Using default configuration.", e);
            return Ok(EnvMasterConfig::default());
        }
    };

    if !config_path.is_file() {
        log::debug!(
            "No configuration file at '{}'. Using defaults.",
            config_path.display()
        );
        return Ok(EnvMasterConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    log::debug!("Loaded configuration from '{}'", config_path.display());
    EnvMasterConfig::from_toml_str(&content, config_path)
}
