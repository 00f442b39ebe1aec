// src/core/paths.rs

use crate::{
    constants::{CONFIG_FILENAME, ENVMASTER_CONFIG_ENV, ENVMASTER_PATH_ENV, PATH_LIST_SEPARATOR},
    core::environment::Environment,
};
use std::path::PathBuf;
use thiserror::Error;

/// Failures locating envmaster's directories.
#[derive(Error, Debug)]
pub enum PathError {
    /// The platform has no configuration directory for this user.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
}

/// Returns the envmaster configuration directory (`~/.config/envmaster`).
/// Unlike state directories it is never created: the configuration is optional.
pub fn get_envmaster_config_dir() -> Result<PathBuf, PathError> {
    dirs::config_dir()
        .map(|dir| dir.join("envmaster"))
        .ok_or(PathError::ConfigDirNotFound)
}

/// Where the configuration file should be read from.
///
/// `$ENVMASTER_CONFIG` wins when set; otherwise `<config_dir>/envmaster/config.toml`.
pub fn get_config_file_path(env: &Environment) -> Result<PathBuf, PathError> {
    if let Some(explicit) = env.get_non_empty(ENVMASTER_CONFIG_ENV) {
        return Ok(PathBuf::from(env.expand(explicit)));
    }
    get_envmaster_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Builds the module search path: the static defaults followed by every
/// non-empty entry of `$ENVMASTERPATH`, in order.
pub fn build_search_path(defaults: &[PathBuf], env: &Environment) -> Vec<PathBuf> {
    let mut search_path = defaults.to_vec();
    if let Some(extra) = env.get_non_empty(ENVMASTER_PATH_ENV) {
        search_path.extend(
            extra
                .split(PATH_LIST_SEPARATOR)
                .filter(|entry| !entry.is_empty())
                .map(PathBuf::from),
        );
    }
    log::trace!("Module search path: {:?}", search_path);
    search_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_path_appends_env_entries_after_defaults() {
        let joined = ["/a", "", "/b"].join(&PATH_LIST_SEPARATOR.to_string());
        let env = Environment::from_vars([(ENVMASTER_PATH_ENV, joined)]);
        let path = build_search_path(&[PathBuf::from("/site")], &env);
        assert_eq!(
            path,
            vec![
                PathBuf::from("/site"),
                PathBuf::from("/a"),
                PathBuf::from("/b")
            ]
        );
    }

    #[test]
    fn test_search_path_without_env_is_defaults() {
        let env = Environment::default();
        assert!(build_search_path(&[], &env).is_empty());
    }

    #[test]
    fn test_config_path_honours_override() {
        let env = Environment::from_vars([(ENVMASTER_CONFIG_ENV, "/etc/envmaster.toml")]);
        assert_eq!(
            get_config_file_path(&env).unwrap(),
            PathBuf::from("/etc/envmaster.toml")
        );
    }
}
