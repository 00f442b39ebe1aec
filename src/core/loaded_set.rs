// src/core/loaded_set.rs

use crate::{
    constants::{LOADED_MODULES_ENV, PATH_LIST_SEPARATOR},
    core::{environment::Environment, version::module_matches},
    models::{ModuleName, VersionMatch},
    system::shell::ShellBackend,
};

/// The modules active in the session, read from `$LOADEDENVMASTER`.
///
/// The variable is itself a path list: loading prepends a name and unloading
/// removes its first occurrence, through the same backend as every other
/// mutation. A `LoadedSet` is therefore a snapshot; take a new one after
/// changing the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSet {
    /// Most recently loaded first.
    entries: Vec<ModuleName>,
}

impl LoadedSet {
    /// Reads the loaded set from the mirror. Unset or empty means nothing is loaded.
    pub fn snapshot(env: &Environment) -> Self {
        let entries = env
            .split_list(LOADED_MODULES_ENV)
            .iter()
            .filter(|entry| !entry.is_empty())
            .map(|entry| ModuleName::parse(entry))
            .collect();
        Self { entries }
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact membership of a fully-qualified name.
    pub fn is_loaded(&self, name: &ModuleName) -> bool {
        self.entries.contains(name)
    }

    /// Entries in stored order, most recent first.
    pub fn recent_first(&self) -> &[ModuleName] {
        &self.entries
    }

    /// Entries in load order, oldest first.
    pub fn oldest_first(&self) -> Vec<ModuleName> {
        self.entries.iter().rev().cloned().collect()
    }

    /// The most recently loaded entry of `requested`'s package, restricted to
    /// its version when one is given.
    pub fn find(&self, requested: &ModuleName) -> Option<&ModuleName> {
        self.entries.iter().find(|entry| {
            entry.package == requested.package
                && requested
                    .version
                    .as_ref()
                    .is_none_or(|version| entry.version.as_ref() == Some(version))
        })
    }

    /// The first entry matching `requested` under `policy`.
    pub fn find_matching(&self, policy: VersionMatch, requested: &ModuleName) -> Option<&ModuleName> {
        self.entries
            .iter()
            .find(|entry| module_matches(policy, requested, entry))
    }

    /// The serialized form, as stored in the environment.
    pub fn to_env_value(&self) -> String {
        self.entries
            .iter()
            .map(ModuleName::to_string)
            .collect::<Vec<_>>()
            .join(&PATH_LIST_SEPARATOR.to_string())
    }
}

/// Records `name` as loaded (prepended).
pub fn register(shell: &mut dyn ShellBackend, env: &mut Environment, name: &ModuleName) {
    log::debug!("Registering '{}' as loaded", name);
    shell.set_path(env, true, &name.to_string(), LOADED_MODULES_ENV);
}

/// Removes the first occurrence of `name` from the loaded set.
pub fn unregister(shell: &mut dyn ShellBackend, env: &mut Environment, name: &ModuleName) {
    log::debug!("Unregistering '{}'", name);
    shell.set_path(env, false, &name.to_string(), LOADED_MODULES_ENV);
}
