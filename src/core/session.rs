// src/core/session.rs

use crate::{
    core::{
        config_loader::{self, EnvMasterConfig},
        engine::TransitionEngine,
        environment::Environment,
        loaded_set::LoadedSet,
        registry::{AvailableRoot, ModuleRegistry},
    },
    errors::Result,
    system::shell::{HostShell, ShellBackend, Streams},
};
use std::io;

/// Everything one invocation needs: configuration, the module registry and
/// the environment mirror. Each operation builds a fresh transition engine
/// over these.
#[derive(Debug, Clone)]
pub struct Session {
    config: EnvMasterConfig,
    registry: ModuleRegistry,
    env: Environment,
}

impl Session {
    /// Snapshots the process environment and loads the configuration file.
    pub fn from_process() -> Result<Self> {
        Self::with_environment(Environment::from_process())
    }

    /// Loads the configuration located through `env`.
    pub fn with_environment(env: Environment) -> Result<Self> {
        let config = config_loader::load_config(&env)?;
        Ok(Self::new(config, env))
    }

    /// A session over explicit configuration and environment.
    pub fn new(config: EnvMasterConfig, env: Environment) -> Self {
        let registry = ModuleRegistry::from_config(&config, &env);
        Self {
            config,
            registry,
            env,
        }
    }

    /// The environment mirror, with every completed operation applied.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Consumes the session, returning its environment.
    pub fn into_environment(self) -> Environment {
        self.env
    }

    /// The module registry built from the search path.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The currently loaded modules.
    pub fn loaded(&self) -> LoadedSet {
        LoadedSet::snapshot(&self.env)
    }

    /// Every descriptor on the search path, grouped by root.
    pub fn available(&self) -> Result<Vec<AvailableRoot>> {
        self.registry.available()
    }

    /// Runs `op` on a fresh engine. A failed operation leaves the
    /// environment as it was before the call.
    fn transact<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut TransitionEngine<'_>) -> Result<()>,
    {
        let before = self.env.clone();
        let result = op(&mut TransitionEngine::new(&self.registry, &self.config, &mut self.env));
        if result.is_err() {
            self.env = before;
        }
        result
    }

    /// Loads `names` through `shell` and flushes it.
    pub fn load(&mut self, shell: &mut dyn ShellBackend, names: &[String], streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.load(shell, names, streams))
    }

    /// Unloads `names` through `shell` and flushes it.
    pub fn unload(&mut self, shell: &mut dyn ShellBackend, names: &[String], streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.unload(shell, names, streams))
    }

    /// Unloads `old` and loads `new` in one flush.
    pub fn swap(&mut self, shell: &mut dyn ShellBackend, old: &str, new: &str, streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.swap(shell, old, new, streams))
    }

    /// Unloads and loads each of `names` again.
    pub fn reload(&mut self, shell: &mut dyn ShellBackend, names: &[String], streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.reload(shell, names, streams))
    }

    /// Reloads every loaded module at its current default version.
    pub fn reload_all(&mut self, shell: &mut dyn ShellBackend, streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.reload_all(shell, streams))
    }

    /// Unloads every loaded module.
    pub fn unload_all(&mut self, shell: &mut dyn ShellBackend, streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.unload_all(shell, streams))
    }

    /// Reports what `names` would do on the diagnostics stream.
    pub fn display(&mut self, names: &[String], streams: &mut Streams<'_>) -> Result<()> {
        self.transact(|engine| engine.display(names, streams))
    }

    /// Loads `names` into this session's environment only, without producing
    /// any commands. Read the result with [`Session::environment`].
    pub fn load_in_process(&mut self, names: &[String]) -> Result<()> {
        let (mut commands, mut diagnostics) = (io::sink(), io::sink());
        let mut streams = Streams {
            commands: &mut commands,
            diagnostics: &mut diagnostics,
        };
        self.transact(|engine| engine.load(&mut HostShell, names, &mut streams))
    }

    /// Counterpart of [`Session::load_in_process`].
    pub fn unload_in_process(&mut self, names: &[String]) -> Result<()> {
        let (mut commands, mut diagnostics) = (io::sink(), io::sink());
        let mut streams = Streams {
            commands: &mut commands,
            diagnostics: &mut diagnostics,
        };
        self.transact(|engine| engine.unload(&mut HostShell, names, &mut streams))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ENVMASTER_CONFIG_ENV, ENVMASTER_PATH_ENV, ENVMASTER_SENTINEL};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_in_process_round_trip() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tool"),
            format!("{}\nsetPath /opt/tool/bin PATH\nsetVar yes TOOL_ENABLED\n", ENVMASTER_SENTINEL),
        )
        .unwrap();
        let env = Environment::from_vars([
            (ENVMASTER_PATH_ENV, dir.path().display().to_string()),
            (ENVMASTER_CONFIG_ENV, dir.path().join("none.toml").display().to_string()),
            ("PATH", "/usr/bin".to_string()),
        ]);
        let mut session = Session::with_environment(env).unwrap();

        session.load_in_process(&["tool".to_string()]).unwrap();
        assert!(session.loaded().is_loaded(&"tool".into()));
        assert_eq!(session.environment().get("TOOL_ENABLED"), Some("yes"));

        session.unload_in_process(&["tool".to_string()]).unwrap();
        assert!(session.loaded().is_empty());
        assert_eq!(session.environment().get("PATH"), Some("/usr/bin"));
        assert_eq!(session.environment().get("TOOL_ENABLED"), None);
    }
}
