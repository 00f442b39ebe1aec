// src/core/engine.rs

use crate::{
    constants::MAX_NESTING_DEPTH,
    core::{
        compiler, config_loader::EnvMasterConfig, context::ModuleContext,
        environment::Environment, loaded_set::{self, LoadedSet}, registry::ModuleRegistry,
    },
    errors::{EnvMasterError, Result},
    models::{Mode, ModuleName, ResolvedModule},
    system::shell::{DisplayShell, ShellBackend, Streams},
};
use std::fs;

/// Drives load, unload, swap and reload transitions for one invocation.
///
/// Every public operation runs against the shell backend it is given and
/// flushes it once at the end. A failing module aborts the operation before
/// the flush, so nothing staged is emitted.
#[derive(Debug)]
pub struct TransitionEngine<'a> {
    registry: &'a ModuleRegistry,
    config: &'a EnvMasterConfig,
    env: &'a mut Environment,
    depth: u32,
}

impl<'a> TransitionEngine<'a> {
    /// An engine at nesting depth zero.
    pub fn new(
        registry: &'a ModuleRegistry,
        config: &'a EnvMasterConfig,
        env: &'a mut Environment,
    ) -> Self {
        Self {
            registry,
            config,
            env,
            depth: 0,
        }
    }

    /// The environment mirror.
    pub fn env(&self) -> &Environment {
        self.env
    }

    /// Mutable access to the environment mirror.
    pub fn env_mut(&mut self) -> &mut Environment {
        self.env
    }

    /// The configuration in effect.
    pub fn config(&self) -> &'a EnvMasterConfig {
        self.config
    }

    // --- FLUSHING OPERATIONS ---

    /// Loads every name in order.
    pub fn load(
        &mut self,
        shell: &mut dyn ShellBackend,
        names: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<()> {
        self.run(shell, names, Mode::Load)?;
        self.flush(shell, streams)
    }

    /// Unloads every name in order. A bare package name unloads whichever
    /// version of it is loaded.
    pub fn unload(
        &mut self,
        shell: &mut dyn ShellBackend,
        names: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<()> {
        self.run(shell, names, Mode::Unload)?;
        self.flush(shell, streams)
    }

    /// Unloads `old` and loads `new` in one batch of commands.
    pub fn swap(
        &mut self,
        shell: &mut dyn ShellBackend,
        old: &str,
        new: &str,
        streams: &mut Streams<'_>,
    ) -> Result<()> {
        self.run(shell, &[old.to_string()], Mode::Unload)?;
        self.run(shell, &[new.to_string()], Mode::Load)?;
        self.flush(shell, streams)
    }

    /// Unloads then loads each name as given.
    pub fn reload(
        &mut self,
        shell: &mut dyn ShellBackend,
        names: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<()> {
        for name in names {
            let batch = std::slice::from_ref(name);
            self.run(shell, batch, Mode::Unload)?;
            self.run(shell, batch, Mode::Load)?;
        }
        self.flush(shell, streams)
    }

    /// Reloads every loaded module, oldest first, picking up each package's
    /// current default version.
    pub fn reload_all(&mut self, shell: &mut dyn ShellBackend, streams: &mut Streams<'_>) -> Result<()> {
        let snapshot = LoadedSet::snapshot(self.env).oldest_first();
        log::debug!("Reloading {} module(s)", snapshot.len());
        for entry in snapshot {
            self.run(shell, &[entry.to_string()], Mode::Unload)?;
            self.run(shell, &[entry.package], Mode::Load)?;
        }
        self.flush(shell, streams)
    }

    /// Unloads every loaded module, most recent first.
    pub fn unload_all(&mut self, shell: &mut dyn ShellBackend, streams: &mut Streams<'_>) -> Result<()> {
        let snapshot = LoadedSet::snapshot(self.env).recent_first().to_vec();
        log::debug!("Unloading {} module(s)", snapshot.len());
        for entry in snapshot {
            self.run(shell, &[entry.to_string()], Mode::Unload)?;
        }
        self.flush(shell, streams)
    }

    /// Reports what each module would do, one titled table per module,
    /// regardless of whether it is loaded.
    pub fn display(&mut self, names: &[String], streams: &mut Streams<'_>) -> Result<()> {
        let mut shell = DisplayShell::new();
        for name in names {
            let module = self.resolve_or_fail(name)?;
            shell.set_title(&module.path.display().to_string());
            self.execute(&mut shell, &module, Mode::Display)?;
            shell.flush(self.env, streams)?;
        }
        Ok(())
    }

    // --- TRANSITIONS ---

    /// Loads or unloads `names` without flushing.
    pub fn run(&mut self, shell: &mut dyn ShellBackend, names: &[String], mode: Mode) -> Result<()> {
        for name in names {
            match mode {
                Mode::Load => {
                    let module = self.resolve_or_fail(name)?;
                    if LoadedSet::snapshot(self.env).is_loaded(&module.name) {
                        log::debug!("'{}' is already loaded", module.name);
                        continue;
                    }
                    self.execute(shell, &module, Mode::Load)?;
                }
                Mode::Unload => self.unload_one(shell, name)?,
                Mode::Display => {
                    let module = self.resolve_or_fail(name)?;
                    self.execute(shell, &module, Mode::Display)?;
                }
            }
        }
        Ok(())
    }

    /// Entry point for `load`/`swap` statements inside a descriptor.
    pub(crate) fn run_nested(
        &mut self,
        shell: &mut dyn ShellBackend,
        names: &[String],
        mode: Mode,
    ) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(EnvMasterError::NestingTooDeep(
                MAX_NESTING_DEPTH,
                names.join(" "),
            ));
        }
        self.depth += 1;
        let result = self.run(shell, names, mode);
        self.depth -= 1;
        result
    }

    fn unload_one(&mut self, shell: &mut dyn ShellBackend, name: &str) -> Result<()> {
        let requested = ModuleName::parse(name);
        let loaded = LoadedSet::snapshot(self.env);

        match self.registry.find_loaded(&loaded, &requested)? {
            Some(module) if loaded.is_loaded(&module.name) => {
                self.execute(shell, &module, Mode::Unload)
            }
            Some(module) => {
                log::debug!("'{}' is not loaded", module.name);
                Ok(())
            }
            // Loaded, but its descriptor is gone from the search path.
            None if loaded.find(&requested).is_some() => Err(EnvMasterError::NoModule(name.to_string())),
            None => {
                if self.registry.resolve(&requested)?.is_none() {
                    return Err(EnvMasterError::NoModule(name.to_string()));
                }
                log::debug!("'{}' is not loaded", name);
                Ok(())
            }
        }
    }

    fn resolve_or_fail(&self, name: &str) -> Result<ResolvedModule> {
        self.registry
            .resolve(&ModuleName::parse(name))?
            .ok_or_else(|| EnvMasterError::NoModule(name.to_string()))
    }

    /// Compiles and evaluates one descriptor. Loading registers the module
    /// before its body runs; unloading unregisters it afterwards.
    fn execute(
        &mut self,
        shell: &mut dyn ShellBackend,
        module: &ResolvedModule,
        mode: Mode,
    ) -> Result<()> {
        let source = fs::read_to_string(&module.path)?;
        let statements =
            compiler::compile_descriptor(&source).map_err(|e| EnvMasterError::Parse {
                path: module.path.clone(),
                reason: e.to_string(),
            })?;
        log::debug!(
            "Evaluating '{}' ({:?}) from '{}'",
            module.name,
            mode,
            module.path.display()
        );

        if mode == Mode::Load && !shell.is_display() {
            loaded_set::register(shell, self.env, &module.name);
        }
        ModuleContext::new(self, shell, module, mode).run(&statements)?;
        if mode == Mode::Unload {
            loaded_set::unregister(shell, self.env, &module.name);
        }
        Ok(())
    }

    fn flush(&mut self, shell: &mut dyn ShellBackend, streams: &mut Streams<'_>) -> Result<()> {
        shell.flush(self.env, streams)?;
        Ok(())
    }
}
