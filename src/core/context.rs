// src/core/context.rs

//! # Module Context
//!
//! Evaluates one compiled descriptor. The context is the only thing a
//! descriptor can act through: every statement becomes a call on it, and it
//! forwards mutations to the invocation's shell backend, checks guards against
//! the loaded set, and re-enters the transition engine for nested `load` and
//! `swap` with the same backend.

use crate::{
    constants::{
        BIN_SUFFIX, INCLUDE_SUFFIX, LIB_SUFFIX, MAN_SUFFIX, MANPATH_VAR, PATH_VAR,
        PYTHON_SUFFIX, PYTHONPATH_VAR, ROOT_SUFFIX,
    },
    core::{engine::TransitionEngine, loaded_set::LoadedSet},
    errors::{EnvMasterError, Result},
    models::{Condition, Mode, ModuleName, PathKind, ResolvedModule, Statement, VersionMatch},
    system::shell::{Report, ShellBackend},
};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Execution host for a single descriptor evaluation.
#[derive(Debug)]
pub struct ModuleContext<'c, 'a> {
    engine: &'c mut TransitionEngine<'a>,
    shell: &'c mut dyn ShellBackend,
    module: &'c ResolvedModule,
    mode: Mode,
    policy: VersionMatch,
}

impl<'c, 'a> ModuleContext<'c, 'a> {
    /// A context for evaluating `module` in `mode` with the default policy.
    pub fn new(
        engine: &'c mut TransitionEngine<'a>,
        shell: &'c mut dyn ShellBackend,
        module: &'c ResolvedModule,
        mode: Mode,
    ) -> Self {
        Self {
            engine,
            shell,
            module,
            mode,
            policy: VersionMatch::default(),
        }
    }

    /// Whether the module is being loaded.
    pub fn is_loading(&self) -> bool {
        self.mode == Mode::Load
    }

    /// Whether the module is being unloaded.
    pub fn is_unloading(&self) -> bool {
        self.mode == Mode::Unload
    }

    /// Whether the module is only being reported on.
    pub fn is_display(&self) -> bool {
        self.mode == Mode::Display
    }

    /// The policy guards and `loaded` conditions use.
    pub fn version_match(&self) -> VersionMatch {
        self.policy
    }

    /// Runs statements in order, stopping at the first error.
    pub fn run(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::SetVar { value, name } => self.set_var(value, name),
            Statement::SetPkgVar { value, suffix } => {
                let name = self.module.name.make_var_name(suffix);
                self.set_var(value, &name);
            }
            Statement::SetPath { value, name } => self.set_path(value, name),
            Statement::SetAll(root) => self.set_all(root)?,
            Statement::SetTyped { kind, path } => {
                let path = self.expand(path);
                self.set_typed(*kind, &path);
            }
            Statement::Prereq(names) => self.prereq(names)?,
            Statement::Conflict(names) => self.conflict(names)?,
            Statement::Load(names) => self.load(names)?,
            Statement::Swap { old, new } => self.swap(old, new)?,
            Statement::WhatIs(text) => self.whatis(text),
            Statement::SetVersionMatch(policy) => self.set_version_match(*policy),
            Statement::If {
                branches,
                otherwise,
            } => {
                let mut taken = None;
                for (condition, body) in branches {
                    if self.evaluate(condition) {
                        taken = Some(body);
                        break;
                    }
                }
                self.run(taken.unwrap_or(otherwise))?;
            }
        }
        Ok(())
    }

    fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Defined(name) => self.engine.env().get_non_empty(name).is_some(),
            Condition::Equal(a, b) => self.expand(a) == self.expand(b),
            Condition::Loaded(name) => {
                let requested = ModuleName::parse(&self.expand(name));
                LoadedSet::snapshot(self.engine.env())
                    .find_matching(self.policy, &requested)
                    .is_some()
            }
            Condition::Mode(mode) => self.mode == *mode,
            Condition::Not(inner) => !self.evaluate(inner),
        }
    }

    fn expand(&self, value: &str) -> String {
        self.engine.env().expand(value)
    }

    // --- MUTATIONS ---

    /// Expands references in `value` and sets (or, when unloading, unsets) `name`.
    pub fn set_var(&mut self, value: &str, name: &str) {
        let value = self.expand(value);
        let loading = self.mode.is_applying();
        self.shell.set_var(self.engine.env_mut(), loading, &value, name);
    }

    /// Expands references in `value` and prepends it to (or removes it from)
    /// the path list `name`.
    pub fn set_path(&mut self, value: &str, name: &str) {
        let value = self.expand(value);
        let loading = self.mode.is_applying();
        self.shell.set_path(self.engine.env_mut(), loading, &value, name);
    }

    /// Sets `<PREFIX>_ROOT` and every typed location found under `root`.
    pub fn set_all(&mut self, root: &str) -> Result<()> {
        let root = PathBuf::from(self.expand(root));
        if !root.is_dir() {
            return Err(EnvMasterError::Path(format!(
                "Can't find {}",
                root.display()
            )));
        }
        let root_str = root.to_string_lossy().into_owned();
        let root_var = self.module.name.make_var_name(ROOT_SUFFIX);
        self.set_var(&root_str, &root_var);

        let subdirs = &self.engine.config().subdirs;
        let probes: [(PathKind, &[String], fn(&Path) -> bool); 4] = [
            (PathKind::Bin, subdirs.bin.as_slice(), dir_has_files),
            (PathKind::Lib, subdirs.lib.as_slice(), dir_has_files),
            (PathKind::Include, subdirs.include.as_slice(), dir_has_entries),
            (PathKind::Man, subdirs.man.as_slice(), dir_has_entries),
        ];
        for (kind, candidates, usable) in probes {
            let found = candidates
                .iter()
                .map(|candidate| root.join(candidate))
                .find(|path| usable(path));
            if let Some(path) = found {
                self.set_typed(kind, &path.to_string_lossy());
            }
        }

        // Every site-package directory is applied, not just the first.
        for pattern in &subdirs.python {
            for path in expand_wildcards(&root, pattern) {
                if dir_has_entries(&path) {
                    self.set_typed(PathKind::Python, &path.to_string_lossy());
                }
            }
        }
        Ok(())
    }

    /// Records `<PREFIX>_<KIND>_PATH` and prepends `path` to the matching
    /// shared variable (headers have none).
    pub fn set_typed(&mut self, kind: PathKind, path: &str) {
        let library_var = self.engine.config().library_path_var.as_str();
        let (suffix, shared) = match kind {
            PathKind::Bin => (BIN_SUFFIX, Some(PATH_VAR)),
            PathKind::Lib => (LIB_SUFFIX, Some(library_var)),
            PathKind::Man => (MAN_SUFFIX, Some(MANPATH_VAR)),
            PathKind::Include => (INCLUDE_SUFFIX, None),
            PathKind::Python => (PYTHON_SUFFIX, Some(PYTHONPATH_VAR)),
        };
        let var = self.module.name.make_var_name(suffix);
        self.set_var(path, &var);
        if let Some(shared) = shared {
            self.set_path(path, shared);
        }
    }

    // --- GUARDS AND NESTED OPERATIONS ---

    /// Requires at least one of `names` to be loaded. Only enforced when loading.
    pub fn prereq(&mut self, names: &[String]) -> Result<()> {
        let names = self.expand_all(names);
        match self.mode {
            Mode::Display => self.shell.report(Report::Prereq, "", &names.join(" ")),
            Mode::Unload => {}
            Mode::Load => {
                let loaded = LoadedSet::snapshot(self.engine.env());
                let satisfied = names.iter().any(|name| {
                    loaded
                        .find_matching(self.policy, &ModuleName::parse(name))
                        .is_some()
                });
                if !satisfied {
                    return Err(EnvMasterError::PrereqFailed {
                        module: self.module.name.to_string(),
                        required: names,
                    });
                }
            }
        }
        Ok(())
    }

    /// Requires none of `names` to be loaded. Only enforced when loading.
    pub fn conflict(&mut self, names: &[String]) -> Result<()> {
        let names = self.expand_all(names);
        match self.mode {
            Mode::Display => self.shell.report(Report::Conflict, "", &names.join(" ")),
            Mode::Unload => {}
            Mode::Load => {
                let loaded = LoadedSet::snapshot(self.engine.env());
                for name in &names {
                    if let Some(hit) = loaded.find_matching(self.policy, &ModuleName::parse(name)) {
                        return Err(EnvMasterError::ConflictFailed {
                            module: self.module.name.to_string(),
                            conflicting: hit.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Loads other modules through the same backend.
    pub fn load(&mut self, names: &[String]) -> Result<()> {
        let names = self.expand_all(names);
        match self.mode {
            Mode::Display => self.shell.report(Report::Load, "", &names.join(" ")),
            Mode::Unload => {
                log::debug!(
                    "Not unloading {:?} pulled in by '{}'",
                    names,
                    self.module.name
                );
            }
            Mode::Load => self.engine.run_nested(&mut *self.shell, &names, Mode::Load)?,
        }
        Ok(())
    }

    /// Unloads `old` then loads `new` through the same backend.
    pub fn swap(&mut self, old: &str, new: &str) -> Result<()> {
        let old = self.expand(old);
        let new = self.expand(new);
        match self.mode {
            Mode::Display => self
                .shell
                .report(Report::Swap, "", &format!("{} {}", old, new)),
            Mode::Unload => {
                log::debug!("Not reverting swap {} -> {} of '{}'", old, new, self.module.name);
            }
            Mode::Load => {
                self.engine.run_nested(&mut *self.shell, &[old], Mode::Unload)?;
                self.engine.run_nested(&mut *self.shell, &[new], Mode::Load)?;
            }
        }
        Ok(())
    }

    /// Records a description; only shown in display mode.
    pub fn whatis(&mut self, text: &str) {
        if self.is_display() {
            let text = self.expand(text);
            self.shell.report(Report::WhatIs, "", &text);
        }
    }

    /// Changes the policy for the rest of the descriptor.
    pub fn set_version_match(&mut self, policy: VersionMatch) {
        self.policy = policy;
    }

    fn expand_all(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|n| self.expand(n)).collect()
    }
}

/// A directory holding at least one regular file.
fn dir_has_files(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .any(|e| e.file_type().is_ok_and(|t| t.is_file()))
        })
        .unwrap_or(false)
}

/// A non-empty directory.
fn dir_has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Expands `*` within path segments of `pattern` below `root`. Matches are
/// sorted within each segment.
fn expand_wildcards(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let mut current = vec![root.to_path_buf()];
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        if !segment.contains('*') {
            current = current.into_iter().map(|p| p.join(segment)).collect();
            continue;
        }
        let glob = format!("^{}$", regex::escape(segment).replace(r"\*", ".*"));
        let matcher = match Regex::new(&glob) {
            Ok(re) => re,
            Err(e) => {
                log::warn!("Ignoring subdirectory pattern '{}': {}", pattern, e);
                return Vec::new();
            }
        };
        let mut next = Vec::new();
        for dir in &current {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            let mut matched: Vec<PathBuf> = entries
                .filter_map(std::result::Result::ok)
                .filter(|e| matcher.is_match(&e.file_name().to_string_lossy()))
                .map(|e| e.path())
                .collect();
            matched.sort();
            next.extend(matched);
        }
        current = next;
    }
    current
}
