// src/system/shell.rs

//! # Shell backends
//!
//! A backend receives "set variable" and "prepend/remove path segment" intents
//! from a module context and turns them into something the caller can use:
//!
//! - **command dialects** (`bash`, `csh`, `dos`, `python`, `r`) stage one
//!   command per variable and print them on `flush`, for the parent shell to
//!   `eval`;
//! - **`silent`** only updates the in-process `Environment`, for host programs;
//! - **`disp`** collects rows describing what a module would do and prints them
//!   as a table on the diagnostics stream.
//!
//! Every mutating backend also mirrors the change into the `Environment`, so
//! later statements and nested modules read the new value. Because the staged
//! map is keyed by variable name, the last command for a variable wins; that
//! command already carries the cumulative value read back from the mirror.

use crate::{core::environment::Environment, system::format::Formatter};
use std::{
    collections::BTreeMap,
    fmt,
    io::{self, Write},
};
use thiserror::Error;

/// Names accepted by [`shell_from_str`], for error messages and usage text.
pub const KNOWN_SHELLS: &[&str] = &[
    "bash", "sh", "zsh", "ksh", "csh", "tcsh", "dos", "cmd", "python", "r", "silent",
    "pythonsilent", "host", "disp",
];

/// Errors selecting a backend.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The dialect name is not one of [`KNOWN_SHELLS`].
    #[error("Unknown shell '{name}'. Expected one of: {known}", name = .0, known = KNOWN_SHELLS.join(", "))]
    UnknownShell(String),
}

/// The two output streams of an invocation. Only `commands` may be evaluated
/// by the calling shell.
pub struct Streams<'a> {
    /// Generated shell commands (stdout for the CLI).
    pub commands: &'a mut dyn Write,
    /// Titles, listings and tables (stderr for the CLI).
    pub diagnostics: &'a mut dyn Write,
}

impl fmt::Debug for Streams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

/// Metadata rows only the display backend keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// A variable assignment.
    SetEnv,
    /// A path segment prepended to a list.
    PrependPath,
    /// A `prereq` guard.
    Prereq,
    /// A `conflict` guard.
    Conflict,
    /// A module description.
    WhatIs,
    /// A nested `load`.
    Load,
    /// A nested `swap`.
    Swap,
}

impl Report {
    fn label(self) -> &'static str {
        match self {
            Self::SetEnv => "setenv",
            Self::PrependPath => "prepend-path",
            Self::Prereq => "prereq",
            Self::Conflict => "conflict",
            Self::WhatIs => "whatis",
            Self::Load => "load",
            Self::Swap => "swap",
        }
    }
}

/// Common contract of every backend.
pub trait ShellBackend: fmt::Debug {
    /// Assigns `name=value` when `loading`, otherwise unsets `name`.
    fn set_var(&mut self, env: &mut Environment, loading: bool, value: &str, name: &str);

    /// Prepends `value` to the path list `name` when `loading`, otherwise
    /// removes its first occurrence.
    fn set_path(&mut self, env: &mut Environment, loading: bool, value: &str, name: &str);

    /// Records a metadata row. Ignored by everything but the display backend.
    fn report(&mut self, _kind: Report, _name: &str, _value: &str) {}

    /// Sets the title printed above the next flushed report.
    fn set_title(&mut self, _title: &str) {}

    /// Whether this backend reports instead of applying.
    fn is_display(&self) -> bool {
        false
    }

    /// Emits everything staged so far, then applies deferred unsets.
    fn flush(&mut self, env: &mut Environment, streams: &mut Streams<'_>) -> io::Result<()>;
}

// --- MIRRORING ---

/// The final state of one variable after an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Staged {
    Assign(String),
    Unset,
}

fn mirror_var(env: &mut Environment, loading: bool, value: &str, name: &str) -> Staged {
    if loading {
        env.set(name, value);
        Staged::Assign(value.to_string())
    } else {
        // Keep the value readable until flush.
        env.schedule_unset(name);
        Staged::Unset
    }
}

fn mirror_path(env: &mut Environment, loading: bool, value: &str, name: &str) -> Staged {
    let merged = if loading {
        env.prepend_segment(name, value)
    } else {
        env.remove_segment(name, value)
    };
    env.set(name, &merged);
    if merged.is_empty() {
        env.schedule_unset(name);
        Staged::Unset
    } else {
        Staged::Assign(merged)
    }
}

// --- COMMAND DIALECTS ---

/// Command syntax of one interpreter family.
pub trait Dialect: fmt::Debug {
    /// A command assigning and exporting `value` to `name`.
    fn assign(&self, name: &str, value: &str) -> String;
    /// A command removing `name` from the environment.
    fn unset(&self, name: &str) -> String;
    /// A line printed once before any command.
    fn preamble(&self) -> Option<&'static str> {
        None
    }
}

fn quote_posix(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Escapes a value for use within a `cmd.exe` `set "KEY=VALUE"` command.
/// Inside the quotes only `%` still expands.
fn escape_for_cmd_set(value: &str) -> String {
    value.replace('%', "%%")
}

/// A double-quoted literal valid in both Python and R.
fn quote_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// `sh`, `bash`, `zsh` and `ksh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixDialect;

impl Dialect for PosixDialect {
    fn assign(&self, name: &str, value: &str) -> String {
        format!("export {}={};", name, quote_posix(value))
    }
    fn unset(&self, name: &str) -> String {
        format!("unset {};", name)
    }
}

/// `csh` and `tcsh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CshDialect;

impl Dialect for CshDialect {
    fn assign(&self, name: &str, value: &str) -> String {
        format!("setenv {} {};", name, quote_posix(value))
    }
    fn unset(&self, name: &str) -> String {
        format!("unsetenv {};", name)
    }
}

/// `cmd.exe` batch syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct DosDialect;

impl Dialect for DosDialect {
    fn assign(&self, name: &str, value: &str) -> String {
        format!("set \"{}={}\"", name, escape_for_cmd_set(value))
    }
    fn unset(&self, name: &str) -> String {
        format!("set {}=", name)
    }
}

/// Statements for a Python interpreter's `os.environ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonDialect;

impl Dialect for PythonDialect {
    fn assign(&self, name: &str, value: &str) -> String {
        format!("os.environ[{}] = {}", quote_literal(name), quote_literal(value))
    }
    fn unset(&self, name: &str) -> String {
        format!("os.environ.pop({}, None)", quote_literal(name))
    }
    fn preamble(&self) -> Option<&'static str> {
        Some("import os")
    }
}

/// `Sys.setenv` calls for R.
#[derive(Debug, Clone, Copy, Default)]
pub struct RDialect;

impl Dialect for RDialect {
    fn assign(&self, name: &str, value: &str) -> String {
        format!("Sys.setenv({} = {})", quote_literal(name), quote_literal(value))
    }
    fn unset(&self, name: &str) -> String {
        format!("Sys.unsetenv({})", quote_literal(name))
    }
}

/// Stages one command per variable in a given dialect.
#[derive(Debug, Default)]
pub struct CommandShell<D: Dialect> {
    dialect: D,
    staged: BTreeMap<String, Staged>,
}

impl<D: Dialect> CommandShell<D> {
    /// An empty batch for `dialect`.
    pub fn new(dialect: D) -> Self {
        Self {
            dialect,
            staged: BTreeMap::new(),
        }
    }

    fn stage(&mut self, name: &str, staged: Staged) {
        log::trace!("Staging {:?} for '{}'", staged, name);
        self.staged.insert(name.to_string(), staged);
    }
}

impl<D: Dialect> ShellBackend for CommandShell<D> {
    fn set_var(&mut self, env: &mut Environment, loading: bool, value: &str, name: &str) {
        let staged = mirror_var(env, loading, value, name);
        self.stage(name, staged);
    }

    fn set_path(&mut self, env: &mut Environment, loading: bool, value: &str, name: &str) {
        let staged = mirror_path(env, loading, value, name);
        self.stage(name, staged);
    }

    fn flush(&mut self, env: &mut Environment, streams: &mut Streams<'_>) -> io::Result<()> {
        let staged = std::mem::take(&mut self.staged);
        if !staged.is_empty() {
            if let Some(preamble) = self.dialect.preamble() {
                writeln!(streams.commands, "{}", preamble)?;
            }
        }
        for (name, state) in &staged {
            let line = match state {
                Staged::Assign(value) => self.dialect.assign(name, value),
                Staged::Unset => self.dialect.unset(name),
            };
            writeln!(streams.commands, "{}", line)?;
        }
        streams.commands.flush()?;
        env.apply_deferred_unsets();
        Ok(())
    }
}

// --- HOST AND DISPLAY BACKENDS ---

/// Mutates the in-process environment only. Read the result back with
/// [`Environment::vars`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HostShell;

impl ShellBackend for HostShell {
    fn set_var(&mut self, env: &mut Environment, loading: bool, value: &str, name: &str) {
        mirror_var(env, loading, value, name);
    }

    fn set_path(&mut self, env: &mut Environment, loading: bool, value: &str, name: &str) {
        mirror_path(env, loading, value, name);
    }

    fn flush(&mut self, env: &mut Environment, _streams: &mut Streams<'_>) -> io::Result<()> {
        env.apply_deferred_unsets();
        Ok(())
    }
}

/// Collects a report of what modules would do, without touching anything.
#[derive(Debug, Default)]
pub struct DisplayShell {
    title: Option<String>,
    rows: Vec<[String; 3]>,
}

impl DisplayShell {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShellBackend for DisplayShell {
    fn set_var(&mut self, _env: &mut Environment, _loading: bool, value: &str, name: &str) {
        self.report(Report::SetEnv, name, value);
    }

    fn set_path(&mut self, _env: &mut Environment, _loading: bool, value: &str, name: &str) {
        self.report(Report::PrependPath, name, value);
    }

    fn report(&mut self, kind: Report, name: &str, value: &str) {
        self.rows
            .push([kind.label().to_string(), name.to_string(), value.to_string()]);
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn is_display(&self) -> bool {
        true
    }

    fn flush(&mut self, env: &mut Environment, streams: &mut Streams<'_>) -> io::Result<()> {
        let formatter = Formatter::from_env(env);
        if let Some(title) = self.title.take() {
            formatter.title(streams.diagnostics, &title)?;
        }
        formatter.table(streams.diagnostics, &std::mem::take(&mut self.rows))?;
        streams.diagnostics.flush()?;
        env.apply_deferred_unsets();
        Ok(())
    }
}

/// Builds the backend for a dialect name (case-insensitive).
pub fn shell_from_str(name: &str) -> Result<Box<dyn ShellBackend>, ShellError> {
    let shell: Box<dyn ShellBackend> = match name.to_ascii_lowercase().as_str() {
        "bash" | "sh" | "zsh" | "ksh" => Box::new(CommandShell::new(PosixDialect)),
        "csh" | "tcsh" => Box::new(CommandShell::new(CshDialect)),
        "dos" | "cmd" => Box::new(CommandShell::new(DosDialect)),
        "python" => Box::new(CommandShell::new(PythonDialect)),
        "r" => Box::new(CommandShell::new(RDialect)),
        "silent" | "pythonsilent" | "host" => Box::new(HostShell),
        "disp" => Box::new(DisplayShell::new()),
        _ => return Err(ShellError::UnknownShell(name.to_string())),
    };
    log::debug!("Using shell backend {:?}", shell);
    Ok(shell)
}
