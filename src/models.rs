// src/models.rs

use crate::constants::VERSION_SEPARATOR;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// --- MODULE NAMES ---

/// A module name as typed by the user or stored in the loaded set:
/// `package` or `package/version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleName {
    /// The package part, before the first `/`.
    pub package: String,
    /// The version part, if one was given.
    pub version: Option<String>,
}

impl ModuleName {
    /// Splits a name on its first `/`. An empty version segment counts as absent.
    pub fn parse(name: &str) -> Self {
        let name = name.trim().trim_end_matches(VERSION_SEPARATOR);
        match name.split_once(VERSION_SEPARATOR) {
            Some((package, version)) if !version.is_empty() => Self {
                package: package.to_string(),
                version: Some(version.to_string()),
            },
            _ => Self {
                package: name.to_string(),
                version: None,
            },
        }
    }

    /// The prefix used for variables derived from this package (`GCC`, `MY_TOOL`).
    pub fn var_prefix(&self) -> String {
        self.package
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// `<PREFIX>_<suffix>`.
    pub fn make_var_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.var_prefix(), suffix)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}{}{}", self.package, VERSION_SEPARATOR, version),
            None => write!(f, "{}", self.package),
        }
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// The outcome of a successful resolution: the fully-qualified name and the
/// descriptor file it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Canonical `package` or `package/version` form.
    pub name: ModuleName,
    /// Path of the descriptor file.
    pub path: PathBuf,
}

// --- POLICIES AND MODES ---

/// How `prereq`/`conflict` compare a requested version with loaded ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionMatch {
    /// Versions must be identical.
    #[default]
    Equal,
    /// The loaded version must be greater than or equal to the requested one.
    AtLeast,
    /// The loaded version must be less than or equal to the requested one.
    AtMost,
}

impl FromStr for VersionMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "equal" | "eq" => Ok(Self::Equal),
            "atleast" | "ge" => Ok(Self::AtLeast),
            "atmost" | "le" => Ok(Self::AtMost),
            _ => Err(format!(
                "Unknown version match policy '{}'. Expected equal, atleast or atmost.",
                s
            )),
        }
    }
}

/// The direction a descriptor is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Apply mutations and enforce guards.
    Load,
    /// Revert mutations; guards are not enforced.
    Unload,
    /// Dry run: report intended effects only.
    Display,
}

impl Mode {
    /// Whether this mode applies mutations (display reports them as if loading).
    pub fn is_applying(self) -> bool {
        matches!(self, Self::Load | Self::Display)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "load" | "loading" => Ok(Self::Load),
            "unload" | "unloading" => Ok(Self::Unload),
            "display" | "disp" => Ok(Self::Display),
            _ => Err(format!("Unknown mode '{}'. Expected load, unload or display.", s)),
        }
    }
}

// --- DESCRIPTOR AST ---
// Produced once per evaluation by `core::compiler` and walked by `core::context`.

/// One statement of a module descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `setVar <value> <name>`
    SetVar {
        /// Unexpanded value.
        value: String,
        /// Variable name.
        name: String,
    },
    /// `setPkgVar <value> <suffix>`
    SetPkgVar {
        /// Unexpanded value.
        value: String,
        /// Appended to the package prefix.
        suffix: String,
    },
    /// `setPath <value> <name>`
    SetPath {
        /// Unexpanded path segment.
        value: String,
        /// Path-list variable name.
        name: String,
    },
    /// `setAll <root>`
    SetAll(String),
    /// `setBin`, `setLib`, `setMan`, `setInclude`, `setPython`
    SetTyped {
        /// Which canonical location.
        kind: PathKind,
        /// Unexpanded directory.
        path: String,
    },
    /// `prereq <mod>...`
    Prereq(Vec<String>),
    /// `conflict <mod>...`
    Conflict(Vec<String>),
    /// `load <mod>...`
    Load(Vec<String>),
    /// `swap <old> <new>`
    Swap {
        /// Module to unload.
        old: String,
        /// Module to load.
        new: String,
    },
    /// `whatis <text>`
    WhatIs(String),
    /// `setVersionMatch <policy>`
    SetVersionMatch(VersionMatch),
    /// `if`/`elif`/`else`/`end`
    If {
        /// Condition and body pairs, tried in order.
        branches: Vec<(Condition, Vec<Statement>)>,
        /// The `else` body, empty when absent.
        otherwise: Vec<Statement>,
    },
}

/// A test usable in `if`/`elif`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The variable is set and non-empty.
    Defined(String),
    /// Both operands are equal after expansion.
    Equal(String, String),
    /// The module matches the loaded set under the current policy.
    Loaded(String),
    /// The descriptor is being evaluated in this mode.
    Mode(Mode),
    /// Negation.
    Not(Box<Condition>),
}

/// Canonical package subdirectories handled by the typed setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Executables, prepended to `PATH`.
    Bin,
    /// Libraries, prepended to the library path variable.
    Lib,
    /// Man pages, prepended to `MANPATH`.
    Man,
    /// Headers; recorded in a variable only.
    Include,
    /// Interpreter site packages, prepended to `PYTHONPATH`.
    Python,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versioned_name() {
        let name = ModuleName::parse("gcc/5.0");
        assert_eq!(name.package, "gcc");
        assert_eq!(name.version.as_deref(), Some("5.0"));
        assert_eq!(name.to_string(), "gcc/5.0");
    }

    #[test]
    fn test_parse_bare_and_trailing_separator() {
        assert_eq!(ModuleName::parse("gcc").version, None);
        let name = ModuleName::parse("gcc/");
        assert_eq!(name.package, "gcc");
        assert_eq!(name.version, None);
        assert_eq!(name.to_string(), "gcc");
    }

    #[test]
    fn test_var_prefix_is_upper_case_with_underscores() {
        assert_eq!(ModuleName::parse("my-tool/1.2").var_prefix(), "MY_TOOL");
        assert_eq!(
            ModuleName::parse("gdal").make_var_name("BIN_PATH"),
            "GDAL_BIN_PATH"
        );
    }

    #[test]
    fn test_version_match_from_str() {
        assert_eq!("equal".parse::<VersionMatch>(), Ok(VersionMatch::Equal));
        assert_eq!("at-least".parse::<VersionMatch>(), Ok(VersionMatch::AtLeast));
        assert_eq!("AtMost".parse::<VersionMatch>(), Ok(VersionMatch::AtMost));
        assert!("newest".parse::<VersionMatch>().is_err());
    }
}
