// src/core/registry.rs

//! # Module Registry
//!
//! Finds module descriptors on the search path. A name resolves in the first
//! root that contains a matching file or directory; later roots are never
//! consulted. A directory stands for a package whose versions are the files
//! inside it, and resolves to its default version.

use crate::{
    constants::{ENVMASTER_SENTINEL, VERSION_FILENAME},
    core::{
        compiler, config_loader::EnvMasterConfig, environment::Environment,
        loaded_set::LoadedSet, paths,
    },
    errors::{EnvMasterError, Result},
    models::{ModuleName, ResolvedModule},
};
use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// The descriptors found under one search root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableRoot {
    /// The search root.
    pub root: PathBuf,
    /// Module names, sorted; default versions carry a `(default)` suffix.
    pub modules: Vec<String>,
}

/// Resolves module names against an ordered list of roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistry {
    search_path: Vec<PathBuf>,
}

impl ModuleRegistry {
    /// A registry over `search_path`, searched in order.
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// The configured roots followed by those in `$ENVMASTERPATH`.
    pub fn from_config(config: &EnvMasterConfig, env: &Environment) -> Self {
        let defaults: Vec<PathBuf> = config
            .search_paths
            .iter()
            .map(|p| PathBuf::from(env.expand(&p.to_string_lossy())))
            .collect();
        Self::new(paths::build_search_path(&defaults, env))
    }

    /// The roots, in search order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Resolves `name` to its fully-qualified form and descriptor path.
    ///
    /// Returns `Ok(None)` when no root matches. A match that is not a
    /// descriptor is a `Parse` error rather than a miss.
    pub fn resolve(&self, name: &ModuleName) -> Result<Option<ResolvedModule>> {
        let relative = name_to_relative_path(name);
        let Some(candidate) = self
            .search_path
            .iter()
            .map(|root| root.join(&relative))
            .find(|path| path.exists())
        else {
            log::debug!("Module '{}' not found on search path", name);
            return Ok(None);
        };

        let resolved = if candidate.is_dir() {
            let (full_name, path) = find_default(&candidate, &name.package)?;
            ResolvedModule {
                name: full_name,
                path,
            }
        } else {
            ResolvedModule {
                name: name.clone(),
                path: candidate,
            }
        };

        if !is_descriptor(&resolved.path) {
            return Err(EnvMasterError::Parse {
                path: resolved.path,
                reason: "not a module file".to_string(),
            });
        }
        log::debug!(
            "Resolved '{}' to '{}' ({})",
            name,
            resolved.name,
            resolved.path.display()
        );
        Ok(Some(resolved))
    }

    /// Resolves whichever loaded entry `name` refers to: any loaded version of
    /// a bare package, or the exact version when one is given.
    pub fn find_loaded(&self, loaded: &LoadedSet, name: &ModuleName) -> Result<Option<ResolvedModule>> {
        match loaded.find(name) {
            Some(entry) => self.resolve(entry),
            None => Ok(None),
        }
    }

    /// Scans every root for descriptors, one level of versions deep.
    pub fn available(&self) -> Result<Vec<AvailableRoot>> {
        let roots: Vec<AvailableRoot> = self
            .search_path
            .iter()
            .filter(|root| root.is_dir())
            .map(|root| AvailableRoot {
                root: root.clone(),
                modules: scan_root(root),
            })
            .collect();

        if roots.iter().all(|r| r.modules.is_empty()) {
            return Err(EnvMasterError::NoAvailableModules);
        }
        Ok(roots)
    }
}

fn name_to_relative_path(name: &ModuleName) -> PathBuf {
    let mut relative = PathBuf::from(&name.package);
    if let Some(version) = &name.version {
        relative.push(version);
    }
    relative
}

/// Picks the default version inside a package directory.
///
/// A `.version` pin file decides when present; otherwise the first entry of
/// the directory listing (unsorted) is taken. An empty directory yields the
/// bare package name and the directory itself.
pub fn find_default(dir: &Path, package: &str) -> Result<(ModuleName, PathBuf)> {
    let pin = dir.join(VERSION_FILENAME);
    if pin.is_file() {
        let version = read_version_pin(&pin)?;
        let path = dir.join(&version);
        if !path.exists() {
            return Err(EnvMasterError::Path(format!(
                "Unable to find default module version {} in '{}'",
                version,
                dir.display()
            )));
        }
        log::debug!("Default of '{}' pinned to '{}'", package, version);
        return Ok((versioned(package, version), path));
    }

    let first = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .find(|file_name| file_name != VERSION_FILENAME);

    match first {
        Some(version) => {
            log::debug!("No pin in '{}'; using first entry '{}'", dir.display(), version);
            let path = dir.join(&version);
            Ok((versioned(package, version), path))
        }
        None => Ok((ModuleName::parse(package), dir.to_path_buf())),
    }
}

fn versioned(package: &str, version: String) -> ModuleName {
    ModuleName {
        package: package.to_string(),
        version: Some(version),
    }
}

fn read_version_pin(pin: &Path) -> Result<String> {
    let parse_error = |reason: String| EnvMasterError::Parse {
        path: pin.to_path_buf(),
        reason,
    };
    let content = fs::read_to_string(pin)?;
    compiler::compile_version_file(&content)
        .map_err(|e| parse_error(e.to_string()))?
        .ok_or_else(|| parse_error("variable 'version' is not set".to_string()))
}

/// Whether `path` is a readable file starting with the sentinel.
pub fn is_descriptor(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(ENVMASTER_SENTINEL.len());
    match file
        .take(ENVMASTER_SENTINEL.len() as u64)
        .read_to_end(&mut head)
    {
        Ok(_) => head == ENVMASTER_SENTINEL.as_bytes(),
        Err(e) => {
            log::debug!("Could not read '{}': {}", path.display(), e);
            false
        }
    }
}

/// Lists the descriptors under one root: top-level files as `name` and files
/// of package directories as `package/version`.
fn scan_root(root: &Path) -> Vec<String> {
    let mut modules = Vec::new();

    // Links are followed so the listing agrees with `resolve`.
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file()
            || entry.file_name() == VERSION_FILENAME
            || !is_descriptor(path)
        {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();

        if entry.depth() == 1 {
            modules.push(file_name);
            continue;
        }
        let Some(dir) = path.parent() else {
            continue;
        };
        let package = dir
            .file_name()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = versioned(&package, file_name);
        let is_default = match find_default(dir, &package) {
            Ok((default, _)) => default == name,
            Err(e) => {
                log::warn!("Cannot determine default of '{}': {}", package, e);
                false
            }
        };
        if is_default {
            modules.push(format!("{}(default)", name));
        } else {
            modules.push(name.to_string());
        }
    }

    modules.sort();
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{LOADED_MODULES_ENV, PATH_LIST_SEPARATOR};
    use tempfile::TempDir;

    fn write_module(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("{}\n{}", ENVMASTER_SENTINEL, body)).unwrap();
    }

    fn gcc_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_module(&dir.path().join("gcc/4.8"), "setVar 4.8 GCC_VERSION");
        write_module(&dir.path().join("gcc/5.0"), "setVar 5.0 GCC_VERSION");
        write_module(&dir.path().join("gcc/.version"), "version 5.0");
        write_module(&dir.path().join("cmake"), "setVar 1 CMAKE");
        dir
    }

    #[test]
    fn test_resolve_uses_version_pin() {
        let dir = gcc_tree();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        let resolved = registry.resolve(&"gcc".into()).unwrap().unwrap();
        assert_eq!(resolved.name.to_string(), "gcc/5.0");
        assert_eq!(resolved.path, dir.path().join("gcc/5.0"));
    }

    #[test]
    fn test_resolve_explicit_version_and_plain_file() {
        let dir = gcc_tree();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        let resolved = registry.resolve(&"gcc/4.8".into()).unwrap().unwrap();
        assert_eq!(resolved.name.to_string(), "gcc/4.8");
        let resolved = registry.resolve(&"cmake".into()).unwrap().unwrap();
        assert_eq!(resolved.name.to_string(), "cmake");
    }

    #[test]
    fn test_missing_module_is_none() {
        let dir = gcc_tree();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        assert!(registry.resolve(&"clang".into()).unwrap().is_none());
        assert!(registry.resolve(&"gcc/9.9".into()).unwrap().is_none());
    }

    #[test]
    fn test_first_root_wins() {
        let first = TempDir::new().unwrap();
        let second = gcc_tree();
        write_module(&first.path().join("gcc/6.1"), "");
        let registry = ModuleRegistry::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let resolved = registry.resolve(&"gcc".into()).unwrap().unwrap();
        assert_eq!(resolved.name.to_string(), "gcc/6.1");
    }

    #[test]
    fn test_file_without_sentinel_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes"), "just text").unwrap();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        let err = registry.resolve(&"notes".into()).unwrap_err();
        assert!(matches!(err, EnvMasterError::Parse { .. }));
    }

    #[test]
    fn test_pin_to_missing_version_is_path_error() {
        let dir = TempDir::new().unwrap();
        write_module(&dir.path().join("gcc/4.8"), "");
        write_module(&dir.path().join("gcc/.version"), "version 7.0");
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        let err = registry.resolve(&"gcc".into()).unwrap_err();
        assert!(matches!(err, EnvMasterError::Path(_)));
    }

    #[test]
    fn test_pin_without_binding_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write_module(&dir.path().join("gcc/4.8"), "");
        write_module(&dir.path().join("gcc/.version"), "# nothing");
        let err = find_default(&dir.path().join("gcc"), "gcc").unwrap_err();
        assert!(matches!(err, EnvMasterError::Parse { .. }));
    }

    #[test]
    fn test_default_without_pin_and_empty_directory() {
        let dir = TempDir::new().unwrap();
        write_module(&dir.path().join("gdal/3.4"), "");
        let (name, _) = find_default(&dir.path().join("gdal"), "gdal").unwrap();
        assert_eq!(name.to_string(), "gdal/3.4");

        fs::create_dir(dir.path().join("empty")).unwrap();
        let (name, path) = find_default(&dir.path().join("empty"), "empty").unwrap();
        assert_eq!(name.to_string(), "empty");
        assert_eq!(path, dir.path().join("empty"));
    }

    #[test]
    fn test_find_loaded_resolves_loaded_version() {
        let dir = gcc_tree();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        let env = Environment::from_vars([(LOADED_MODULES_ENV, "gcc/4.8")]);
        let loaded = LoadedSet::snapshot(&env);
        let found = registry.find_loaded(&loaded, &"gcc".into()).unwrap().unwrap();
        assert_eq!(found.name.to_string(), "gcc/4.8");
        assert!(registry.find_loaded(&loaded, &"cmake".into()).unwrap().is_none());
    }

    #[test]
    fn test_available_marks_default() {
        let dir = gcc_tree();
        fs::write(dir.path().join("README"), "not a module").unwrap();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf()]);
        let roots = registry.available().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].modules, vec!["cmake", "gcc/4.8", "gcc/5.0(default)"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_available_lists_symlinked_descriptors() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("shared");
        write_module(&shared, "setVar 1 SHARED");
        let root = dir.path().join("modules");
        write_module(&root.join("gcc/4.8"), "");
        write_module(&root.join("gcc/.version"), "version 5.0");
        symlink(&shared, root.join("gcc/5.0")).unwrap();
        symlink(&shared, root.join("cmake")).unwrap();

        let registry = ModuleRegistry::new(vec![root.clone()]);
        assert!(registry.resolve(&"cmake".into()).unwrap().is_some());
        assert!(registry.resolve(&"gcc".into()).unwrap().is_some());
        let roots = registry.available().unwrap();
        assert_eq!(roots[0].modules, vec!["cmake", "gcc/4.8", "gcc/5.0(default)"]);
    }

    #[test]
    fn test_available_with_no_descriptors_fails() {
        let dir = TempDir::new().unwrap();
        let registry = ModuleRegistry::new(vec![dir.path().to_path_buf(), PathBuf::from("/nonexistent")]);
        assert!(matches!(
            registry.available(),
            Err(EnvMasterError::NoAvailableModules)
        ));
    }

    #[test]
    fn test_from_config_orders_roots() {
        let config = EnvMasterConfig {
            search_paths: vec![PathBuf::from("/site/modules")],
            ..EnvMasterConfig::default()
        };
        let env = Environment::from_vars([("ENVMASTERPATH", format!("/a{}/b", PATH_LIST_SEPARATOR))]);
        let registry = ModuleRegistry::from_config(&config, &env);
        assert_eq!(
            registry.search_path(),
            &[
                PathBuf::from("/site/modules"),
                PathBuf::from("/a"),
                PathBuf::from("/b")
            ]
        );
    }
}
