// tests/transitions.rs
//
// End-to-end transitions through the public `Session` API.

use envmaster::{
    constants::{ENVMASTER_PATH_ENV, ENVMASTER_SENTINEL, LOADED_MODULES_ENV},
    core::{
        config_loader::EnvMasterConfig, environment::Environment, session::Session,
    },
    errors::EnvMasterError,
    system::shell::{CommandShell, PosixDialect, Streams},
};
use std::{fs, path::Path};
use tempfile::TempDir;

fn write_module(root: &Path, name: &str, body: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{}\n{}\n", ENVMASTER_SENTINEL, body)).unwrap();
}

/// A module root holding `gcc/4.8` and `gcc/5.0` (pinned as default), each
/// pointing `setAll` at an install tree with a populated `bin/`.
struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let modules = dir.path().join("modules");
        for version in ["4.8", "5.0"] {
            let install = dir.path().join("opt").join("gcc").join(version);
            fs::create_dir_all(install.join("bin")).unwrap();
            fs::write(install.join("bin").join("gcc"), "").unwrap();
            write_module(
                &modules,
                &format!("gcc/{}", version),
                &format!("setAll '{}'", install.display()),
            );
        }
        write_module(&modules, "gcc/.version", "version 5.0");
        write_module(&modules, "cmake", "prereq gcc\nsetVar 3.1 CMAKE_VERSION");
        write_module(&modules, "clang", "conflict gcc/5.0\nsetVar on CLANG");
        write_module(&modules, "toolchain", "load gcc cmake\nsetVar yes TOOLCHAIN");
        Self { dir }
    }

    fn modules(&self) -> String {
        self.dir.path().join("modules").display().to_string()
    }

    fn install(&self, version: &str) -> String {
        self.dir.path().join("opt").join("gcc").join(version).display().to_string()
    }

    fn session(&self) -> Session {
        let env = Environment::from_vars([
            (ENVMASTER_PATH_ENV, self.modules()),
            ("PATH", "/usr/bin".to_string()),
        ]);
        Session::new(EnvMasterConfig::default(), env)
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Runs `f` with a posix backend and returns the emitted commands.
fn posix<T>(
    session: &mut Session,
    f: impl FnOnce(&mut Session, &mut CommandShell<PosixDialect>, &mut Streams<'_>) -> T,
) -> (T, String) {
    let mut shell = CommandShell::new(PosixDialect);
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let result = f(
        session,
        &mut shell,
        &mut Streams {
            commands: &mut out,
            diagnostics: &mut diag,
        },
    );
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_load_then_unload_gcc_through_pinned_default() {
    let site = Site::new();
    let mut session = site.session();

    let (result, commands) = posix(&mut session, |s, shell, streams| {
        s.load(shell, &names(&["gcc"]), streams)
    });
    result.unwrap();
    let root = site.install("5.0");
    assert!(commands.contains(&format!("export GCC_ROOT='{}';", root)));
    assert!(commands.contains(&format!("export {}='gcc/5.0';", LOADED_MODULES_ENV)));
    assert!(commands.contains(&format!("export PATH='{}/bin:/usr/bin';", root)));
    let loaded: Vec<String> = session.loaded().recent_first().iter().map(|m| m.to_string()).collect();
    assert_eq!(loaded, vec!["gcc/5.0"]);

    let (result, commands) = posix(&mut session, |s, shell, streams| {
        s.unload(shell, &names(&["gcc"]), streams)
    });
    result.unwrap();
    assert!(commands.contains("unset GCC_ROOT;"));
    assert!(commands.contains("unset GCC_BIN_PATH;"));
    assert!(commands.contains(&format!("unset {};", LOADED_MODULES_ENV)));
    assert!(commands.contains("export PATH='/usr/bin';"));
    assert!(session.loaded().is_empty());
    assert_eq!(session.environment().get("GCC_ROOT"), None);
    assert_eq!(session.environment().get("PATH"), Some("/usr/bin"));
}

#[test]
fn test_explicit_version_bypasses_pin() {
    let site = Site::new();
    let mut session = site.session();
    session.load_in_process(&names(&["gcc/4.8"])).unwrap();
    assert!(session.loaded().is_loaded(&"gcc/4.8".into()));
    assert_eq!(
        session.environment().get("GCC_ROOT"),
        Some(site.install("4.8").as_str())
    );
}

#[test]
fn test_loading_twice_changes_nothing() {
    let site = Site::new();
    let mut session = site.session();
    session.load_in_process(&names(&["gcc"])).unwrap();
    let before = session.environment().clone();

    let (result, commands) = posix(&mut session, |s, shell, streams| {
        s.load(shell, &names(&["gcc"]), streams)
    });
    result.unwrap();
    assert!(commands.is_empty());
    assert_eq!(session.environment().vars(), before.vars());
}

#[test]
fn test_swap_equals_unload_then_load_in_one_batch() {
    let site = Site::new();
    let mut swapped = site.session();
    swapped.load_in_process(&names(&["gcc/4.8"])).unwrap();
    let mut sequential = swapped.clone();

    let (result, swap_commands) = posix(&mut swapped, |s, shell, streams| {
        s.swap(shell, "gcc/4.8", "gcc/5.0", streams)
    });
    result.unwrap();

    sequential.unload_in_process(&names(&["gcc/4.8"])).unwrap();
    sequential.load_in_process(&names(&["gcc/5.0"])).unwrap();

    assert_eq!(swapped.environment().vars(), sequential.environment().vars());
    assert!(swap_commands.contains(&format!("export {}='gcc/5.0';", LOADED_MODULES_ENV)));
    assert!(!swap_commands.contains(&site.install("4.8")));
}

#[test]
fn test_prereq_requires_a_loaded_match() {
    let site = Site::new();
    let mut session = site.session();

    let err = session.load_in_process(&names(&["cmake"])).unwrap_err();
    assert!(matches!(err, EnvMasterError::PrereqFailed { .. }));
    assert!(session.loaded().is_empty());

    session.load_in_process(&names(&["gcc/4.8", "cmake"])).unwrap();
    assert_eq!(session.environment().get("CMAKE_VERSION"), Some("3.1"));
}

#[test]
fn test_conflict_matches_exact_version_only() {
    let site = Site::new();
    let mut session = site.session();
    session.load_in_process(&names(&["gcc/4.8", "clang"])).unwrap();
    assert_eq!(session.environment().get("CLANG"), Some("on"));

    let mut session = site.session();
    session.load_in_process(&names(&["gcc/5.0"])).unwrap();
    let err = session.load_in_process(&names(&["clang"])).unwrap_err();
    assert!(matches!(err, EnvMasterError::ConflictFailed { .. }));
}

#[test]
fn test_nested_loads_register_every_module() {
    let site = Site::new();
    let mut session = site.session();
    session.load_in_process(&names(&["toolchain"])).unwrap();

    let loaded = session.loaded();
    for name in ["toolchain", "gcc/5.0", "cmake"] {
        assert!(loaded.is_loaded(&name.into()), "{} not loaded", name);
    }
    assert_eq!(session.environment().get("TOOLCHAIN"), Some("yes"));
}

#[test]
fn test_unload_all_restores_the_starting_environment() {
    let site = Site::new();
    let mut session = site.session();
    let start = session.environment().clone();
    session.load_in_process(&names(&["gcc", "cmake"])).unwrap();

    let (result, _) = posix(&mut session, |s, shell, streams| s.unload_all(shell, streams));
    result.unwrap();
    assert!(session.loaded().is_empty());
    assert_eq!(session.environment().vars(), start.vars());
}

#[test]
fn test_failed_load_leaves_environment_untouched() {
    let site = Site::new();
    let mut session = site.session();
    session.load_in_process(&names(&["gcc"])).unwrap();
    let before = session.environment().clone();

    let err = session.load_in_process(&names(&["cmake", "clang"])).unwrap_err();
    assert!(matches!(err, EnvMasterError::ConflictFailed { .. }));
    assert_eq!(session.environment().vars(), before.vars());
}

#[test]
fn test_unknown_module_is_reported() {
    let site = Site::new();
    let mut session = site.session();
    let err = session.load_in_process(&names(&["nope"])).unwrap_err();
    assert!(matches!(err, EnvMasterError::NoModule(name) if name == "nope"));
}

#[test]
fn test_available_marks_the_default_version() {
    let site = Site::new();
    let session = site.session();
    let roots = session.available().unwrap();
    assert_eq!(roots.len(), 1);
    let modules = &roots.first().unwrap().modules;
    assert!(modules.contains(&"gcc/5.0(default)".to_string()), "{:?}", modules);
    assert!(modules.contains(&"gcc/4.8".to_string()));
    assert!(modules.contains(&"cmake".to_string()));
}
