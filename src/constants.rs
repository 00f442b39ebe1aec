// src/constants.rs

/// Every module descriptor (and version-pin file) must start with this string.
pub const ENVMASTER_SENTINEL: &str = "#%EnvMaster1.0";

/// Environment variable holding the currently loaded modules, most recent first.
pub const LOADED_MODULES_ENV: &str = "LOADEDENVMASTER";

/// Environment variable holding extra module search roots.
pub const ENVMASTER_PATH_ENV: &str = "ENVMASTERPATH";

/// Environment variable that overrides the location of the configuration file.
pub const ENVMASTER_CONFIG_ENV: &str = "ENVMASTER_CONFIG";

/// Name of the configuration file inside `<config_dir>/envmaster/`.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Name of the file inside a module directory that pins its default version.
pub const VERSION_FILENAME: &str = ".version";

/// The binding a version-pin file must define.
pub const VERSION_BINDING: &str = "version";

/// Separator between entries of path-list variables.
pub const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Separator between a package name and its version.
pub const VERSION_SEPARATOR: char = '/';

/// Variable receiving executable directories.
pub const PATH_VAR: &str = "PATH";

/// Variable receiving man page directories.
pub const MANPATH_VAR: &str = "MANPATH";

/// Variable receiving interpreter site-package directories.
pub const PYTHONPATH_VAR: &str = "PYTHONPATH";

// Suffixes appended to the package prefix by `setAll` and the typed setters.
/// `<PREFIX>_ROOT`: the directory given to `setAll`.
pub const ROOT_SUFFIX: &str = "ROOT";
/// Executables.
pub const BIN_SUFFIX: &str = "BIN_PATH";
/// Libraries.
pub const LIB_SUFFIX: &str = "LIB_PATH";
/// Headers.
pub const INCLUDE_SUFFIX: &str = "INCLUDE_PATH";
/// Man pages.
pub const MAN_SUFFIX: &str = "MAN_PATH";
/// Site packages.
pub const PYTHON_SUFFIX: &str = "PYTHON_PATH";

/// Maximum depth of `load`/`swap` statements re-entering the transition engine.
pub const MAX_NESTING_DEPTH: u32 = 32;

/// Terminal width assumed when `COLUMNS` is not available.
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;
