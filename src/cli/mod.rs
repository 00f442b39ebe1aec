use clap::Parser;

/// Command registry and routing.
pub mod dispatcher;
/// Command handlers.
pub mod handlers;

/// envmaster: per-session shell environment management through module files.
///
/// Prints shell commands on stdout; run it through `eval` from your shell.
#[derive(Parser, Debug)]
#[command(author, version, about)]
// `help` is one of our commands, not clap's subcommand.
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// Shell dialect to emit commands for (bash, csh, dos, python, r, silent, disp).
    pub shell: Option<String>,

    /// Command to run (avail, list, help, disp, load, unload, swap, reload,
    /// allreload, allunload).
    pub command: Option<String>,

    /// Module names.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}
