// src/cli/handlers/load.rs

use anyhow::Result;

use crate::cli::{
    dispatcher::Invocation,
    handlers::commons::{self, ModuleArgs},
};

/// Handler for `load`: loads modules that are not loaded yet.
pub fn handle_load(inv: Invocation<'_, '_>) -> Result<()> {
    let args: ModuleArgs = commons::parse_args("load", &inv.args)?;
    let mut shell = commons::backend(&inv.shell)?;
    inv.session.load(shell.as_mut(), &args.modules, inv.streams)?;
    Ok(())
}

/// Handler for `unload`: unloads modules, by package or exact version.
pub fn handle_unload(inv: Invocation<'_, '_>) -> Result<()> {
    let args: ModuleArgs = commons::parse_args("unload", &inv.args)?;
    let mut shell = commons::backend(&inv.shell)?;
    inv.session.unload(shell.as_mut(), &args.modules, inv.streams)?;
    Ok(())
}

/// Handler for `reload`: unloads and loads again, which picks up the current
/// default when a bare package name is given.
pub fn handle_reload(inv: Invocation<'_, '_>) -> Result<()> {
    let args: ModuleArgs = commons::parse_args("reload", &inv.args)?;
    let mut shell = commons::backend(&inv.shell)?;
    inv.session.reload(shell.as_mut(), &args.modules, inv.streams)?;
    Ok(())
}
