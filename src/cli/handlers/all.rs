// src/cli/handlers/all.rs

use anyhow::Result;

use crate::cli::{
    dispatcher::Invocation,
    handlers::commons::{self, NoArgs},
};

/// Handler for `allreload`.
pub fn handle_reload(inv: Invocation<'_, '_>) -> Result<()> {
    let _: NoArgs = commons::parse_args("allreload", &inv.args)?;
    let mut shell = commons::backend(&inv.shell)?;
    inv.session.reload_all(shell.as_mut(), inv.streams)?;
    Ok(())
}

/// Handler for `allunload`.
pub fn handle_unload(inv: Invocation<'_, '_>) -> Result<()> {
    let _: NoArgs = commons::parse_args("allunload", &inv.args)?;
    let mut shell = commons::backend(&inv.shell)?;
    inv.session.unload_all(shell.as_mut(), inv.streams)?;
    Ok(())
}
