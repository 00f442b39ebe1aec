// src/cli/handlers/display.rs

use anyhow::Result;

use crate::cli::{
    dispatcher::Invocation,
    handlers::commons::{self, ModuleArgs},
};

/// Handler for `disp`. Always reports on the diagnostics stream, whatever
/// shell was named.
pub fn handle(inv: Invocation<'_, '_>) -> Result<()> {
    let args: ModuleArgs = commons::parse_args("disp", &inv.args)?;
    inv.session.display(&args.modules, inv.streams)?;
    Ok(())
}
