// src/cli/handlers/swap.rs

use anyhow::Result;
use clap::Parser;

use crate::cli::{dispatcher::Invocation, handlers::commons};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Unload a module and replace it with another.")]
struct SwapArgs {
    /// Module to unload.
    old: String,
    /// Module to load in its place.
    new: String,
}

/// Handler for `swap`.
pub fn handle(inv: Invocation<'_, '_>) -> Result<()> {
    let args: SwapArgs = commons::parse_args("swap", &inv.args)?;
    let mut shell = commons::backend(&inv.shell)?;
    inv.session
        .swap(shell.as_mut(), &args.old, &args.new, inv.streams)?;
    Ok(())
}
