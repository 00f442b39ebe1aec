// src/cli/handlers/list.rs

use anyhow::Result;
use colored::Colorize;

use crate::{
    cli::{
        dispatcher::Invocation,
        handlers::commons::{self, NoArgs},
    },
    system::format::Formatter,
};

/// Handler for `list`: the loaded modules, numbered in load order.
pub fn handle(inv: Invocation<'_, '_>) -> Result<()> {
    let _: NoArgs = commons::parse_args("list", &inv.args)?;
    let formatter = Formatter::from_env(inv.session.environment());
    let loaded = inv.session.loaded();

    let out = &mut *inv.streams.diagnostics;
    formatter.title(out, "Currently Loaded EnvMaster files")?;
    if loaded.is_empty() {
        writeln!(out, "{}", "No modules currently loaded".dimmed())?;
        return Ok(());
    }

    let numbered: Vec<String> = loaded
        .oldest_first()
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}) {}", i + 1, name))
        .collect();
    formatter.columns(out, &numbered)?;
    Ok(())
}
