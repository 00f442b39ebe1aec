// src/cli/handlers/help.rs

use anyhow::Result;
use std::io::{self, Write};

use crate::{cli::dispatcher::Invocation, system::format::Formatter};

const USAGE: &[(&str, &str, &str)] = &[
    ("avail", "", "Show all available modules"),
    ("list", "", "Show loaded modules"),
    ("help", "", "Display this message"),
    ("disp", "mod1 <mod2...>", "Display the contents of module(s)"),
    ("load", "mod1 <mod2...>", "Load the specified module(s)"),
    ("unload", "mod1 <mod2...>", "Unload the specified module(s)"),
    ("swap", "mod1 mod2", "Unload mod1 and replace with mod2"),
    ("reload", "mod1 <mod2...>", "Reload with the default version"),
    ("allreload", "", "Reload all loaded modules"),
    ("allunload", "", "Unload all loaded modules"),
];

/// Writes the usage table.
pub fn print_usage(formatter: &Formatter, out: &mut dyn Write) -> io::Result<()> {
    formatter.title(out, "Usage: envmaster <shell> <command> [modules...]")?;
    let mut rows = vec![
        ["Command".to_string(), "Arguments".to_string(), "Help".to_string()],
        ["-------".to_string(), "---------".to_string(), "----".to_string()],
    ];
    rows.extend(
        USAGE
            .iter()
            .map(|(cmd, args, help)| [cmd.to_string(), args.to_string(), help.to_string()]),
    );
    formatter.table(out, &rows)
}

/// Handler for `help`.
pub fn handle(inv: Invocation<'_, '_>) -> Result<()> {
    let formatter = Formatter::from_env(inv.session.environment());
    print_usage(&formatter, inv.streams.diagnostics)?;
    Ok(())
}
