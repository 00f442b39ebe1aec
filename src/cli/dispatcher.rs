use anyhow::Result;
use thiserror::Error;

use crate::{
    cli::{Cli, handlers},
    core::session::Session,
    system::shell::Streams,
};

/// Errors answered by printing the usage table.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    Usage(String),
}

/// Arguments every handler receives.
#[derive(Debug)]
pub struct Invocation<'s, 'o> {
    /// Dialect name from the command line, resolved lazily by handlers that emit commands.
    pub shell: String,
    /// Everything after the command name.
    pub args: Vec<String>,
    /// The invocation's session.
    pub session: &'s mut Session,
    /// Commands and diagnostics outputs.
    pub streams: &'s mut Streams<'o>,
}

// --- Command Definition and Registry ---

/// Defines a command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Invocation<'_, '_>) -> Result<()>,
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "avail",
        aliases: &["av"],
        handler: handlers::avail::handle,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "help",
        aliases: &[],
        handler: handlers::help::handle,
    },
    CommandDefinition {
        name: "disp",
        aliases: &["display", "show"],
        handler: handlers::display::handle,
    },
    CommandDefinition {
        name: "load",
        aliases: &["add"],
        handler: handlers::load::handle_load,
    },
    CommandDefinition {
        name: "unload",
        aliases: &["rm"],
        handler: handlers::load::handle_unload,
    },
    CommandDefinition {
        name: "swap",
        aliases: &["sw", "switch"],
        handler: handlers::swap::handle,
    },
    CommandDefinition {
        name: "reload",
        aliases: &[],
        handler: handlers::load::handle_reload,
    },
    CommandDefinition {
        name: "allreload",
        aliases: &[],
        handler: handlers::all::handle_reload,
    },
    CommandDefinition {
        name: "allunload",
        aliases: &["purge"],
        handler: handlers::all::handle_unload,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    let name = name.to_ascii_lowercase();
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name.as_str()))
}

/// Routes `envmaster <shell> <command> [args...]` to its handler.
pub fn dispatch(cli: Cli, session: &mut Session, streams: &mut Streams<'_>) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let (Some(shell), Some(command)) = (cli.shell, cli.command) else {
        return Err(DispatchError::Usage("a shell and a command are required".to_string()).into());
    };
    let Some(definition) = find_command(&command) else {
        return Err(DispatchError::Usage(format!("unknown command '{}'", command)).into());
    };

    (definition.handler)(Invocation {
        shell,
        args: cli.args,
        session,
        streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_command_by_name_and_alias() {
        assert_eq!(find_command("load").map(|c| c.name), Some("load"));
        assert_eq!(find_command("purge").map(|c| c.name), Some("allunload"));
        assert_eq!(find_command("SW").map(|c| c.name), Some("swap"));
        assert!(find_command("frobnicate").is_none());
    }

    #[test]
    fn test_every_command_and_alias_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for cmd in COMMAND_REGISTRY {
            assert!(seen.insert(cmd.name), "duplicate '{}'", cmd.name);
            for alias in cmd.aliases {
                assert!(seen.insert(*alias), "duplicate '{}'", alias);
            }
        }
    }
}
