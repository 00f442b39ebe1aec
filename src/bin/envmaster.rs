// src/bin/envmaster.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use envmaster::{
    cli::{
        Cli,
        dispatcher::{self, DispatchError},
        handlers::help,
    },
    core::{environment::Environment, session::Session},
    system::{format::Formatter, shell::Streams},
};
use std::io::{self, Write};

/// Sets up logging, runs the dispatcher and turns any error into a message
/// on stderr and exit code 1. Stdout only ever carries shell commands.
fn main() {
    env_logger::init();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut commands = stdout.lock();
    let mut diagnostics = stderr.lock();

    let result = run_cli(Cli::parse(), &mut commands, &mut diagnostics);
    let _ = commands.flush();

    if let Err(e) = result {
        if let Some(DispatchError::Usage(message)) = e.downcast_ref::<DispatchError>() {
            let _ = writeln!(diagnostics, "{}: {}\n", "Usage error".red().bold(), message);
            let formatter = Formatter::from_env(&Environment::from_process());
            let _ = help::print_usage(&formatter, &mut diagnostics);
        } else {
            let _ = writeln!(diagnostics, "\n{}: {:#}", "Error".red().bold(), e);
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli, commands: &mut dyn Write, diagnostics: &mut dyn Write) -> Result<()> {
    let mut session = Session::from_process()?;
    let mut streams = Streams {
        commands,
        diagnostics,
    };
    dispatcher::dispatch(cli, &mut session, &mut streams)
}
