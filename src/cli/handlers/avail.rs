// src/cli/handlers/avail.rs

use anyhow::{Context, Result};

use crate::{
    cli::{
        dispatcher::Invocation,
        handlers::commons::{self, NoArgs},
    },
    system::format::Formatter,
};

/// Handler for `avail`: one titled column listing per search root.
pub fn handle(inv: Invocation<'_, '_>) -> Result<()> {
    let _: NoArgs = commons::parse_args("avail", &inv.args)?;
    let formatter = Formatter::from_env(inv.session.environment());
    let roots = inv.session.available()?;

    let out = &mut *inv.streams.diagnostics;
    for root in roots {
        let title = dunce::simplified(&root.root).display().to_string();
        formatter
            .title(out, &title)
            .and_then(|()| formatter.columns(out, &root.modules))
            .context("Failed to write module listing")?;
    }
    Ok(())
}
