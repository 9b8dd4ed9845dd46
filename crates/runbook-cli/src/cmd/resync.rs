//! `rbk resync` — administrative counter repair: realign one class's
//! counter cell with the true observed maximum. Admin role required.

use clap::Args;
use serde::Serialize;
use std::io::Write;

use runbook_core::error::ErrorCode;
use runbook_core::model::EntityClass;
use runbook_store::alloc;

use crate::cmd::{Ctx, open_project, require_actor};
use crate::output::{CliError, fail_with, render, render_error};

#[derive(Args, Debug)]
pub struct ResyncArgs {
    /// Entity class whose counter to realign: sop, project, or tpl.
    #[arg(short, long)]
    pub class: String,
}

#[derive(Serialize)]
struct ResyncResult {
    ok: bool,
    class: EntityClass,
    value: u32,
}

pub fn run_resync(args: &ResyncArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let actor = require_actor(ctx)?;
    if !actor.is_admin() {
        let code = ErrorCode::ActorForbidden;
        render_error(
            ctx.output,
            &CliError::with_details(
                "resync is an administrative operation",
                "Re-run with --role admin (or RUNBOOK_ROLE=admin).",
                code.code(),
            ),
        )?;
        anyhow::bail!("resync requires the admin role");
    }

    let class: EntityClass = match args.class.parse() {
        Ok(class) => class,
        Err(err) => {
            render_error(
                ctx.output,
                &CliError::with_details(format!("{err}"), "Use sop, project, or tpl.", "E2005"),
            )?;
            anyhow::bail!("{err}");
        }
    };

    let mut project = open_project(ctx.output)?;
    let value = alloc::resync(
        &mut project.conn,
        class,
        project.config.allocator.retry_budget,
    )
    .map_err(|err| fail_with(ctx.output, &err))?;

    let result = ResyncResult {
        ok: true,
        class,
        value,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "Counter for '{}' resynced to {}", r.class, r.value)
    })
}
