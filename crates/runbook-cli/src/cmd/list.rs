//! `rbk list` — list records with optional class/status filters.

use clap::Args;
use std::io::Write;

use runbook_core::model::{DocStatus, EntityClass};
use runbook_store::repo;

use crate::cmd::{Ctx, open_project};
use crate::output::{CliError, fail_with, render, render_error};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by entity class: sop, project, or tpl.
    #[arg(short, long)]
    pub class: Option<String>,

    /// Filter by status: draft, in-review, approved, or archived.
    #[arg(short, long)]
    pub status: Option<String>,
}

pub fn run_list(args: &ListArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let class = match args.class.as_deref() {
        Some(raw) => match raw.parse::<EntityClass>() {
            Ok(class) => Some(class),
            Err(err) => {
                render_error(
                    ctx.output,
                    &CliError::with_details(format!("{err}"), "Use sop, project, or tpl.", "E2005"),
                )?;
                anyhow::bail!("{err}");
            }
        },
        None => None,
    };
    let status = match args.status.as_deref() {
        Some(raw) => match raw.parse::<DocStatus>() {
            Ok(status) => Some(status),
            Err(err) => {
                render_error(
                    ctx.output,
                    &CliError::with_details(
                        format!("{err}"),
                        "Use draft, in-review, approved, or archived.",
                        "E2005",
                    ),
                )?;
                anyhow::bail!("{err}");
            }
        },
        None => None,
    };

    let project = open_project(ctx.output)?;
    let records = repo::list_records(&project.conn, class, status)
        .map_err(|err| fail_with(ctx.output, &err))?;

    render(ctx.output, &records, |rs, w| {
        if rs.is_empty() {
            return writeln!(w, "No records.");
        }
        for r in rs {
            writeln!(w, "{:<14} {:<11} {}", r.id.to_string(), r.status.as_str(), r.title)?;
        }
        Ok(())
    })
}
