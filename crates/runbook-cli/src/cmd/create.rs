//! `rbk create` — create a counted record and print its sequential ID.

use clap::Args;
use std::io::Write;

use runbook_core::model::{EntityClass, NewRecord};
use runbook_store::repo;

use crate::cmd::{Ctx, open_project, require_actor};
use crate::output::{CliError, fail_with, render, render_error};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new record.
    #[arg(short, long)]
    pub title: String,

    /// Entity class: sop, project, or tpl.
    #[arg(short, long, default_value = "sop")]
    pub class: String,

    /// Owner email; defaults to the acting identity's email.
    #[arg(long)]
    pub owner: Option<String>,

    /// Entity-specific payload as a JSON object.
    #[arg(long)]
    pub payload: Option<String>,
}

pub fn run_create(args: &CreateArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let actor = require_actor(ctx)?;

    let class: EntityClass = match args.class.parse() {
        Ok(class) => class,
        Err(err) => {
            render_error(ctx.output, &CliError::with_details(format!("{err}"), "Use sop, project, or tpl.", "E2005"))?;
            anyhow::bail!("{err}");
        }
    };

    let payload = match args.payload.as_deref() {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                render_error(
                    ctx.output,
                    &CliError::with_details(
                        format!("invalid --payload JSON: {err}"),
                        "Pass a JSON object, e.g. --payload '{\"steps\": []}'.",
                        "E2005",
                    ),
                )?;
                anyhow::bail!("invalid payload");
            }
        },
        None => serde_json::json!({}),
    };

    let mut project = open_project(ctx.output)?;
    let new = NewRecord {
        class,
        title: args.title.clone(),
        owner_email: args.owner.clone().unwrap_or_else(|| actor.email.clone()),
        payload,
    };

    let record = repo::create_record(
        &mut project.conn,
        &new,
        chrono::Utc::now(),
        project.config.allocator.retry_budget,
    )
    .map_err(|err| fail_with(ctx.output, &err))?;

    render(ctx.output, &record, |r, w| {
        writeln!(w, "Created {}: {}", r.id, r.title)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_args_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: CreateArgs,
        }
        let w = Wrapper::parse_from(["test", "--title", "Backup drill"]);
        assert_eq!(w.args.title, "Backup drill");
        assert_eq!(w.args.class, "sop");
        assert!(w.args.owner.is_none());
        assert!(w.args.payload.is_none());
    }
}
