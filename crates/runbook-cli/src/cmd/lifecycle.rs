//! `rbk submit` / `rbk approve` / `rbk reject` — the document review
//! lifecycle verbs. All three share one handler: they differ only in the
//! requested status.

use clap::Args;
use std::io::Write;

use runbook_core::model::DocStatus;
use runbook_store::repo;

use crate::cmd::{Ctx, open_project, require_actor};
use crate::output::{fail_with, render};

#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Sequential ID (e.g. sop-007) or storage key.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Decision comment, recorded in the audit trail.
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// The verb decides the requested status; the store applies the rules.
pub fn run_transition(
    args: &TransitionArgs,
    requested: DocStatus,
    ctx: Ctx<'_>,
) -> anyhow::Result<()> {
    let actor = require_actor(ctx)?;
    let mut project = open_project(ctx.output)?;

    let record = repo::transition_record(
        &mut project.conn,
        &args.id,
        requested,
        &actor,
        args.comment.clone(),
        chrono::Utc::now(),
        project.config.workflow.require_reject_comment,
    )
    .map_err(|err| fail_with(ctx.output, &err))?;

    render(ctx.output, &record, |r, w| {
        writeln!(w, "{} is now {}", r.id, r.status.label())
    })
}
