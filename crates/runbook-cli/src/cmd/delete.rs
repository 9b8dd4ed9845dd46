//! `rbk delete` — delete a record. The counter keeps its value; the ID gap
//! is accepted (use `rbk resync` to reclaim trailing values).

use clap::Args;
use serde::Serialize;
use std::io::Write;

use runbook_store::repo;

use crate::cmd::{Ctx, open_project, require_actor};
use crate::output::{fail_with, render};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Sequential ID (e.g. sop-007) or storage key.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Serialize)]
struct DeleteResult {
    ok: bool,
    id: String,
}

pub fn run_delete(args: &DeleteArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let _actor = require_actor(ctx)?;
    let mut project = open_project(ctx.output)?;

    let record = repo::find_record(&project.conn, &args.id)
        .map_err(|err| fail_with(ctx.output, &err))?;
    repo::delete_record(&mut project.conn, &record.key)
        .map_err(|err| fail_with(ctx.output, &err))?;

    let result = DeleteResult {
        ok: true,
        id: record.id.to_string(),
    };
    render(ctx.output, &result, |r, w| writeln!(w, "Deleted {}", r.id))
}
