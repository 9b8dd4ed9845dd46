//! `rbk show` — full details for one record: fields, tasks, audit trail.

use clap::Args;
use serde::Serialize;
use std::io::Write;

use runbook_core::model::{RecordFields, TaskFields};
use runbook_store::repo;

use crate::cmd::{Ctx, open_project};
use crate::output::{fail_with, pretty_kv, pretty_rule, render};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Sequential ID (e.g. sop-007) or storage key.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Serialize)]
struct ShowResult {
    #[serde(flatten)]
    record: RecordFields,
    tasks: Vec<TaskFields>,
}

pub fn run_show(args: &ShowArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let project = open_project(ctx.output)?;
    let record = repo::find_record(&project.conn, &args.id)
        .map_err(|err| fail_with(ctx.output, &err))?;
    let tasks = repo::list_tasks(&project.conn, &record.key)
        .map_err(|err| fail_with(ctx.output, &err))?;

    let result = ShowResult { record, tasks };
    render(ctx.output, &result, |r, w| {
        pretty_kv(w, "id", r.record.id.to_string())?;
        pretty_kv(w, "key", &r.record.key)?;
        pretty_kv(w, "title", &r.record.title)?;
        pretty_kv(w, "status", r.record.status.label())?;
        pretty_kv(w, "owner", &r.record.owner_email)?;

        if !r.tasks.is_empty() {
            pretty_rule(w)?;
            writeln!(w, "steps")?;
            for task in &r.tasks {
                writeln!(
                    w,
                    "  {:>2}. [{}] {}  ({})",
                    task.position,
                    task.status.label(),
                    task.title,
                    task.key
                )?;
            }
        }

        if !r.record.history.is_empty() {
            pretty_rule(w)?;
            writeln!(w, "history")?;
            for entry in &r.record.history {
                let actor = entry.decided_by.as_deref().unwrap_or("unknown");
                let action = entry
                    .action
                    .map_or_else(|| "updated".to_string(), |a| a.to_string());
                writeln!(
                    w,
                    "  {}  {}  {} -> {}  by {}",
                    entry.decided_at.to_rfc3339(),
                    action,
                    entry.previous_status.as_deref().unwrap_or("-"),
                    entry.status,
                    actor
                )?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ShowArgs,
        }
        let w = Wrapper::parse_from(["test", "sop-007"]);
        assert_eq!(w.args.id, "sop-007");
    }
}
