//! `rbk task` — step tracking under a record: add, list, set status.

use clap::{Args, Subcommand};
use std::io::Write;

use runbook_core::model::{NewTask, StepAssignees, StepStatus};
use runbook_store::repo;

use crate::cmd::{Ctx, open_project, require_actor};
use crate::output::{CliError, fail_with, render, render_error};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a step to a record.
    Add(TaskAddArgs),
    /// List a record's steps in order.
    List(TaskListArgs),
    /// Set a step's status (designated actors or admin).
    Set(TaskSetArgs),
}

#[derive(Args, Debug)]
pub struct TaskAddArgs {
    /// Parent record: sequential ID or storage key.
    #[arg(value_name = "RECORD")]
    pub record: String,

    /// Title of the step.
    #[arg(short, long)]
    pub title: String,

    /// Explicit step position; defaults to appending at the end.
    #[arg(long)]
    pub position: Option<u32>,

    /// Designated owner email.
    #[arg(long)]
    pub owner: Option<String>,

    /// Designated reviewer email.
    #[arg(long)]
    pub reviewer: Option<String>,

    /// Designated approver email.
    #[arg(long)]
    pub approver: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskListArgs {
    /// Parent record: sequential ID or storage key.
    #[arg(value_name = "RECORD")]
    pub record: String,
}

#[derive(Args, Debug)]
pub struct TaskSetArgs {
    /// Task storage key (shown by `rbk show` / `rbk task list`).
    #[arg(value_name = "TASK")]
    pub task: String,

    /// Requested status: not-started, in-progress, ready-to-review,
    /// ready-to-approve, approved, or rejected.
    #[arg(long)]
    pub to: String,

    /// Decision comment, recorded in the audit trail.
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

pub fn run_task(command: &TaskCommand, ctx: Ctx<'_>) -> anyhow::Result<()> {
    match command {
        TaskCommand::Add(args) => run_add(args, ctx),
        TaskCommand::List(args) => run_list(args, ctx),
        TaskCommand::Set(args) => run_set(args, ctx),
    }
}

fn run_add(args: &TaskAddArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let _actor = require_actor(ctx)?;
    let mut project = open_project(ctx.output)?;

    let record = repo::find_record(&project.conn, &args.record)
        .map_err(|err| fail_with(ctx.output, &err))?;

    let new = NewTask {
        title: args.title.clone(),
        position: args.position,
        assignees: StepAssignees {
            owner_email: args.owner.clone(),
            reviewer_email: args.reviewer.clone(),
            approver_email: args.approver.clone(),
        },
    };
    let task = repo::add_task(&mut project.conn, &record.key, &new, chrono::Utc::now())
        .map_err(|err| fail_with(ctx.output, &err))?;

    render(ctx.output, &task, |t, w| {
        writeln!(w, "Added step {} to {}: {} ({})", t.position, record.id, t.title, t.key)
    })
}

fn run_list(args: &TaskListArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let project = open_project(ctx.output)?;
    let record = repo::find_record(&project.conn, &args.record)
        .map_err(|err| fail_with(ctx.output, &err))?;
    let tasks = repo::list_tasks(&project.conn, &record.key)
        .map_err(|err| fail_with(ctx.output, &err))?;

    render(ctx.output, &tasks, |ts, w| {
        if ts.is_empty() {
            return writeln!(w, "No steps.");
        }
        for t in ts {
            writeln!(w, "{:>3}  {:<17} {}  ({})", t.position, t.status.as_str(), t.title, t.key)?;
        }
        Ok(())
    })
}

fn run_set(args: &TaskSetArgs, ctx: Ctx<'_>) -> anyhow::Result<()> {
    let actor = require_actor(ctx)?;

    let requested: StepStatus = match args.to.parse() {
        Ok(status) => status,
        Err(err) => {
            render_error(
                ctx.output,
                &CliError::with_details(
                    format!("{err}"),
                    "Use not-started, in-progress, ready-to-review, ready-to-approve, \
                     approved, or rejected.",
                    "E2005",
                ),
            )?;
            anyhow::bail!("{err}");
        }
    };

    let mut project = open_project(ctx.output)?;
    let task = repo::transition_task(
        &mut project.conn,
        &args.task,
        requested,
        &actor,
        args.comment.clone(),
        chrono::Utc::now(),
    )
    .map_err(|err| fail_with(ctx.output, &err))?;

    render(ctx.output, &task, |t, w| {
        writeln!(w, "Step {} is now {}", t.position, t.status.label())
    })
}
