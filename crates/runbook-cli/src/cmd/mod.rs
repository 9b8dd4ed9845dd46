//! Command handlers plus the small shared harness they run on.

pub mod create;
pub mod delete;
pub mod init;
pub mod lifecycle;
pub mod list;
pub mod resync;
pub mod show;
pub mod task;

use anyhow::bail;
use rusqlite::Connection;
use tracing::debug;

use runbook_core::config::{self, ProjectConfig};
use runbook_core::error::ErrorCode;
use runbook_core::model::Actor;
use runbook_store::open_store;

use crate::actor::{self, ActorFlags};
use crate::output::{CliError, OutputMode, render_error};

/// Per-invocation context threaded into every command handler.
#[derive(Debug, Clone, Copy)]
pub struct Ctx<'a> {
    pub output: OutputMode,
    pub actor_flags: ActorFlags<'a>,
}

/// An opened project: parsed config plus a store connection.
pub struct Project {
    pub config: ProjectConfig,
    pub conn: Connection,
}

/// Locate and open the enclosing project, rendering a structured error
/// when the current directory is not initialized.
pub fn open_project(output: OutputMode) -> anyhow::Result<Project> {
    let cwd = std::env::current_dir()?;
    let Some(root) = config::find_project_root(&cwd) else {
        let code = ErrorCode::NotInitialized;
        render_error(
            output,
            &CliError::with_details(
                code.message(),
                code.hint().unwrap_or_default(),
                code.code(),
            ),
        )?;
        bail!("{}", code.message());
    };

    let config = config::load(&root)?;
    let conn = open_store(&config::store_path(&root))?;
    debug!(root = %root.display(), "opened project");
    Ok(Project { config, conn })
}

/// Resolve the acting identity, rendering a structured error when none is
/// available.
pub fn require_actor(ctx: Ctx<'_>) -> anyhow::Result<Actor> {
    match actor::require_actor(ctx.actor_flags) {
        Ok(actor) => Ok(actor),
        Err(err) => {
            render_error(
                ctx.output,
                &CliError::with_details(
                    &err.message,
                    "Set --actor, RUNBOOK_ACTOR, or ACTOR.",
                    err.code,
                ),
            )?;
            bail!("{}", err.message);
        }
    }
}
