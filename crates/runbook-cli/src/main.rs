#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use actor::ActorFlags;
use cmd::Ctx;
use output::resolve_output_mode;
use runbook_core::model::DocStatus;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "runbook: SOP/compliance tracker with sequential IDs and approval workflow",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Override actor display name (skips env resolution).
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Override actor email (default: RUNBOOK_EMAIL or <actor>@local).
    #[arg(long, global = true)]
    email: Option<String>,

    /// Override actor role: admin, reviewer, or member.
    #[arg(long, global = true)]
    role: Option<String>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn actor_flags(&self) -> ActorFlags<'_> {
        ActorFlags {
            name: self.actor.as_deref(),
            email: self.email.as_deref(),
            role: self.role.as_deref(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a runbook project",
        long_about = "Initialize a runbook project (config + store) in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    rbk init\n\n    # Emit machine-readable output\n    rbk init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a record with a fresh sequential ID",
        long_about = "Create an SOP, project, or template; the allocator assigns the next \
                      sequential ID for its class.",
        after_help = "EXAMPLES:\n    # Create an SOP\n    rbk create --title \"Backup restore drill\"\n\n    # Create a template\n    rbk create --title \"Audit checklist\" --class tpl\n\n    # Emit machine-readable output\n    rbk create --title \"Backup restore drill\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Read",
        about = "List records",
        long_about = "List records with optional class and status filters.",
        after_help = "EXAMPLES:\n    # All records\n    rbk list\n\n    # In-review SOPs only\n    rbk list --class sop --status in-review"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one record",
        long_about = "Show full details for one record: fields, steps, and the audit trail.",
        after_help = "EXAMPLES:\n    # Show by sequential ID\n    rbk show sop-007\n\n    # Emit machine-readable output\n    rbk show sop-007 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Review",
        about = "Submit a draft for review",
        long_about = "Move a draft record to in-review (document owner or admin).",
        after_help = "EXAMPLES:\n    # Submit\n    rbk submit sop-007\n\n    # With a note for the reviewer\n    rbk submit sop-007 -m \"second pass after audit findings\""
    )]
    Submit(cmd::lifecycle::TransitionArgs),

    #[command(
        next_help_heading = "Review",
        about = "Approve an in-review record",
        long_about = "Approve a record that is in review (reviewer or admin role).",
        after_help = "EXAMPLES:\n    # Approve\n    rbk approve sop-007 --role reviewer"
    )]
    Approve(cmd::lifecycle::TransitionArgs),

    #[command(
        next_help_heading = "Review",
        about = "Reject an in-review record back to draft",
        long_about = "Return a record in review to draft (reviewer or admin role).",
        after_help = "EXAMPLES:\n    # Reject with a reason\n    rbk reject sop-007 -m \"missing rollback steps\" --role reviewer"
    )]
    Reject(cmd::lifecycle::TransitionArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Delete a record",
        long_about = "Delete a record and its steps. The sequential counter is untouched; \
                      the ID gap is accepted.",
        after_help = "EXAMPLES:\n    # Delete\n    rbk delete sop-007"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Steps",
        about = "Manage a record's steps",
        long_about = "Add steps, list them, or set a step's status."
    )]
    Task {
        #[command(subcommand)]
        command: cmd::task::TaskCommand,
    },

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Realign a counter with the true maximum",
        long_about = "Recompute the highest issued suffix for a class and overwrite the \
                      counter cell with it. Administrative repair after manual deletions.",
        after_help = "EXAMPLES:\n    # Repair the SOP counter\n    rbk resync --class sop --role admin"
    )]
    Resync(cmd::resync::ResyncArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RUNBOOK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "runbook=debug,info"
        } else {
            "runbook=info,warn"
        })
    });

    let format = env::var("RUNBOOK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = resolve_output_mode(cli.json, cli.quiet);
    let ctx = Ctx {
        output,
        actor_flags: cli.actor_flags(),
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output),
        Commands::Create(args) => cmd::create::run_create(args, ctx),
        Commands::List(args) => cmd::list::run_list(args, ctx),
        Commands::Show(args) => cmd::show::run_show(args, ctx),
        Commands::Submit(args) => {
            cmd::lifecycle::run_transition(args, DocStatus::InReview, ctx)
        }
        Commands::Approve(args) => {
            cmd::lifecycle::run_transition(args, DocStatus::Approved, ctx)
        }
        Commands::Reject(args) => cmd::lifecycle::run_transition(args, DocStatus::Draft, ctx),
        Commands::Delete(args) => cmd::delete::run_delete(args, ctx),
        Commands::Task { command } => cmd::task::run_task(command, ctx),
        Commands::Resync(args) => cmd::resync::run_resync(args, ctx),
    }
}
