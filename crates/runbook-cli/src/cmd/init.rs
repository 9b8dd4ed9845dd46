//! `rbk init` — initialize a runbook project in the current directory.

use clap::Args;
use serde::Serialize;
use std::io::Write;

use runbook_core::config;
use runbook_store::open_store;

use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Reinitialize even if a project already exists here.
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct InitResult {
    ok: bool,
    root: String,
    config: String,
    store: String,
    already_initialized: bool,
}

pub fn run_init(args: &InitArgs, output: OutputMode) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let config_file = config::config_path(&root);
    let already_initialized = config_file.exists();

    if !already_initialized || args.force {
        config::write_default(&root)?;
    }
    // Opening creates the store file and applies migrations.
    let store = config::store_path(&root);
    drop(open_store(&store)?);

    let result = InitResult {
        ok: true,
        root: root.display().to_string(),
        config: config_file.display().to_string(),
        store: store.display().to_string(),
        already_initialized,
    };

    render(output, &result, |r, w| {
        if r.already_initialized {
            writeln!(w, "Project already initialized at {}", r.root)
        } else {
            writeln!(w, "Initialized runbook project at {}", r.root)
        }
    })
}
