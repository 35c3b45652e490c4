//! `bd export` -- write the text replica (issues, dependencies, labels) out
//! to a JSONL file so other clones can pick it up via `bd import`.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use beads_storage::SqliteStore;

use crate::cli::ExportArgs;
use crate::context::RuntimeContext;

/// How long to wait for the replica lock before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(ctx: &RuntimeContext, args: &ExportArgs) -> Result<()> {
    let beads_dir = ctx
        .resolve_db_path()
        .context("no beads database found. Run 'bd init' to create one.")?;
    let db_path = beads_dir.join("beads.db");
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }
    let store = SqliteStore::open(&db_path).context("failed to open database")?;

    let replica_path = match &args.replica {
        Some(p) => std::path::PathBuf::from(p),
        None => beads_dir.join("issues.jsonl"),
    };
    let lock_path = beads_dir.join(".sync.lock");

    let stats = beads_sync::export_store(&store, &replica_path, &lock_path, LOCK_TIMEOUT, true)
        .context("export failed")?;

    if ctx.json {
        let out = serde_json::json!({
            "replica": replica_path,
            "written": stats.written,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !ctx.quiet {
        println!(
            "Exported {} issue(s) to {}",
            stats.written,
            replica_path.display()
        );
    }

    Ok(())
}
