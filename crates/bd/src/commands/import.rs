//! `bd import` -- apply a text replica (and its deletion manifest) written by
//! `bd export` into the local database.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::DateTime;

use beads_storage::SqliteStore;

use crate::cli::ImportArgs;
use crate::context::RuntimeContext;

/// How long to wait for the replica lock before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
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
    let manifest_path = beads_dir.join("deletions.jsonl");
    let lock_path = beads_dir.join(".sync.lock");

    let since = args
        .since
        .as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| std::time::SystemTime::from(dt.with_timezone(&chrono::Utc)))
                .with_context(|| format!("invalid --since timestamp '{s}', expected RFC3339"))
        })
        .transpose()?;

    let stats = beads_sync::import_store(
        &store,
        &replica_path,
        &manifest_path,
        &lock_path,
        LOCK_TIMEOUT,
        since,
    )
    .context("import failed")?;

    if ctx.json {
        let out = serde_json::json!({
            "created": stats.created,
            "updated": stats.updated,
            "skipped": stats.skipped,
            "purged": stats.purged,
            "purged_ids": stats.purged_ids,
            "warnings": stats.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !ctx.quiet {
        println!(
            "Imported: {} created, {} updated, {} skipped, {} purged",
            stats.created, stats.updated, stats.skipped, stats.purged
        );
        for warning in &stats.warnings {
            eprintln!("warning: {warning}");
        }
    }

    Ok(())
}
