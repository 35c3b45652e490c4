//! `bd sync` -- export the local database to the text replica, then import
//! it back, so the replica and any deletion manifest are reconciled in one
//! step. Equivalent to `bd export` followed by `bd import`.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use beads_storage::SqliteStore;

use crate::context::RuntimeContext;

/// How long to wait for the replica lock before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(ctx: &RuntimeContext) -> Result<()> {
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

    let replica_path = beads_dir.join("issues.jsonl");
    let manifest_path = beads_dir.join("deletions.jsonl");
    let lock_path = beads_dir.join(".sync.lock");

    let export_stats =
        beads_sync::export_store(&store, &replica_path, &lock_path, LOCK_TIMEOUT, true)
            .context("export failed")?;
    let import_stats = beads_sync::import_store(
        &store,
        &replica_path,
        &manifest_path,
        &lock_path,
        LOCK_TIMEOUT,
        None,
    )
    .context("import failed")?;

    if ctx.json {
        let out = serde_json::json!({
            "exported": export_stats.written,
            "created": import_stats.created,
            "updated": import_stats.updated,
            "skipped": import_stats.skipped,
            "purged": import_stats.purged,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !ctx.quiet {
        println!(
            "Synced: exported {}, imported ({} created, {} updated, {} skipped, {} purged)",
            export_stats.written,
            import_stats.created,
            import_stats.updated,
            import_stats.skipped,
            import_stats.purged
        );
    }

    Ok(())
}
