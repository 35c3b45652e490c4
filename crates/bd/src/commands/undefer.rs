//! `bd undefer` -- clear a deferral date from an issue.

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::cli::UndeferArgs;
use crate::context::RuntimeContext;

/// Execute the `bd undefer` command.
pub fn run(ctx: &RuntimeContext, args: &UndeferArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot undefer issues in read-only mode");
    }

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

    let conn = rusqlite::Connection::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM issues WHERE id = ?1)",
            rusqlite::params![args.id],
            |row| row.get(0),
        )
        .unwrap_or(false);
    if !exists {
        bail!("issue {} not found", args.id);
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE issues SET defer_until = NULL, updated_at = ?1 WHERE id = ?2",
        rusqlite::params![&now, args.id],
    )
    .with_context(|| format!("failed to undefer issue {}", args.id))?;

    conn.execute(
        "INSERT INTO events (issue_id, event_type, actor, created_at) \
         VALUES (?1, 'undeferred', ?2, ?3)",
        rusqlite::params![args.id, &ctx.actor, &now],
    )?;

    if !ctx.json {
        println!("Undeferred {}", args.id);
    }

    Ok(())
}
