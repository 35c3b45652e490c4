//! `bd reopen` -- reopen a closed issue.

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::cli::ReopenArgs;
use crate::context::RuntimeContext;

/// Execute the `bd reopen` command.
pub fn run(ctx: &RuntimeContext, args: &ReopenArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot reopen issues in read-only mode");
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

    let current_status: Option<String> = conn
        .query_row(
            "SELECT status FROM issues WHERE id = ?1",
            rusqlite::params![args.id],
            |row| row.get(0),
        )
        .ok();

    let Some(current_status) = current_status else {
        bail!("issue {} not found", args.id);
    };
    if current_status != "closed" {
        bail!("issue {} is not closed (status: {})", args.id, current_status);
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE issues SET status = 'open', closed_at = NULL, close_reason = '', updated_at = ?1 \
         WHERE id = ?2",
        rusqlite::params![&now, args.id],
    )
    .with_context(|| format!("failed to reopen issue {}", args.id))?;

    conn.execute(
        "INSERT INTO events (issue_id, event_type, actor, old_value, new_value, created_at) \
         VALUES (?1, 'reopened', ?2, 'closed', 'open', ?3)",
        rusqlite::params![args.id, &ctx.actor, &now],
    )?;

    if !ctx.json {
        println!("Reopened {}", args.id);
    }

    Ok(())
}
