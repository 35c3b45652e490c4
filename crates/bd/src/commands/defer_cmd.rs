//! `bd defer` -- defer an issue until a future date.

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::cli::DeferArgs;
use crate::context::RuntimeContext;

/// Execute the `bd defer` command.
pub fn run(ctx: &RuntimeContext, args: &DeferArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot defer issues in read-only mode");
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

    let until = match &args.until {
        Some(raw) => beads_timeparsing::parse_date_or_relative(raw)
            .with_context(|| format!("could not parse --until value '{raw}'"))?,
        None => Utc::now() + chrono::Duration::days(7),
    };

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
    let until_str = until.to_rfc3339();
    conn.execute(
        "UPDATE issues SET defer_until = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![&until_str, &now, args.id],
    )
    .with_context(|| format!("failed to defer issue {}", args.id))?;

    conn.execute(
        "INSERT INTO events (issue_id, event_type, actor, new_value, created_at) \
         VALUES (?1, 'deferred', ?2, ?3, ?4)",
        rusqlite::params![args.id, &ctx.actor, &until_str, &now],
    )?;

    if !ctx.json {
        println!("Deferred {} until {}", args.id, until_str);
    }

    Ok(())
}
