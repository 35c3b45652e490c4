//! `bd daemon` / `bd await` / `bd watch` -- RPC daemon lifecycle and the
//! Await/Watch client helpers built on top of it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use beads_daemon::matcher::Matcher;
use beads_daemon::{AwaitClient, DaemonOptions};
use beads_storage::SqliteStore;

use crate::cli::{AwaitArgs, DaemonArgs, DaemonCommands, DaemonRunArgs, WatchArgs};
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, args: &DaemonArgs) -> Result<()> {
    match &args.command {
        DaemonCommands::Run(run_args) => run_daemon(ctx, run_args),
        DaemonCommands::Status => print_status(ctx),
    }
}

fn run_daemon(ctx: &RuntimeContext, args: &DaemonRunArgs) -> Result<()> {
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

    let store = Arc::new(SqliteStore::open(&db_path).context("failed to open database")?);
    let router = beads_query::Router::load(beads_dir.parent().unwrap_or(&beads_dir))
        .context("failed to load route table")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async move {
        let options = DaemonOptions {
            store,
            router,
            beads_dir: beads_dir.clone(),
            host: args.host.clone(),
            port: args.port,
            readonly: ctx.readonly,
        };
        let (router, listener, addr, token) = beads_daemon::build(options)
            .await
            .context("failed to bind daemon listener")?;

        println!("daemon listening on http://{addr}");
        println!("SSE token written to {}", beads_dir.join("daemon.token").display());
        let _ = token;

        axum::serve(listener, router)
            .await
            .context("daemon server exited")
    })
}

fn print_status(ctx: &RuntimeContext) -> Result<()> {
    let beads_dir = ctx
        .resolve_db_path()
        .context("no beads database found. Run 'bd init' to create one.")?;
    let token_path = beads_dir.join("daemon.token");
    if token_path.exists() {
        println!("daemon token present at {}", token_path.display());
    } else {
        println!("no daemon token found; daemon is not running (or was started elsewhere)");
    }
    Ok(())
}

pub fn run_await(_ctx: &RuntimeContext, args: &AwaitArgs) -> Result<()> {
    let base_url = args
        .daemon_url
        .clone()
        .unwrap_or_else(|| "http://127.0.0.1:0".to_string());
    let token = std::env::var("BD_DAEMON_TOKEN").unwrap_or_default();
    let client = AwaitClient::new(base_url, token);
    let matcher = Matcher::parse(&args.matcher);
    let result = client.await_event(&matcher, Duration::from_secs(args.timeout));

    if let Some(event) = &result.event {
        println!("{}", serde_json::to_string_pretty(event)?);
        return Ok(());
    }
    if result.timed_out {
        eprintln!("timed out waiting for a matching event");
        std::process::exit(1);
    }
    eprintln!("canceled");
    std::process::exit(2);
}

pub fn run_watch(_ctx: &RuntimeContext, args: &WatchArgs) -> Result<()> {
    let base_url = args
        .daemon_url
        .clone()
        .unwrap_or_else(|| "http://127.0.0.1:0".to_string());
    let token = std::env::var("BD_DAEMON_TOKEN").unwrap_or_default();
    let client = AwaitClient::new(base_url, token);
    let result = client.await_decision(&args.id, Duration::from_secs(args.timeout));

    if let Some(decision) = &result.decision {
        println!("{}", serde_json::to_string_pretty(decision)?);
        return Ok(());
    }
    if result.timed_out {
        eprintln!("timed out waiting for a decision response");
        std::process::exit(1);
    }
    eprintln!("canceled");
    std::process::exit(2);
}
