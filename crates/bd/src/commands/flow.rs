//! `bd flow` -- deterministic workflow gates (claim, close, block, land,
//! resume, intake) that print a machine-readable envelope and exit with
//! the envelope's exit class.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};

use beads_core::filter::WorkFilter;
use beads_core::issue::{Issue, IssueBuilder};
use beads_core::{idgen, enums::IssueType};
use beads_flow::gates::{
    block_with_context, claim_next, close_safe, create_discovered, intake_audit,
    intake_map_sync, land, resume, BlockArgs, CloseSafeArgs, CreateDiscoveredArgs, LandArgs,
    MapSyncArgs,
};
use beads_flow::{Envelope, ProcessRunner};
use beads_storage::{SqliteStore, Storage};

use crate::cli::{
    FlowArgs, FlowBlockArgs, FlowClaimNextArgs, FlowCloseSafeArgs, FlowCommands,
    FlowCreateDiscoveredArgs, FlowIntakeAuditArgs, FlowIntakeMapSyncArgs, FlowLandArgs,
    FlowResumeArgs,
};
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, args: &FlowArgs) -> Result<()> {
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

    let envelope = match &args.command {
        FlowCommands::ClaimNext(a) => run_claim_next(&store, a)?,
        FlowCommands::CloseSafe(a) => run_close_safe(ctx, &store, &beads_dir, a)?,
        FlowCommands::BlockWithContext(a) => run_block(&store, a)?,
        FlowCommands::CreateDiscovered(a) => run_create_discovered(&store, a)?,
        FlowCommands::Land(a) => run_land(&store, a)?,
        FlowCommands::Resume(a) => run_resume(&store, a)?,
        FlowCommands::IntakeAudit(a) => run_intake_audit(&store, a)?,
        FlowCommands::IntakeMapSync(a) => run_intake_map_sync(&store, a)?,
    };

    print_envelope(&envelope);
    std::process::exit(envelope.exit_code());
}

fn print_envelope(envelope: &Envelope) {
    match serde_json::to_string_pretty(envelope) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize envelope: {e}"),
    }
}

fn run_claim_next(store: &SqliteStore, args: &FlowClaimNextArgs) -> Result<Envelope> {
    let filter = WorkFilter {
        issue_type: args.issue_type.clone(),
        priority: args.priority,
        labels: args.label.clone(),
        ..Default::default()
    };
    Ok(claim_next(store, &args.actor, filter)?)
}

fn run_close_safe(
    ctx: &RuntimeContext,
    store: &SqliteStore,
    beads_dir: &std::path::Path,
    args: &FlowCloseSafeArgs,
) -> Result<Envelope> {
    let router = beads_query::Router::load(beads_dir.parent().unwrap_or(beads_dir))
        .context("failed to load route table")?;
    let session = &ctx.actor;
    Ok(close_safe(
        store,
        &router,
        CloseSafeArgs {
            id_like: &args.id,
            reason: &args.reason,
            verification: &args.verification,
            allow_failure_reason: args.allow_failure_reason,
            actor: &args.actor,
            session,
        },
    )?)
}

fn run_block(store: &SqliteStore, args: &FlowBlockArgs) -> Result<Envelope> {
    Ok(block_with_context(
        store,
        BlockArgs {
            id: &args.id,
            context_pack: &args.reason,
            blocker_id: args.blocker.as_deref(),
            actor: &args.actor,
        },
    )?)
}

fn run_create_discovered(store: &SqliteStore, args: &FlowCreateDiscoveredArgs) -> Result<Envelope> {
    let stats = store.get_statistics()?;
    let hash_length = idgen::compute_adaptive_length(
        stats.total_issues as usize,
        idgen::adaptive_defaults::MIN_LENGTH,
        idgen::adaptive_defaults::MAX_LENGTH,
        idgen::adaptive_defaults::MAX_COLLISION_PROB,
    );
    let now = chrono::Utc::now();
    let mut id = String::new();
    for nonce in 0..10 {
        let candidate = idgen::generate_hash_id(
            "bd",
            &args.title,
            "",
            &args.actor,
            now,
            hash_length,
            nonce,
        );
        if store.get_issue(&candidate).is_err() {
            id = candidate;
            break;
        }
    }
    if id.is_empty() {
        bail!("failed to generate unique ID after 10 attempts");
    }

    let issue: Issue = IssueBuilder::new(args.title.clone())
        .id(id)
        .issue_type(IssueType::from(args.issue_type.as_str()).normalize())
        .created_by(args.actor.clone())
        .build();

    Ok(create_discovered(
        store,
        CreateDiscoveredArgs {
            issue,
            source_id: &args.origin,
            labels: &[],
            actor: &args.actor,
        },
    )?)
}

fn run_land(store: &SqliteStore, args: &FlowLandArgs) -> Result<Envelope> {
    let repo_root = std::env::current_dir().context("failed to resolve current directory")?;
    let diagnostics: Vec<String> = Vec::new();
    let critical: HashSet<String> = HashSet::new();
    Ok(land(
        store,
        &ProcessRunner,
        LandArgs {
            actor: &args.actor,
            epic_id: args.epic.as_deref(),
            repo_root: &repo_root,
            diagnostics: &diagnostics,
            critical_diagnostics: &critical,
            quality_evidence: args.quality_evidence.as_deref(),
            next_prompt: None,
            stash: None,
            check_only: args.check_only,
            do_sync_merge: args.sync_merge,
            do_sync: args.sync,
            do_push: args.push,
        },
    )?)
}

fn run_resume(store: &SqliteStore, args: &FlowResumeArgs) -> Result<Envelope> {
    let freshness = beads_flow::gates::FreshnessCounters {
        sessions_closed: args.sessions_closed,
        file_rereads: args.file_rereads,
        state_transition: args.state_transition,
    };
    Ok(resume(store, &args.actor, freshness)?)
}

fn run_intake_audit(store: &SqliteStore, args: &FlowIntakeAuditArgs) -> Result<Envelope> {
    Ok(intake_audit(store, &args.epic_id, &args.actor)?)
}

fn run_intake_map_sync(store: &SqliteStore, args: &FlowIntakeMapSyncArgs) -> Result<Envelope> {
    Ok(intake_map_sync(
        store,
        MapSyncArgs {
            epic_id: &args.epic_id,
            plan: args.plan.iter().map(|e| (e.index, e.id.clone())).collect(),
            ready_wave: args.ready_wave.clone(),
            findings: args.findings.iter().map(|e| (e.index, e.id.clone())).collect(),
            has_findings: args.has_findings,
            actor: &args.actor,
        },
    )?)
}
