//! `land`: the deterministic, ordered gate pipeline run at the end of a
//! session before handing control back (or pushing).

use std::collections::HashSet;
use std::path::Path;

use beads_core::filter::IssueFilter;
use beads_storage::Storage;
use serde::Serialize;
use serde_json::json;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::runner::Runner;

pub struct LandArgs<'a> {
    pub actor: &'a str,
    pub epic_id: Option<&'a str>,
    pub repo_root: &'a Path,
    /// Diagnostic names observed this session (e.g. lint/build warnings).
    pub diagnostics: &'a [String],
    /// Diagnostic names configured as blockers if present.
    pub critical_diagnostics: &'a HashSet<String>,
    pub quality_evidence: Option<&'a str>,
    pub next_prompt: Option<&'a str>,
    pub stash: Option<&'a str>,
    pub check_only: bool,
    pub do_sync_merge: bool,
    pub do_sync: bool,
    pub do_push: bool,
}

#[derive(Debug, Clone, Serialize)]
struct StepResult {
    step: &'static str,
    status: &'static str, // "pass" | "skip" | "fail"
    #[serde(skip_serializing_if = "String::is_empty")]
    output: String,
}

pub fn land(store: &dyn Storage, runner: &dyn Runner, args: LandArgs) -> Result<Envelope> {
    // 1. WIP gate.
    let wip = store.search_issues(
        "",
        &IssueFilter {
            assignee: Some(args.actor.to_string()),
            ..Default::default()
        },
    )?;
    let active: Vec<&str> = wip
        .iter()
        .filter(|i| i.status.is_active_wip())
        .map(|i| i.id.as_str())
        .collect();
    if !active.is_empty() {
        return Ok(violation("wip_gate", json!({"blocking_ids": active})));
    }

    // 2. Open-children gate.
    if let Some(epic_id) = args.epic_id {
        let children = store.search_issues(
            "",
            &IssueFilter {
                parent_id: Some(epic_id.to_string()),
                ..Default::default()
            },
        )?;
        let open: Vec<&str> = children
            .iter()
            .filter(|c| !c.status.is_closed_terminal())
            .map(|c| c.id.as_str())
            .collect();
        if !open.is_empty() {
            return Ok(violation("open_children_gate", json!({"open_children": open})));
        }
    }

    // 3. Working-tree clean gate.
    let status_out = runner.run("git", &["status", "--porcelain"], args.repo_root);
    if !status_out.success {
        return Ok(Envelope::system_error("land", "system_error")
            .with_details(json!({"step": "working_tree_clean", "output": status_out.combined_output})));
    }
    if !status_out.combined_output.trim().is_empty() {
        return Ok(violation(
            "working_tree_clean_gate",
            json!({"dirty_paths": status_out.combined_output}),
        ));
    }

    // 4. Critical warning gate.
    let hit: Vec<&String> = args
        .diagnostics
        .iter()
        .filter(|d| args.critical_diagnostics.contains(d.as_str()))
        .collect();
    if !hit.is_empty() {
        return Ok(violation("critical_warning_gate", json!({"critical": hit})));
    }

    // 5. Optional quality-evidence gate.
    let quality_step = match args.quality_evidence {
        Some(evidence) if !evidence.trim().is_empty() => {
            StepResult { step: "quality_evidence", status: "pass", output: evidence.to_string() }
        }
        _ => StepResult { step: "quality_evidence", status: "skip", output: String::new() },
    };

    // 6. Ready-snapshot record.
    let ready = store.get_ready_work(&Default::default())?;
    let snapshot = json!({"ready_ids": ready.iter().map(|i| &i.id).collect::<Vec<_>>()});
    store.save_resource("land", &format!("ready-snapshot-{}", args.actor), &snapshot.to_string())?;

    // 7. Optional handoff gate.
    let handoff_step = if args.next_prompt.is_some() || args.stash.is_some() {
        StepResult {
            step: "handoff",
            status: "pass",
            output: json!({"next_prompt": args.next_prompt, "stash": args.stash}).to_string(),
        }
    } else {
        StepResult { step: "handoff", status: "skip", output: String::new() }
    };

    if args.check_only {
        return Ok(Envelope::success("land", "check_passed").with_details(json!({
            "quality_evidence": quality_step,
            "handoff": handoff_step,
        })));
    }

    // 8. Gate-3 choreography.
    let choreography = run_choreography(runner, args.repo_root, &args);

    let all_passed = choreography.iter().all(|s| s.status != "fail");
    let details = json!({
        "quality_evidence": quality_step,
        "handoff": handoff_step,
        "choreography": choreography,
    });

    if all_passed {
        Ok(Envelope::success("land", "landed").with_details(details))
    } else {
        Ok(Envelope::policy_violation("land", "policy_violation").with_details(details))
    }
}

fn run_choreography(runner: &dyn Runner, cwd: &Path, args: &LandArgs) -> Vec<StepResult> {
    let mut steps = Vec::new();

    let pull = runner.run("git", &["pull", "--rebase"], cwd);
    steps.push(StepResult {
        step: "pull_rebase",
        status: if pull.success { "pass" } else { "fail" },
        output: pull.combined_output.clone(),
    });
    if !pull.success {
        return steps;
    }

    let sync_status = runner.run("git", &["status", "--porcelain", "-b"], cwd);
    steps.push(StepResult {
        step: "sync_status",
        status: if sync_status.success { "pass" } else { "fail" },
        output: sync_status.combined_output.clone(),
    });
    if !sync_status.success {
        return steps;
    }

    if args.do_sync_merge {
        let merge = runner.run("git", &["merge", "--no-edit", "@{u}"], cwd);
        steps.push(StepResult {
            step: "sync_merge",
            status: if merge.success { "pass" } else { "fail" },
            output: merge.combined_output,
        });
    } else {
        steps.push(StepResult { step: "sync_merge", status: "skip", output: String::new() });
    }
    if steps.last().map(|s| s.status) == Some("fail") {
        return steps;
    }

    if args.do_sync {
        let sync = runner.run("bd", &["sync"], cwd);
        steps.push(StepResult {
            step: "sync",
            status: if sync.success { "pass" } else { "fail" },
            output: sync.combined_output,
        });
    } else {
        steps.push(StepResult { step: "sync", status: "skip", output: String::new() });
    }
    if steps.last().map(|s| s.status) == Some("fail") {
        return steps;
    }

    if args.do_push {
        let push = runner.run("git", &["push"], cwd);
        steps.push(StepResult {
            step: "push",
            status: if push.success { "pass" } else { "fail" },
            output: push.combined_output,
        });
    } else {
        steps.push(StepResult { step: "push", status: "skip", output: String::new() });
    }

    steps
}

fn violation(step: &str, details: serde_json::Value) -> Envelope {
    Envelope::policy_violation("land", "policy_violation")
        .with_details(json!({"failed_step": step, "details": details}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::test_support::{fail, ok, ScriptedRunner};
    use beads_core::issue::IssueBuilder;
    use beads_storage::SqliteStore;
    use std::path::PathBuf;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn base_args<'a>(
        repo_root: &'a Path,
        diagnostics: &'a [String],
        critical: &'a HashSet<String>,
    ) -> LandArgs<'a> {
        LandArgs {
            actor: "alice",
            epic_id: None,
            repo_root,
            diagnostics,
            critical_diagnostics: critical,
            quality_evidence: None,
            next_prompt: None,
            stash: None,
            check_only: false,
            do_sync_merge: false,
            do_sync: false,
            do_push: false,
        }
    }

    #[test]
    fn clean_tree_and_no_wip_lands_successfully() {
        let store = store();
        let runner = ScriptedRunner::new(vec![
            ok(""),     // status --porcelain (clean)
            ok(""),     // pull --rebase
            ok("## main...origin/main"), // sync_status
        ]);
        let root = PathBuf::from(".");
        let diagnostics: Vec<String> = Vec::new();
        let critical = HashSet::new();
        let env = land(&store, &runner, base_args(&root, &diagnostics, &critical)).unwrap();
        assert!(env.ok, "{env:?}");
        assert_eq!(env.result, "landed");
    }

    #[test]
    fn dirty_tree_blocks_landing() {
        let store = store();
        let runner = ScriptedRunner::new(vec![ok(" M some/file.rs\n")]);
        let root = PathBuf::from(".");
        let diagnostics: Vec<String> = Vec::new();
        let critical = HashSet::new();
        let env = land(&store, &runner, base_args(&root, &diagnostics, &critical)).unwrap();
        assert!(!env.ok);
        assert_eq!(env.result, "policy_violation");
    }

    #[test]
    fn critical_diagnostic_blocks_before_touching_git() {
        let store = store();
        let runner = ScriptedRunner::new(vec![]);
        let root = PathBuf::from(".");
        let diagnostics = vec!["unsafe-unwrap".to_string()];
        let mut critical = HashSet::new();
        critical.insert("unsafe-unwrap".to_string());
        let env = land(&store, &runner, base_args(&root, &diagnostics, &critical)).unwrap();
        assert!(!env.ok);
    }

    #[test]
    fn check_only_skips_choreography() {
        let store = store();
        let runner = ScriptedRunner::new(vec![ok("")]);
        let root = PathBuf::from(".");
        let diagnostics: Vec<String> = Vec::new();
        let critical = HashSet::new();
        let mut land_args = base_args(&root, &diagnostics, &critical);
        land_args.check_only = true;
        let env = land(&store, &runner, land_args).unwrap();
        assert!(env.ok);
        assert_eq!(env.result, "check_passed");
    }

    #[test]
    fn failed_pull_rebase_is_reported_without_running_later_steps() {
        let store = store();
        let runner = ScriptedRunner::new(vec![
            ok(""),
            fail("conflict in src/lib.rs"),
        ]);
        let root = PathBuf::from(".");
        let diagnostics: Vec<String> = Vec::new();
        let critical = HashSet::new();
        let env = land(&store, &runner, base_args(&root, &diagnostics, &critical)).unwrap();
        assert!(!env.ok);
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn open_epic_children_block_landing() {
        let store = store();
        let epic = IssueBuilder::new("epic").id("bd-epic").build();
        let child = IssueBuilder::new("child").id("bd-child").build();
        store.create_issue(&epic, "alice").unwrap();
        store.create_issue(&child, "alice").unwrap();
        store
            .add_dependency(
                &beads_core::dependency::Dependency {
                    issue_id: "bd-child".into(),
                    depends_on_id: "bd-epic".into(),
                    dep_type: beads_core::enums::DependencyType::ParentChild,
                    created_at: chrono::Utc::now(),
                    created_by: "alice".into(),
                    metadata: String::new(),
                },
                "alice",
            )
            .unwrap();

        let runner = ScriptedRunner::new(vec![]);
        let root = PathBuf::from(".");
        let diagnostics: Vec<String> = Vec::new();
        let critical = HashSet::new();
        let mut land_args = base_args(&root, &diagnostics, &critical);
        land_args.epic_id = Some("bd-epic");
        let env = land(&store, &runner, land_args).unwrap();
        assert!(!env.ok);
        assert_eq!(env.result, "policy_violation");
    }
}
