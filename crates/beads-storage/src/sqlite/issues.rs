//! Issue CRUD operations for [`SqliteStore`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use beads_core::content_hash::compute_content_hash;
use beads_core::enums::{AdviceOnFailure, AdviceTrigger, AgentState, EventType, IssueType, Status};
use beads_core::filter::IssueFilter;
use beads_core::issue::{AdviceHook, AgentRecord, DecisionPoint, Issue, SkillRecord};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::traits::IssueUpdates;

// ---------------------------------------------------------------------------
// Column list (shared between INSERT and SELECT)
// ---------------------------------------------------------------------------

/// All issue columns in a deterministic order for SELECT queries.
pub(crate) const ISSUE_COLUMNS: &str = r#"
    id, content_hash, title, description, design, acceptance_criteria, notes,
    status, priority, issue_type, assignee, estimated_minutes,
    created_at, created_by, owner, updated_at, closed_at, close_reason, closed_by_session,
    external_ref, spec_id,
    source_system, metadata, source_repo,
    due_at, defer_until,
    advice_command, advice_trigger, advice_timeout, advice_on_failure,
    decision_prompt, decision_options, decision_selected, decision_response_text,
    decision_responded_by, decision_responded_at,
    skill_name, skill_version, skill_category, skill_inputs, skill_outputs, skill_examples, skill_content,
    agent_state, agent_hook_bead, agent_role_bead, agent_role_type, agent_rig,
    agent_advice_subs, agent_advice_subs_exclude
"#;

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

/// Deserialises a row into an [`Issue`].
///
/// The column order MUST match [`ISSUE_COLUMNS`].
pub(crate) fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let id: String = row.get("id")?;
    let content_hash: String = row.get("content_hash")?;
    let title: String = row.get("title")?;
    let description: String = row.get("description")?;
    let design: String = row.get("design")?;
    let acceptance_criteria: String = row.get("acceptance_criteria")?;
    let notes: String = row.get("notes")?;

    let status_str: String = row.get("status")?;
    let priority: i32 = row.get("priority")?;
    let issue_type_str: String = row.get("issue_type")?;
    let assignee: String = row.get("assignee")?;
    let estimated_minutes: Option<i32> = row.get("estimated_minutes")?;

    let created_at_str: String = row.get("created_at")?;
    let created_by: String = row.get("created_by")?;
    let owner: String = row.get("owner")?;
    let updated_at_str: String = row.get("updated_at")?;
    let closed_at_str: Option<String> = row.get("closed_at")?;
    let close_reason: String = row.get("close_reason")?;
    let closed_by_session: String = row.get("closed_by_session")?;

    let external_ref: Option<String> = row.get("external_ref")?;
    let spec_id: String = row.get::<_, Option<String>>("spec_id")?.unwrap_or_default();

    let source_system: String = row.get("source_system")?;
    let metadata_str: String = row.get("metadata")?;
    let source_repo: String = row.get("source_repo")?;

    let due_at_str: Option<String> = row.get("due_at")?;
    let defer_until_str: Option<String> = row.get("defer_until")?;

    let advice_command: String = row.get("advice_command")?;
    let advice_trigger_str: String = row.get("advice_trigger")?;
    let advice_timeout: i32 = row.get("advice_timeout")?;
    let advice_on_failure_str: String = row.get("advice_on_failure")?;

    let decision_prompt: String = row.get("decision_prompt")?;
    let decision_options_str: String = row.get("decision_options")?;
    let decision_selected: String = row.get("decision_selected")?;
    let decision_response_text: String = row.get("decision_response_text")?;
    let decision_responded_by: String = row.get("decision_responded_by")?;
    let decision_responded_at_str: Option<String> = row.get("decision_responded_at")?;

    let skill_name: String = row.get("skill_name")?;
    let skill_version: String = row.get("skill_version")?;
    let skill_category: String = row.get("skill_category")?;
    let skill_inputs_str: String = row.get("skill_inputs")?;
    let skill_outputs_str: String = row.get("skill_outputs")?;
    let skill_examples_str: String = row.get("skill_examples")?;
    let skill_content: String = row.get("skill_content")?;

    let agent_state_str: String = row.get("agent_state")?;
    let agent_hook_bead: String = row.get("agent_hook_bead")?;
    let agent_role_bead: String = row.get("agent_role_bead")?;
    let agent_role_type: String = row.get("agent_role_type")?;
    let agent_rig: String = row.get("agent_rig")?;
    let agent_advice_subs_str: String = row.get("agent_advice_subs")?;
    let agent_advice_subs_exclude_str: String = row.get("agent_advice_subs_exclude")?;

    // Parse timestamps.
    let created_at = parse_datetime(&created_at_str);
    let updated_at = parse_datetime(&updated_at_str);
    let closed_at = closed_at_str.as_deref().map(parse_datetime);
    let due_at = due_at_str.as_deref().map(parse_datetime);
    let defer_until = defer_until_str.as_deref().map(parse_datetime);
    let decision_responded_at = decision_responded_at_str.as_deref().map(parse_datetime);

    // Parse JSON fields.
    let metadata = if metadata_str.is_empty() || metadata_str == "{}" {
        None
    } else {
        serde_json::value::RawValue::from_string(metadata_str).ok()
    };

    let issue_type = IssueType::from(issue_type_str);

    let advice = if matches!(issue_type, IssueType::Advice) {
        Some(AdviceHook {
            command: advice_command,
            trigger: AdviceTrigger::from(advice_trigger_str),
            timeout: advice_timeout,
            on_failure: AdviceOnFailure::from(advice_on_failure_str),
        })
    } else {
        None
    };

    let decision = if matches!(issue_type, IssueType::Decision) {
        Some(DecisionPoint {
            prompt: decision_prompt,
            options: serde_json::from_str(&decision_options_str).unwrap_or_default(),
            selected_option: decision_selected,
            response_text: decision_response_text,
            responded_by: decision_responded_by,
            responded_at: decision_responded_at,
        })
    } else {
        None
    };

    let skill = if matches!(issue_type, IssueType::Skill) {
        Some(SkillRecord {
            name: skill_name,
            version: skill_version,
            category: skill_category,
            inputs: serde_json::from_str(&skill_inputs_str).unwrap_or_default(),
            outputs: serde_json::from_str(&skill_outputs_str).unwrap_or_default(),
            examples: serde_json::from_str(&skill_examples_str).unwrap_or_default(),
            content: skill_content,
        })
    } else {
        None
    };

    let agent = if matches!(issue_type, IssueType::Agent) {
        Some(AgentRecord {
            agent_state: AgentState::from(agent_state_str),
            hook_bead: agent_hook_bead,
            role_bead: agent_role_bead,
            role_type: agent_role_type,
            rig: agent_rig,
            advice_subscriptions: serde_json::from_str(&agent_advice_subs_str).unwrap_or_default(),
            advice_subscriptions_exclude: serde_json::from_str(&agent_advice_subs_exclude_str)
                .unwrap_or_default(),
        })
    } else {
        None
    };

    Ok(Issue {
        id,
        content_hash,
        title,
        description,
        design,
        acceptance_criteria,
        notes,
        status: Status::from(status_str),
        priority,
        issue_type,
        assignee,
        estimated_minutes,
        created_at,
        created_by,
        owner,
        updated_at,
        closed_at,
        close_reason,
        closed_by_session,
        external_ref,
        spec_id,
        source_system,
        metadata,
        source_repo,
        due_at,
        defer_until,
        advice,
        decision,
        skill,
        agent,
        // Fields populated separately for export/import:
        labels: Vec::new(),
        dependencies: Vec::new(),
        comments: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Formats a `DateTime<Utc>` as ISO 8601 TEXT for SQLite.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses an ISO 8601 TEXT string from SQLite into a `DateTime<Utc>`.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Try full RFC 3339 first, then common SQLite formats.
    s.parse::<DateTime<Utc>>().unwrap_or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ"))
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(|ndt| ndt.and_utc())
            .unwrap_or_else(|_| Utc::now())
    })
}

// ---------------------------------------------------------------------------
// Issue insert helper (shared between store and transaction)
// ---------------------------------------------------------------------------

/// Inserts a single issue into the database using the provided connection.
pub(crate) fn insert_issue(conn: &Connection, issue: &Issue, actor: &str) -> Result<()> {
    let now = Utc::now();
    let now_str = format_datetime(&now);
    let content_hash = compute_content_hash(issue);

    let metadata_str = issue
        .metadata
        .as_ref()
        .map(|m| m.get().to_string())
        .unwrap_or_else(|| "{}".to_string());

    let created_at_str = format_datetime(&issue.created_at);
    let updated_at_str = format_datetime(&issue.updated_at);
    let closed_at_str = issue.closed_at.as_ref().map(format_datetime);
    let due_at_str = issue.due_at.as_ref().map(format_datetime);
    let defer_until_str = issue.defer_until.as_ref().map(format_datetime);

    let advice = issue.advice.clone().unwrap_or_default();
    let decision = issue.decision.clone().unwrap_or_default();
    let skill = issue.skill.clone().unwrap_or_default();
    let agent = issue.agent.clone().unwrap_or_default();

    let decision_options_str =
        serde_json::to_string(&decision.options).unwrap_or_else(|_| "[]".to_string());
    let decision_responded_at_str = decision.responded_at.as_ref().map(format_datetime);
    let skill_inputs_str = serde_json::to_string(&skill.inputs).unwrap_or_else(|_| "[]".to_string());
    let skill_outputs_str =
        serde_json::to_string(&skill.outputs).unwrap_or_else(|_| "[]".to_string());
    let skill_examples_str =
        serde_json::to_string(&skill.examples).unwrap_or_else(|_| "[]".to_string());
    let agent_advice_subs_str =
        serde_json::to_string(&agent.advice_subscriptions).unwrap_or_else(|_| "[]".to_string());
    let agent_advice_subs_exclude_str =
        serde_json::to_string(&agent.advice_subscriptions_exclude).unwrap_or_else(|_| "[]".to_string());

    conn.execute(
        &format!(
            "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19,
                ?20, ?21,
                ?22, ?23, ?24,
                ?25, ?26,
                ?27, ?28, ?29, ?30,
                ?31, ?32, ?33, ?34,
                ?35, ?36,
                ?37, ?38, ?39, ?40, ?41, ?42, ?43,
                ?44, ?45, ?46, ?47, ?48,
                ?49, ?50
            )"
        ),
        params![
            issue.id,                    // 1
            content_hash,                // 2
            issue.title,                 // 3
            issue.description,           // 4
            issue.design,                // 5
            issue.acceptance_criteria,   // 6
            issue.notes,                 // 7
            issue.status.as_str(),       // 8
            issue.priority,              // 9
            issue.issue_type.as_str(),   // 10
            issue.assignee,              // 11
            issue.estimated_minutes,     // 12
            created_at_str,              // 13
            issue.created_by,            // 14
            issue.owner,                 // 15
            updated_at_str,              // 16
            closed_at_str,               // 17
            issue.close_reason,          // 18
            issue.closed_by_session,     // 19
            issue.external_ref,          // 20
            issue.spec_id,               // 21
            issue.source_system,         // 22
            metadata_str,                // 23
            issue.source_repo,           // 24
            due_at_str,                  // 25
            defer_until_str,             // 26
            advice.command,              // 27
            advice.trigger.as_str(),     // 28
            advice.timeout,              // 29
            advice.on_failure.as_str(),  // 30
            decision.prompt,             // 31
            decision_options_str,        // 32
            decision.selected_option,    // 33
            decision.response_text,      // 34
            decision.responded_by,       // 35
            decision_responded_at_str,   // 36
            skill.name,                  // 37
            skill.version,               // 38
            skill.category,              // 39
            skill_inputs_str,            // 40
            skill_outputs_str,           // 41
            skill_examples_str,          // 42
            skill.content,               // 43
            agent.agent_state.as_str(),  // 44
            agent.hook_bead,             // 45
            agent.role_bead,             // 46
            agent.role_type,             // 47
            agent.rig,                   // 48
            agent_advice_subs_str,       // 49
            agent_advice_subs_exclude_str, // 50
        ],
    )?;

    // Emit "created" event.
    emit_event(
        conn,
        &issue.id,
        EventType::Created,
        actor,
        None,
        None,
        None,
        &now_str,
    )?;

    Ok(())
}

/// Emits an event row into the events table.
#[allow(clippy::too_many_arguments)]
pub(crate) fn emit_event(
    conn: &Connection,
    issue_id: &str,
    event_type: EventType,
    actor: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    comment: Option<&str>,
    created_at: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO events (issue_id, event_type, actor, old_value, new_value, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            issue_id,
            event_type.as_str(),
            actor,
            old_value,
            new_value,
            comment,
            created_at,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore issue methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Creates a single issue.
    pub fn create_issue_impl(&self, issue: &Issue, actor: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_issue(&conn, issue, actor)
    }

    /// Creates multiple issues in a single transaction.
    pub fn create_issues_impl(&self, issues: &[Issue], actor: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        for issue in issues {
            insert_issue(&tx, issue, actor)?;
        }
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(())
    }

    /// Retrieves an issue by ID.
    pub fn get_issue_impl(&self, id: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        get_issue_on_conn(&conn, id)
    }

    /// Retrieves an issue by external reference.
    pub fn get_issue_by_external_ref_impl(&self, external_ref: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE external_ref = ?1");
        conn.query_row(&sql, params![external_ref], scan_issue)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StorageError::not_found("issue", format!("external_ref={external_ref}"))
                }
                other => StorageError::Query(other),
            })
    }

    /// Retrieves multiple issues by their IDs.
    pub fn get_issues_by_ids_impl(&self, ids: &[String]) -> Result<Vec<Issue>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock_conn()?;
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id IN ({placeholders})");
        let mut stmt = conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(ids.iter());
        let rows = stmt.query_map(params, scan_issue)?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }

    /// Applies partial updates to an issue.
    pub fn update_issue_impl(&self, id: &str, updates: &IssueUpdates, actor: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        update_issue_on_conn(&conn, id, updates, actor)
    }

    /// Closes an issue.
    pub fn close_issue_impl(
        &self,
        id: &str,
        reason: &str,
        actor: &str,
        session: &str,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        close_issue_on_conn(&conn, id, reason, actor, session)
    }

    /// Deletes an issue and all its related data (cascading FKs).
    pub fn delete_issue_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_issue_on_conn(&conn, id)
    }

    /// Searches issues by text query and filter.
    pub fn search_issues_impl(&self, query: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        search_issues_on_conn(&conn, query, filter)
    }

    /// Atomically assigns `assignee` to an open, unassigned issue and moves
    /// it to `in_progress`.
    pub fn claim_issue_impl(&self, id: &str, assignee: &str, actor: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        let issue = get_issue_on_conn(&conn, id)?;

        if !issue.assignee.is_empty() && issue.assignee != assignee {
            return Err(StorageError::AlreadyClaimed {
                assignee: issue.assignee,
            });
        }
        if issue.status != Status::Open {
            return Err(StorageError::validation(format!(
                "issue {id} is not open (status={})",
                issue.status.as_str()
            )));
        }

        let now_str = format_datetime(&Utc::now());
        conn.execute(
            "UPDATE issues SET assignee = ?1, status = 'in_progress', updated_at = ?2 WHERE id = ?3",
            params![assignee, now_str, id],
        )?;
        emit_event(
            &conn,
            id,
            EventType::StatusChanged,
            actor,
            Some("open"),
            Some("in_progress"),
            None,
            &now_str,
        )?;

        get_issue_on_conn(&conn, id)
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by both SqliteStore and Transaction)
// ---------------------------------------------------------------------------

/// Retrieves a single issue by ID on the given connection.
pub(crate) fn get_issue_on_conn(conn: &Connection, id: &str) -> Result<Issue> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_issue)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id),
            other => StorageError::Query(other),
        })
}

/// Applies partial updates on the given connection.
pub(crate) fn update_issue_on_conn(
    conn: &Connection,
    id: &str,
    updates: &IssueUpdates,
    actor: &str,
) -> Result<()> {
    let now = Utc::now();
    let now_str = format_datetime(&now);

    // Build SET clause dynamically from non-None fields.
    let mut set_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    macro_rules! add_field {
        ($field:ident, $col:expr) => {
            if let Some(ref val) = updates.$field {
                set_clauses.push(format!("{} = ?", $col));
                param_values.push(Box::new(val.clone()));
            }
        };
    }

    add_field!(title, "title");
    add_field!(description, "description");
    add_field!(design, "design");
    add_field!(acceptance_criteria, "acceptance_criteria");
    add_field!(notes, "notes");
    add_field!(spec_id, "spec_id");
    add_field!(assignee, "assignee");
    add_field!(owner, "owner");
    add_field!(source_system, "source_system");
    add_field!(close_reason, "close_reason");
    add_field!(closed_by_session, "closed_by_session");

    if let Some(ref status) = updates.status {
        set_clauses.push("status = ?".to_string());
        param_values.push(Box::new(status.as_str().to_string()));
    }
    if let Some(ref issue_type) = updates.issue_type {
        set_clauses.push("issue_type = ?".to_string());
        param_values.push(Box::new(issue_type.as_str().to_string()));
    }
    if let Some(priority) = updates.priority {
        set_clauses.push("priority = ?".to_string());
        param_values.push(Box::new(priority));
    }

    // Option<Option<T>> fields: outer Some means "update", inner Option is the new value.
    if let Some(ref ext) = updates.external_ref {
        set_clauses.push("external_ref = ?".to_string());
        param_values.push(Box::new(ext.clone()));
    }
    if let Some(ref est) = updates.estimated_minutes {
        set_clauses.push("estimated_minutes = ?".to_string());
        param_values.push(Box::new(*est));
    }
    if let Some(ref meta) = updates.metadata {
        set_clauses.push("metadata = ?".to_string());
        param_values.push(Box::new(meta.clone().unwrap_or_else(|| "{}".to_string())));
    }

    // DateTime Option<Option<DateTime>> fields.
    if let Some(ref due) = updates.due_at {
        set_clauses.push("due_at = ?".to_string());
        param_values.push(Box::new(due.as_ref().map(format_datetime)));
    }
    if let Some(ref defer) = updates.defer_until {
        set_clauses.push("defer_until = ?".to_string());
        param_values.push(Box::new(defer.as_ref().map(format_datetime)));
    }

    // Agent sub-record fields.
    if let Some(ref agent_state) = updates.agent_state {
        set_clauses.push("agent_state = ?".to_string());
        param_values.push(Box::new(agent_state.as_str().to_string()));
    }
    add_field!(agent_hook_bead, "agent_hook_bead");
    add_field!(agent_role_bead, "agent_role_bead");
    add_field!(agent_role_type, "agent_role_type");
    add_field!(agent_rig, "agent_rig");

    // Decision sub-record fields (responding to a decision point).
    add_field!(decision_selected, "decision_selected");
    add_field!(decision_response_text, "decision_response_text");
    add_field!(decision_responded_by, "decision_responded_by");
    if let Some(ref responded_at) = updates.decision_responded_at {
        set_clauses.push("decision_responded_at = ?".to_string());
        param_values.push(Box::new(responded_at.as_ref().map(format_datetime)));
    }

    if set_clauses.is_empty() {
        return Ok(()); // Nothing to update.
    }

    // Always update updated_at.
    set_clauses.push("updated_at = ?".to_string());
    param_values.push(Box::new(now_str.clone()));

    let sql = format!("UPDATE issues SET {} WHERE id = ?", set_clauses.join(", "));
    param_values.push(Box::new(id.to_string()));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();

    let affected = conn.execute(&sql, param_refs.as_slice())?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id));
    }

    let event_type = if updates.decision_responded_at.is_some() {
        EventType::DecisionResponded
    } else if updates.status.is_some() {
        EventType::StatusChanged
    } else {
        EventType::Updated
    };

    emit_event(conn, id, event_type, actor, None, None, None, &now_str)?;

    Ok(())
}

/// Closes an issue on the given connection.
pub(crate) fn close_issue_on_conn(
    conn: &Connection,
    id: &str,
    reason: &str,
    actor: &str,
    session: &str,
) -> Result<()> {
    let now = Utc::now();
    let now_str = format_datetime(&now);

    let affected = conn.execute(
        "UPDATE issues SET status = 'closed', closed_at = ?1, close_reason = ?2,
         closed_by_session = ?3, updated_at = ?1 WHERE id = ?4",
        params![now_str, reason, session, id],
    )?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id));
    }

    emit_event(
        conn,
        id,
        EventType::Closed,
        actor,
        None,
        Some(reason),
        None,
        &now_str,
    )?;

    Ok(())
}

/// Deletes an issue on the given connection.
pub(crate) fn delete_issue_on_conn(conn: &Connection, id: &str) -> Result<()> {
    let affected = conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id));
    }
    Ok(())
}

/// Searches issues on the given connection.
pub(crate) fn search_issues_on_conn(
    conn: &Connection,
    query: &str,
    filter: &IssueFilter,
) -> Result<Vec<Issue>> {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut param_idx = 1;

    // Full-text search across title, description, notes.
    if !query.is_empty() {
        where_clauses.push(format!(
            "(title LIKE ?{pi} OR description LIKE ?{pi} OR notes LIKE ?{pi})",
            pi = param_idx
        ));
        param_values.push(Box::new(format!("%{query}%")));
        param_idx += 1;
    }

    // Filter fields.
    if let Some(ref status) = filter.status {
        where_clauses.push(format!("status = ?{param_idx}"));
        param_values.push(Box::new(status.as_str().to_string()));
        param_idx += 1;
    }
    if let Some(priority) = filter.priority {
        where_clauses.push(format!("priority = ?{param_idx}"));
        param_values.push(Box::new(priority));
        param_idx += 1;
    }
    if let Some(ref issue_type) = filter.issue_type {
        where_clauses.push(format!("issue_type = ?{param_idx}"));
        param_values.push(Box::new(issue_type.as_str().to_string()));
        param_idx += 1;
    }
    if let Some(ref assignee) = filter.assignee {
        where_clauses.push(format!("assignee = ?{param_idx}"));
        param_values.push(Box::new(assignee.clone()));
        param_idx += 1;
    }
    if let Some(ref title_contains) = filter.title_contains {
        where_clauses.push(format!("title LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("%{title_contains}%")));
        param_idx += 1;
    }
    if let Some(ref desc_contains) = filter.description_contains {
        where_clauses.push(format!("description LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("%{desc_contains}%")));
        param_idx += 1;
    }
    if let Some(ref notes_contains) = filter.notes_contains {
        where_clauses.push(format!("notes LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("%{notes_contains}%")));
        param_idx += 1;
    }
    if let Some(ref created_after) = filter.created_after {
        where_clauses.push(format!("created_at >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(created_after)));
        param_idx += 1;
    }
    if let Some(ref created_before) = filter.created_before {
        where_clauses.push(format!("created_at <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(created_before)));
        param_idx += 1;
    }
    if let Some(ref updated_after) = filter.updated_after {
        where_clauses.push(format!("updated_at >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(updated_after)));
        param_idx += 1;
    }
    if let Some(ref updated_before) = filter.updated_before {
        where_clauses.push(format!("updated_at <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(updated_before)));
        param_idx += 1;
    }
    if filter.no_assignee {
        where_clauses.push("(assignee IS NULL OR assignee = '')".to_string());
    }
    if filter.empty_description {
        where_clauses.push("(description IS NULL OR description = '')".to_string());
    }
    if let Some(ref id_prefix) = filter.id_prefix {
        where_clauses.push(format!("id LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("{id_prefix}%")));
        param_idx += 1;
    }
    if let Some(ref spec_prefix) = filter.spec_id_prefix {
        where_clauses.push(format!("spec_id LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("{spec_prefix}%")));
        param_idx += 1;
    }
    if let Some(ref source_repo) = filter.source_repo {
        where_clauses.push(format!("source_repo = ?{param_idx}"));
        param_values.push(Box::new(source_repo.clone()));
        param_idx += 1;
    }
    if let Some(ref title_search) = filter.title_search {
        where_clauses.push(format!("title LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("%{title_search}%")));
        param_idx += 1;
    }
    if let Some(priority_min) = filter.priority_min {
        where_clauses.push(format!("priority >= ?{param_idx}"));
        param_values.push(Box::new(priority_min));
        param_idx += 1;
    }
    if let Some(priority_max) = filter.priority_max {
        where_clauses.push(format!("priority <= ?{param_idx}"));
        param_values.push(Box::new(priority_max));
        param_idx += 1;
    }
    if let Some(ref closed_after) = filter.closed_after {
        where_clauses.push(format!("closed_at >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(closed_after)));
        param_idx += 1;
    }
    if let Some(ref closed_before) = filter.closed_before {
        where_clauses.push(format!("closed_at <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(closed_before)));
        param_idx += 1;
    }
    if let Some(ref parent_id) = filter.parent_id {
        where_clauses.push(format!(
            "EXISTS (SELECT 1 FROM dependencies WHERE dependencies.issue_id = issues.id \
             AND dependencies.depends_on_id = ?{param_idx} AND dependencies.type = 'parent-child')"
        ));
        param_values.push(Box::new(parent_id.clone()));
        param_idx += 1;
    }
    if filter.no_parent {
        where_clauses.push(
            "NOT EXISTS (SELECT 1 FROM dependencies WHERE dependencies.issue_id = issues.id \
             AND dependencies.type = 'parent-child')"
                .to_string(),
        );
    }
    if filter.deferred {
        where_clauses.push("defer_until IS NOT NULL".to_string());
    }
    if let Some(ref defer_after) = filter.defer_after {
        where_clauses.push(format!("defer_until >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(defer_after)));
        param_idx += 1;
    }
    if let Some(ref defer_before) = filter.defer_before {
        where_clauses.push(format!("defer_until <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(defer_before)));
        param_idx += 1;
    }
    if let Some(ref due_after) = filter.due_after {
        where_clauses.push(format!("due_at >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(due_after)));
        param_idx += 1;
    }
    if let Some(ref due_before) = filter.due_before {
        where_clauses.push(format!("due_at <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(due_before)));
        param_idx += 1;
    }
    if filter.overdue {
        where_clauses.push(format!(
            "(due_at IS NOT NULL AND due_at < ?{param_idx} AND status != 'closed')"
        ));
        param_values.push(Box::new(format_datetime(&Utc::now())));
        param_idx += 1;
    }
    if let Some(ref label_pattern) = filter.label_pattern {
        where_clauses.push(format!(
            "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = issues.id AND labels.label GLOB ?{param_idx})"
        ));
        param_values.push(Box::new(label_pattern.clone()));
        param_idx += 1;
    }

    // Exclude statuses.
    for status in &filter.exclude_status {
        where_clauses.push(format!("status != ?{param_idx}"));
        param_values.push(Box::new(status.as_str().to_string()));
        param_idx += 1;
    }
    // Exclude types.
    for itype in &filter.exclude_types {
        where_clauses.push(format!("issue_type != ?{param_idx}"));
        param_values.push(Box::new(itype.as_str().to_string()));
        param_idx += 1;
    }

    // Filter by specific IDs.
    if !filter.ids.is_empty() {
        let placeholders: Vec<String> = filter
            .ids
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", param_idx + i))
            .collect();
        where_clauses.push(format!("id IN ({})", placeholders.join(",")));
        for id in &filter.ids {
            param_values.push(Box::new(id.clone()));
        }
        param_idx += filter.ids.len();
    }

    // Labels AND.
    for label in &filter.labels {
        where_clauses.push(format!(
            "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = issues.id AND labels.label = ?{param_idx})"
        ));
        param_values.push(Box::new(label.clone()));
        param_idx += 1;
    }

    // Labels OR.
    if !filter.labels_any.is_empty() {
        let placeholders: Vec<String> = filter
            .labels_any
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", param_idx + i))
            .collect();
        where_clauses.push(format!(
            "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = issues.id AND labels.label IN ({}))",
            placeholders.join(",")
        ));
        for label in &filter.labels_any {
            param_values.push(Box::new(label.clone()));
        }
        param_idx += filter.labels_any.len();
    }

    // No labels.
    if filter.no_labels {
        where_clauses.push(
            "NOT EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = issues.id)".to_string(),
        );
    }

    // Build final SQL.
    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let limit_sql = filter
        .limit
        .map(|l| format!(" LIMIT {l}"))
        .unwrap_or_default();

    let sql = format!(
        "SELECT {ISSUE_COLUMNS} FROM issues {where_sql} ORDER BY created_at DESC{limit_sql}"
    );

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;

    let mut issues = Vec::new();
    for row in rows {
        issues.push(row?);
    }

    // Suppress the "unused" warning for param_idx.
    let _ = param_idx;

    // label_regex has no SQLite-native equivalent; filter the result set in
    // Rust rather than registering a custom scalar function.
    if let Some(ref pattern) = filter.label_regex {
        let re = regex::Regex::new(pattern)
            .map_err(|e| StorageError::validation(format!("invalid label_regex: {e}")))?;
        let mut kept = Vec::with_capacity(issues.len());
        for issue in issues {
            let labels = get_issue_labels_on_conn(conn, &issue.id)?;
            if labels.iter().any(|l| re.is_match(l)) {
                kept.push(issue);
            }
        }
        issues = kept;
    }

    Ok(issues)
}

fn get_issue_labels_on_conn(conn: &Connection, issue_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT label FROM labels WHERE issue_id = ?1")?;
    let rows = stmt.query_map(params![issue_id], |row| row.get::<_, String>(0))?;
    let mut labels = Vec::new();
    for row in rows {
        labels.push(row?);
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;
    use beads_core::issue::IssueBuilder;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_get_issue() {
        let store = test_store();
        let issue = IssueBuilder::new("Test issue")
            .id("bd-test1")
            .description("A test description")
            .priority(2)
            .build();

        store.create_issue_impl(&issue, "alice").unwrap();

        let got = store.get_issue_impl("bd-test1").unwrap();
        assert_eq!(got.title, "Test issue");
        assert_eq!(got.description, "A test description");
        assert_eq!(got.priority, 2);
        assert!(!got.content_hash.is_empty());
    }

    #[test]
    fn get_nonexistent_issue_returns_not_found() {
        let store = test_store();
        let err = store.get_issue_impl("bd-nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_issue_partial() {
        let store = test_store();
        let issue = IssueBuilder::new("Original title").id("bd-upd1").build();
        store.create_issue_impl(&issue, "alice").unwrap();

        let updates = IssueUpdates {
            title: Some("Updated title".into()),
            priority: Some(3),
            ..Default::default()
        };
        store.update_issue_impl("bd-upd1", &updates, "bob").unwrap();

        let got = store.get_issue_impl("bd-upd1").unwrap();
        assert_eq!(got.title, "Updated title");
        assert_eq!(got.priority, 3);
    }

    #[test]
    fn close_issue() {
        let store = test_store();
        let issue = IssueBuilder::new("To close").id("bd-close1").build();
        store.create_issue_impl(&issue, "alice").unwrap();

        store
            .close_issue_impl("bd-close1", "completed", "alice", "session-1")
            .unwrap();

        let got = store.get_issue_impl("bd-close1").unwrap();
        assert_eq!(got.status, Status::Closed);
        assert!(got.closed_at.is_some());
        assert_eq!(got.close_reason, "completed");
    }

    #[test]
    fn delete_issue() {
        let store = test_store();
        let issue = IssueBuilder::new("To delete").id("bd-del1").build();
        store.create_issue_impl(&issue, "alice").unwrap();

        store.delete_issue_impl("bd-del1").unwrap();

        let err = store.get_issue_impl("bd-del1").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn search_issues_by_text() {
        let store = test_store();
        let issue1 = IssueBuilder::new("Fix login bug")
            .id("bd-s1")
            .description("Users cannot log in")
            .build();
        let issue2 = IssueBuilder::new("Add dashboard")
            .id("bd-s2")
            .description("New dashboard feature")
            .build();
        store.create_issue_impl(&issue1, "alice").unwrap();
        store.create_issue_impl(&issue2, "alice").unwrap();

        let results = store
            .search_issues_impl("login", &IssueFilter::default())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-s1");
    }

    #[test]
    fn search_issues_by_status_filter() {
        let store = test_store();
        let issue1 = IssueBuilder::new("Open issue")
            .id("bd-sf1")
            .status(Status::Open)
            .build();
        let issue2 = IssueBuilder::new("Closed issue")
            .id("bd-sf2")
            .status(Status::Closed)
            .closed_at(Utc::now())
            .close_reason("done")
            .build();
        store.create_issue_impl(&issue1, "alice").unwrap();
        store.create_issue_impl(&issue2, "alice").unwrap();

        let filter = IssueFilter {
            status: Some(Status::Open),
            ..Default::default()
        };
        let results = store.search_issues_impl("", &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-sf1");
    }

    #[test]
    fn advice_hook_roundtrips_through_sqlite() {
        let store = test_store();
        let issue = IssueBuilder::new("Lint before commit")
            .id("bd-adv1")
            .issue_type(IssueType::Advice)
            .advice(AdviceHook {
                command: "cargo fmt --check".into(),
                trigger: beads_core::enums::AdviceTrigger::BeforeCommit,
                timeout: 60,
                on_failure: beads_core::enums::AdviceOnFailure::Block,
            })
            .build();
        store.create_issue_impl(&issue, "alice").unwrap();

        let got = store.get_issue_impl("bd-adv1").unwrap();
        let advice = got.advice.expect("advice present");
        assert_eq!(advice.command, "cargo fmt --check");
        assert_eq!(advice.timeout, 60);
    }

    #[test]
    fn search_issues_by_priority_range() {
        let store = test_store();
        for (id, pri) in [("bd-pr1", 0), ("bd-pr2", 2), ("bd-pr3", 4)] {
            let issue = IssueBuilder::new("Issue").id(id).priority(pri).build();
            store.create_issue_impl(&issue, "alice").unwrap();
        }

        let filter = IssueFilter {
            priority_min: Some(1),
            priority_max: Some(3),
            ..Default::default()
        };
        let results = store.search_issues_impl("", &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-pr2");
    }

    #[test]
    fn search_issues_by_label_pattern_and_regex() {
        let store = test_store();
        let issue = IssueBuilder::new("Issue").id("bd-lp1").build();
        store.create_issue_impl(&issue, "alice").unwrap();
        store.add_label_impl("bd-lp1", "tech-debt", "alice").unwrap();

        let glob_filter = IssueFilter {
            label_pattern: Some("tech-*".into()),
            ..Default::default()
        };
        assert_eq!(store.search_issues_impl("", &glob_filter).unwrap().len(), 1);

        let regex_filter = IssueFilter {
            label_regex: Some("^tech-(debt|legacy)$".into()),
            ..Default::default()
        };
        assert_eq!(store.search_issues_impl("", &regex_filter).unwrap().len(), 1);

        let no_match_filter = IssueFilter {
            label_regex: Some("^urgent$".into()),
            ..Default::default()
        };
        assert!(store.search_issues_impl("", &no_match_filter).unwrap().is_empty());
    }

    #[test]
    fn search_issues_by_parent_id() {
        use beads_core::dependency::Dependency;
        use beads_core::enums::DependencyType;

        let store = test_store();
        let parent = IssueBuilder::new("Parent").id("bd-par1").build();
        let child = IssueBuilder::new("Child").id("bd-chi1").build();
        let other = IssueBuilder::new("Unrelated").id("bd-unr1").build();
        store.create_issue_impl(&parent, "alice").unwrap();
        store.create_issue_impl(&child, "alice").unwrap();
        store.create_issue_impl(&other, "alice").unwrap();

        let dep = Dependency {
            issue_id: "bd-chi1".into(),
            depends_on_id: "bd-par1".into(),
            dep_type: DependencyType::ParentChild,
            created_at: Utc::now(),
            created_by: "alice".into(),
            metadata: String::new(),
        };
        store.add_dependency_impl(&dep, "alice").unwrap();

        let filter = IssueFilter {
            parent_id: Some("bd-par1".into()),
            ..Default::default()
        };
        let results = store.search_issues_impl("", &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-chi1");

        let no_parent_filter = IssueFilter {
            no_parent: true,
            ..Default::default()
        };
        let results = store.search_issues_impl("", &no_parent_filter).unwrap();
        let ids: Vec<&str> = results.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"bd-par1"));
        assert!(ids.contains(&"bd-unr1"));
        assert!(!ids.contains(&"bd-chi1"));
    }

    #[test]
    fn search_issues_overdue() {
        let store = test_store();
        let past_due = IssueBuilder::new("Overdue")
            .id("bd-ovd1")
            .due_at(Utc::now() - chrono::Duration::days(1))
            .build();
        let future_due = IssueBuilder::new("Not due yet")
            .id("bd-ovd2")
            .due_at(Utc::now() + chrono::Duration::days(1))
            .build();
        store.create_issue_impl(&past_due, "alice").unwrap();
        store.create_issue_impl(&future_due, "alice").unwrap();

        let filter = IssueFilter {
            overdue: true,
            ..Default::default()
        };
        let results = store.search_issues_impl("", &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-ovd1");
    }
}
