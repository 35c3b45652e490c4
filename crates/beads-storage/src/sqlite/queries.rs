//! Complex queries: ready work, blocked issues, epic status, cycle detection.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use beads_core::enums::DependencyType;
use beads_core::filter::WorkFilter;
use beads_core::issue::{DecisionPoint, Issue};

use crate::error::{Result, StorageError};
use crate::sqlite::issues::{format_datetime, scan_issue, ISSUE_COLUMNS};
use crate::sqlite::store::SqliteStore;
use crate::traits::{BlockedIssue, EpicStatus, Statistics};

impl SqliteStore {
    /// Returns issues that are ready to work on.
    ///
    /// An issue is ready if:
    /// - status is "open"
    /// - it has no open blocking dependency (type="blocks")
    /// - it is not deferred past now (unless `include_deferred` is set)
    pub fn get_ready_work_impl(&self, filter: &WorkFilter) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        let now = Utc::now();
        let now_str = format_datetime(&now);

        let mut where_clauses: Vec<String> = vec!["i.status = 'open'".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut param_idx = 1;

        // Exclude issues with open blocking dependencies.
        where_clauses.push(
            "NOT EXISTS (
                SELECT 1 FROM dependencies d
                INNER JOIN issues blocker ON blocker.id = d.depends_on_id
                WHERE d.issue_id = i.id
                  AND d.type = 'blocks'
                  AND blocker.status != 'closed'
            )"
            .to_string(),
        );

        if !filter.include_deferred {
            where_clauses.push(format!("(i.defer_until IS NULL OR i.defer_until <= ?{param_idx})"));
            param_values.push(Box::new(now_str.clone()));
            param_idx += 1;
        }

        // Optional filters.
        if let Some(ref issue_type) = filter.issue_type {
            where_clauses.push(format!("i.issue_type = ?{param_idx}"));
            param_values.push(Box::new(issue_type.clone()));
            param_idx += 1;
        }
        if let Some(priority) = filter.priority {
            where_clauses.push(format!("i.priority = ?{param_idx}"));
            param_values.push(Box::new(priority));
            param_idx += 1;
        }
        if let Some(ref assignee) = filter.assignee {
            where_clauses.push(format!("i.assignee = ?{param_idx}"));
            param_values.push(Box::new(assignee.clone()));
            param_idx += 1;
        }
        if filter.unassigned {
            where_clauses.push("(i.assignee IS NULL OR i.assignee = '')".to_string());
        }

        // Label filters (AND).
        for label in &filter.labels {
            where_clauses.push(format!(
                "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = i.id AND labels.label = ?{param_idx})"
            ));
            param_values.push(Box::new(label.clone()));
            param_idx += 1;
        }

        // Label filters (OR).
        if !filter.labels_any.is_empty() {
            let placeholders: Vec<String> = filter
                .labels_any
                .iter()
                .enumerate()
                .map(|(j, _)| format!("?{}", param_idx + j))
                .collect();
            where_clauses.push(format!(
                "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = i.id AND labels.label IN ({}))",
                placeholders.join(",")
            ));
            for label in &filter.labels_any {
                param_values.push(Box::new(label.clone()));
            }
            param_idx += filter.labels_any.len();
        }

        // Descendants of a parent bead/epic.
        if let Some(ref parent_id) = filter.parent_id {
            where_clauses.push(format!(
                "EXISTS (SELECT 1 FROM dependencies d WHERE d.issue_id = i.id AND d.depends_on_id = ?{param_idx} AND d.type = 'parent-child')"
            ));
            param_values.push(Box::new(parent_id.clone()));
            param_idx += 1;
        }

        let where_sql = where_clauses.join(" AND ");

        let order_sql = match filter.sort_policy {
            beads_core::enums::SortPolicy::Priority => "i.priority ASC, i.created_at ASC",
            beads_core::enums::SortPolicy::Oldest => "i.created_at ASC",
            _ => "i.priority ASC, i.created_at ASC", // Hybrid default
        };

        let limit_sql = filter
            .limit
            .map(|l| format!(" LIMIT {l}"))
            .unwrap_or_default();

        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues i WHERE {where_sql} ORDER BY {order_sql}{limit_sql}"
        );

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }

        let _ = param_idx;
        Ok(issues)
    }

    /// Returns issues that have at least one open blocking dependency.
    pub fn get_blocked_issues_impl(&self, filter: &WorkFilter) -> Result<Vec<BlockedIssue>> {
        let conn = self.lock_conn()?;

        let mut where_clauses: Vec<String> = vec!["i.status != 'closed'".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut param_idx = 1;

        where_clauses.push(
            "EXISTS (
                SELECT 1 FROM dependencies d
                INNER JOIN issues blocker ON blocker.id = d.depends_on_id
                WHERE d.issue_id = i.id
                  AND d.type = 'blocks'
                  AND blocker.status != 'closed'
            )"
            .to_string(),
        );

        if let Some(ref assignee) = filter.assignee {
            where_clauses.push(format!("i.assignee = ?{param_idx}"));
            param_values.push(Box::new(assignee.clone()));
            param_idx += 1;
        }
        if let Some(priority) = filter.priority {
            where_clauses.push(format!("i.priority = ?{param_idx}"));
            param_values.push(Box::new(priority));
            param_idx += 1;
        }

        let where_sql = where_clauses.join(" AND ");
        let limit_sql = filter
            .limit
            .map(|l| format!(" LIMIT {l}"))
            .unwrap_or_default();

        let sql = format!(
            "SELECT {ISSUE_COLUMNS},
                    (SELECT COUNT(*)
                     FROM dependencies d
                     INNER JOIN issues blocker ON blocker.id = d.depends_on_id
                     WHERE d.issue_id = i.id
                       AND d.type = 'blocks'
                       AND blocker.status != 'closed'
                    ) AS blocked_by_count
             FROM issues i
             WHERE {where_sql}
             ORDER BY i.priority ASC, i.created_at ASC{limit_sql}"
        );

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let issue = scan_issue(row)?;
            let blocked_by_count: i32 = row.get("blocked_by_count")?;
            Ok(BlockedIssue {
                issue,
                blocked_by_count,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }

        let _ = param_idx;
        Ok(result)
    }

    /// Returns `true` if the issue has at least one open blocking dependency.
    pub fn is_blocked_impl(&self, id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM dependencies d
             INNER JOIN issues blocker ON blocker.id = d.depends_on_id
             WHERE d.issue_id = ?1 AND d.type = 'blocks' AND blocker.status != 'closed'",
            rusqlite::params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Returns epics where all children are closed.
    pub fn get_epics_eligible_for_closure_impl(&self) -> Result<Vec<EpicStatus>> {
        let conn = self.lock_conn()?;

        let sql = format!(
            "SELECT {ISSUE_COLUMNS},
                    (SELECT COUNT(*)
                     FROM dependencies d
                     INNER JOIN issues child ON child.id = d.issue_id
                     WHERE d.depends_on_id = i.id AND d.type = 'parent-child'
                    ) AS total_children,
                    (SELECT COUNT(*)
                     FROM dependencies d
                     INNER JOIN issues child ON child.id = d.issue_id
                     WHERE d.depends_on_id = i.id
                       AND d.type = 'parent-child'
                       AND child.status = 'closed'
                    ) AS closed_children
             FROM issues i
             WHERE i.issue_type = 'epic'
               AND i.status != 'closed'
               AND (SELECT COUNT(*)
                    FROM dependencies d
                    INNER JOIN issues child ON child.id = d.issue_id
                    WHERE d.depends_on_id = i.id AND d.type = 'parent-child'
                   ) > 0
               AND (SELECT COUNT(*)
                    FROM dependencies d
                    INNER JOIN issues child ON child.id = d.issue_id
                    WHERE d.depends_on_id = i.id AND d.type = 'parent-child'
                   ) = (SELECT COUNT(*)
                        FROM dependencies d
                        INNER JOIN issues child ON child.id = d.issue_id
                        WHERE d.depends_on_id = i.id
                          AND d.type = 'parent-child'
                          AND child.status = 'closed'
                       )
             ORDER BY i.created_at ASC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let issue = scan_issue(row)?;
            let total_children: i32 = row.get("total_children")?;
            let closed_children: i32 = row.get("closed_children")?;
            Ok(EpicStatus {
                epic: issue,
                total_children,
                closed_children,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Enumerates elementary cycles among `blocks`/`parent-child` edges.
    ///
    /// Builds the edge set in memory, then runs Johnson-style DFS from every
    /// node to find simple cycles back to the start node, deduplicating
    /// rotations of the same cycle.
    pub fn detect_cycles_impl(&self) -> Result<Vec<Vec<String>>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare("SELECT issue_id, depends_on_id, type FROM dependencies")?;
        let rows = stmt.query_map([], |row| {
            let issue_id: String = row.get(0)?;
            let depends_on_id: String = row.get(1)?;
            let dep_type: String = row.get(2)?;
            Ok((issue_id, depends_on_id, dep_type))
        })?;

        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let (issue_id, depends_on_id, dep_type_str) = row?;
            let dep_type = DependencyType::from(dep_type_str);
            if dep_type.is_cycle_checked() {
                adjacency.entry(issue_id).or_default().push(depends_on_id);
            }
        }

        let mut cycles: Vec<Vec<String>> = Vec::new();
        let mut seen_cycles: HashSet<Vec<String>> = HashSet::new();

        let nodes: Vec<String> = adjacency.keys().cloned().collect();
        for start in &nodes {
            let mut path = vec![start.clone()];
            let mut on_path: HashSet<String> = HashSet::from([start.clone()]);
            find_cycles_from(
                start,
                start,
                &adjacency,
                &mut path,
                &mut on_path,
                &mut cycles,
                &mut seen_cycles,
            );
        }

        Ok(cycles)
    }

    /// Returns the decision point attached to a `decision`-type issue.
    pub fn get_decision_point_impl(&self, id: &str) -> Result<Option<DecisionPoint>> {
        let issue = self.get_issue_impl(id)?;
        Ok(issue.decision)
    }

    /// Saves an opaque named payload.
    pub fn save_resource_impl(&self, kind: &str, name: &str, payload: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO resources (kind, name, payload, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, name) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
            rusqlite::params![kind, name, payload, now],
        )?;
        Ok(())
    }

    /// Retrieves a saved resource payload.
    pub fn get_resource_impl(&self, kind: &str, name: &str) -> Result<String> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT payload FROM resources WHERE kind = ?1 AND name = ?2",
            rusqlite::params![kind, name],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StorageError::not_found("resource", format!("{kind}/{name}"))
            }
            other => StorageError::Query(other),
        })
    }

    /// Lists the names of all resources of a given kind.
    pub fn list_resources_impl(&self, kind: &str) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM resources WHERE kind = ?1 ORDER BY name")?;
        let rows = stmt.query_map(rusqlite::params![kind], |row| row.get(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Returns aggregate statistics.
    pub fn get_statistics_impl(&self) -> Result<Statistics> {
        let conn = self.lock_conn()?;
        let mut stats = Statistics::default();

        stats.total_issues = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        stats.open_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'open'",
            [],
            |row| row.get(0),
        )?;
        stats.closed_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'closed'",
            [],
            |row| row.get(0),
        )?;
        stats.in_progress_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'in_progress'",
            [],
            |row| row.get(0),
        )?;
        stats.blocked_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'blocked'",
            [],
            |row| row.get(0),
        )?;
        stats.deferred_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE defer_until IS NOT NULL AND status != 'closed'",
            [],
            |row| row.get(0),
        )?;

        {
            let mut stmt = conn.prepare(
                "SELECT issue_type, COUNT(*) FROM issues GROUP BY issue_type ORDER BY COUNT(*) DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.by_type.push(row?);
            }
        }

        {
            let mut stmt = conn.prepare(
                "SELECT priority, COUNT(*) FROM issues GROUP BY priority ORDER BY priority ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.by_priority.push(row?);
            }
        }

        {
            let mut stmt = conn.prepare(
                "SELECT COALESCE(NULLIF(assignee, ''), '(unassigned)'), COUNT(*)
                 FROM issues
                 WHERE status != 'closed'
                 GROUP BY assignee
                 ORDER BY COUNT(*) DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.by_assignee.push(row?);
            }
        }

        Ok(stats)
    }
}

/// DFS helper for [`SqliteStore::detect_cycles_impl`].
///
/// Walks from `current` looking for a path back to `start`. Any such path is
/// recorded once, keyed by its rotation-independent canonical form so the
/// same cycle isn't reported from each of its member nodes.
fn find_cycles_from(
    start: &str,
    current: &str,
    adjacency: &HashMap<String, Vec<String>>,
    path: &mut Vec<String>,
    on_path: &mut HashSet<String>,
    cycles: &mut Vec<Vec<String>>,
    seen_cycles: &mut HashSet<Vec<String>>,
) {
    let Some(neighbors) = adjacency.get(current) else {
        return;
    };
    for next in neighbors {
        if next == start && path.len() > 1 {
            let canonical = canonicalize_cycle(path);
            if seen_cycles.insert(canonical.clone()) {
                cycles.push(path.clone());
            }
        } else if !on_path.contains(next) {
            path.push(next.clone());
            on_path.insert(next.clone());
            find_cycles_from(start, next, adjacency, path, on_path, cycles, seen_cycles);
            path.pop();
            on_path.remove(next);
        }
    }
}

/// Rotates a cycle so it starts at its lexicographically smallest node, to
/// deduplicate cycles discovered from different starting points.
fn canonicalize_cycle(path: &[String]) -> Vec<String> {
    let min_idx = path
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| v.as_str())
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = path[min_idx..].to_vec();
    rotated.extend_from_slice(&path[..min_idx]);
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::dependency::Dependency;
    use beads_core::enums::{DependencyType, Status};
    use beads_core::issue::IssueBuilder;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn get_ready_work_excludes_blocked() {
        let store = test_store();
        let blocker = IssueBuilder::new("Blocker")
            .id("bd-blk1")
            .status(Status::Open)
            .build();
        let blocked = IssueBuilder::new("Blocked")
            .id("bd-blk2")
            .status(Status::Open)
            .build();
        let ready = IssueBuilder::new("Ready")
            .id("bd-rdy1")
            .status(Status::Open)
            .build();

        store.create_issue_impl(&blocker, "alice").unwrap();
        store.create_issue_impl(&blocked, "alice").unwrap();
        store.create_issue_impl(&ready, "alice").unwrap();

        let dep = Dependency {
            issue_id: "bd-blk2".into(),
            depends_on_id: "bd-blk1".into(),
            dep_type: DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: "alice".into(),
            metadata: String::new(),
        };
        store.add_dependency_impl(&dep, "alice").unwrap();

        let work = store.get_ready_work_impl(&WorkFilter::default()).unwrap();
        let ids: Vec<&str> = work.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"bd-blk1"));
        assert!(ids.contains(&"bd-rdy1"));
        assert!(!ids.contains(&"bd-blk2"));
    }

    #[test]
    fn is_blocked_true_when_open_blocker() {
        let store = test_store();
        let blocker = IssueBuilder::new("Blocker").id("bd-ib1").build();
        let blocked = IssueBuilder::new("Blocked").id("bd-ib2").build();
        store.create_issue_impl(&blocker, "alice").unwrap();
        store.create_issue_impl(&blocked, "alice").unwrap();

        let dep = Dependency {
            issue_id: "bd-ib2".into(),
            depends_on_id: "bd-ib1".into(),
            dep_type: DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: "alice".into(),
            metadata: String::new(),
        };
        store.add_dependency_impl(&dep, "alice").unwrap();

        assert!(store.is_blocked_impl("bd-ib2").unwrap());
        assert!(!store.is_blocked_impl("bd-ib1").unwrap());
    }

    #[test]
    fn detect_cycles_finds_simple_cycle() {
        let store = test_store();
        for id in ["bd-cyc1", "bd-cyc2", "bd-cyc3"] {
            let issue = IssueBuilder::new(id).id(id).build();
            store.create_issue_impl(&issue, "alice").unwrap();
        }
        // cyc1 -> cyc2 -> cyc3 -> cyc1
        for (from, to) in [
            ("bd-cyc1", "bd-cyc2"),
            ("bd-cyc2", "bd-cyc3"),
            ("bd-cyc3", "bd-cyc1"),
        ] {
            let dep = Dependency {
                issue_id: from.into(),
                depends_on_id: to.into(),
                dep_type: DependencyType::Blocks,
                created_at: Utc::now(),
                created_by: "alice".into(),
                metadata: String::new(),
            };
            store.add_dependency_impl(&dep, "alice").unwrap();
        }

        let cycles = store.detect_cycles_impl().unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn detect_cycles_empty_when_acyclic() {
        let store = test_store();
        let a = IssueBuilder::new("A").id("bd-ac1").build();
        let b = IssueBuilder::new("B").id("bd-ac2").build();
        store.create_issue_impl(&a, "alice").unwrap();
        store.create_issue_impl(&b, "alice").unwrap();

        let dep = Dependency {
            issue_id: "bd-ac1".into(),
            depends_on_id: "bd-ac2".into(),
            dep_type: DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: "alice".into(),
            metadata: String::new(),
        };
        store.add_dependency_impl(&dep, "alice").unwrap();

        assert!(store.detect_cycles_impl().unwrap().is_empty());
    }

    #[test]
    fn resources_roundtrip() {
        let store = test_store();
        store
            .save_resource_impl("route", "primary", "{\"hops\":3}")
            .unwrap();
        let payload = store.get_resource_impl("route", "primary").unwrap();
        assert_eq!(payload, "{\"hops\":3}");
        let names = store.list_resources_impl("route").unwrap();
        assert_eq!(names, vec!["primary".to_string()]);
    }

    #[test]
    fn get_statistics() {
        let store = test_store();
        let issue1 = IssueBuilder::new("Open").id("bd-st1").status(Status::Open).build();
        let issue2 = IssueBuilder::new("Closed")
            .id("bd-st2")
            .status(Status::Closed)
            .closed_at(Utc::now())
            .close_reason("done")
            .build();
        store.create_issue_impl(&issue1, "alice").unwrap();
        store.create_issue_impl(&issue2, "alice").unwrap();

        let stats = store.get_statistics_impl().unwrap();
        assert_eq!(stats.total_issues, 2);
        assert_eq!(stats.open_issues, 1);
        assert_eq!(stats.closed_issues, 1);
    }
}
