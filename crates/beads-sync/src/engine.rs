//! Export (Store -> replica) and Import (replica -> Store) engine.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use beads_core::dependency::Dependency;
use beads_core::enums::Status;
use beads_core::filter::IssueFilter;
use beads_storage::Storage;

use crate::deletion::{load_manifest, DeletionRecord};
use crate::error::{Result, SyncError};
use crate::replica::{read_replica, write_replica, ReplicaRecord};

const MAX_BUSY_RETRIES: u32 = 8;
const BUSY_RETRY_BASE: Duration = Duration::from_millis(10);

/// Counts produced by a successful export.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportStats {
    pub written: usize,
    pub skipped_dirty_check: bool,
}

/// Counts produced by a successful import, matching SPEC_FULL's Importer
/// contract so the CLI/daemon import path and the Sync Engine's import path
/// report the same shape.
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub purged: usize,
    pub purged_ids: Vec<String>,
    pub warnings: Vec<String>,
}

/// Exports every non-tombstone issue (with its dependencies and labels) to
/// `replica_path`, holding the replica lock for the duration. `dirty` should
/// be `false` when nothing has changed since the last successful export, in
/// which case this is a no-op.
pub fn export_store(
    store: &dyn Storage,
    replica_path: &Path,
    lock_path: &Path,
    timeout: Duration,
    dirty: bool,
) -> Result<ExportStats> {
    if !dirty {
        return Ok(ExportStats {
            written: 0,
            skipped_dirty_check: true,
        });
    }

    let _lock = beads_lockfile::FileLock::acquire_exclusive(lock_path, timeout)?;

    let filter = IssueFilter {
        exclude_status: vec![Status::Tombstone],
        ..Default::default()
    };
    let issues = store.search_issues("", &filter)?;

    let mut records = Vec::with_capacity(issues.len());
    for issue in issues {
        let dependencies = store.get_dependency_records(&issue.id)?;
        let labels = store.get_labels(&issue.id)?;
        records.push(ReplicaRecord {
            issue,
            dependencies,
            labels,
        });
    }
    let written = records.len();

    let tmp_path = sibling_tmp_path(replica_path);
    {
        let mut tmp_file = File::create(&tmp_path)?;
        write_replica(&mut tmp_file, records)?;
        tmp_file.sync_all()?;
    }
    fs::rename(&tmp_path, replica_path)?;

    Ok(ExportStats {
        written,
        skipped_dirty_check: false,
    })
}

/// Imports the replica and deletion manifest into `store`. `since` is the
/// last import watermark: if both files are no newer than it, the import is
/// skipped entirely (returns default stats).
pub fn import_store(
    store: &dyn Storage,
    replica_path: &Path,
    manifest_path: &Path,
    lock_path: &Path,
    timeout: Duration,
    since: Option<SystemTime>,
) -> Result<ImportStats> {
    if let Some(since) = since {
        let replica_fresh = file_newer_than(replica_path, since);
        let manifest_fresh = file_newer_than(manifest_path, since);
        if !replica_fresh && !manifest_fresh {
            return Ok(ImportStats::default());
        }
    }

    let _lock = beads_lockfile::FileLock::acquire_exclusive(lock_path, timeout)?;

    let mut stats = ImportStats::default();

    let manifest = match File::open(manifest_path) {
        Ok(f) => load_manifest(BufReader::new(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Default::default(),
        Err(e) => return Err(SyncError::Io(e)),
    };
    stats.warnings.extend(manifest.warnings.clone());

    let records = match File::open(replica_path) {
        Ok(f) => read_replica(BufReader::new(f), |line, msg| {
            stats.warnings.push(format!("line {line}: {msg}"));
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(SyncError::Io(e)),
    };

    // Deletion manifest wins regardless of local state.
    purge_deleted(store, &manifest.records, &mut stats)?;

    let purged_ids: std::collections::HashSet<&str> =
        manifest.records.iter().map(|r| r.id.as_str()).collect();

    for record in &records {
        if purged_ids.contains(record.issue.id.as_str()) {
            // Deletion overrides any record with the same id.
            continue;
        }
        apply_record(store, record, &mut stats)?;
    }

    Ok(stats)
}

fn purge_deleted(
    store: &dyn Storage,
    deletions: &[DeletionRecord],
    stats: &mut ImportStats,
) -> Result<()> {
    for deletion in deletions {
        match retry_busy(|| store.delete_issue(&deletion.id)) {
            Ok(()) => {
                stats.purged += 1;
                stats.purged_ids.push(deletion.id.clone());
            }
            Err(SyncError::Storage(e)) if e.is_not_found() => {
                // Already absent locally; idempotent.
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn apply_record(store: &dyn Storage, record: &ReplicaRecord, stats: &mut ImportStats) -> Result<()> {
    match store.get_issue(&record.issue.id) {
        Ok(local) => {
            if record.issue.updated_at > local.updated_at {
                let updates = beads_storage::IssueUpdates {
                    title: Some(record.issue.title.clone()),
                    description: Some(record.issue.description.clone()),
                    status: Some(record.issue.status.clone()),
                    priority: Some(record.issue.priority),
                    ..Default::default()
                };
                store.update_issue(&record.issue.id, &updates, "sync")?;
                reconcile_edges(store, record)?;
                stats.updated += 1;
            } else {
                stats.skipped += 1;
            }
        }
        Err(e) if e.is_not_found() => {
            retry_busy(|| store.create_issue(&record.issue, "sync"))?;
            reconcile_edges(store, record)?;
            stats.created += 1;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Reconciles dependency/label edges to the replica's record. Stale local
/// edges not present in the record are removed; missing ones are added.
fn reconcile_edges(store: &dyn Storage, record: &ReplicaRecord) -> Result<()> {
    let local_deps = store.get_dependency_records(&record.issue.id)?;
    let remote_deps: &[Dependency] = &record.dependencies;

    for local in &local_deps {
        let still_present = remote_deps
            .iter()
            .any(|r| r.depends_on_id == local.depends_on_id && r.dep_type == local.dep_type);
        if !still_present {
            store.remove_dependency(&record.issue.id, &local.depends_on_id, "sync")?;
        }
    }
    for remote in remote_deps {
        let already_present = local_deps
            .iter()
            .any(|l| l.depends_on_id == remote.depends_on_id && l.dep_type == remote.dep_type);
        if !already_present {
            store.add_dependency(remote, "sync")?;
        }
    }

    let local_labels = store.get_labels(&record.issue.id)?;
    for label in &local_labels {
        if !record.labels.contains(label) {
            store.remove_label(&record.issue.id, label, "sync")?;
        }
    }
    for label in &record.labels {
        if !local_labels.contains(label) {
            store.add_label(&record.issue.id, label, "sync")?;
        }
    }

    Ok(())
}

fn retry_busy<T>(mut op: impl FnMut() -> beads_storage::error::Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt < MAX_BUSY_RETRIES => {
                attempt += 1;
                std::thread::sleep(BUSY_RETRY_BASE * attempt);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = tmp
        .file_name()
        .map(|n| format!(".{}.tmp", n.to_string_lossy()))
        .unwrap_or_else(|| ".replica.tmp".to_string());
    tmp.set_file_name(file_name);
    tmp
}

fn file_newer_than(path: &Path, since: SystemTime) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|mtime| mtime > since)
        .unwrap_or(true)
}
