//! The append-only deletion manifest (`deletions.jsonl`).

use std::collections::HashMap;
use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hard-delete record propagated across clones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionRecord {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub by: String,
    pub reason: String,
}

/// Result of loading a manifest: the coalesced records (last write per id
/// wins, keyed by timestamp) plus counts of skipped/warned lines.
#[derive(Debug, Default)]
pub struct LoadedManifest {
    pub records: Vec<DeletionRecord>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

/// Appends one deletion record to the manifest.
pub fn append_deletion<W: Write>(writer: &mut W, record: &DeletionRecord) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Loads a manifest, coalescing duplicate ids (the entry with the latest
/// `ts` wins) and counting malformed lines as warnings, never fatal.
pub fn load_manifest<R: BufRead>(reader: R) -> LoadedManifest {
    let mut by_id: HashMap<String, DeletionRecord> = HashMap::new();
    let mut skipped = 0;
    let mut warnings = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                skipped += 1;
                warnings.push(format!("line {}: {e}", line_number + 1));
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<DeletionRecord>(trimmed) {
            Ok(record) => {
                by_id
                    .entry(record.id.clone())
                    .and_modify(|existing| {
                        if record.ts > existing.ts {
                            *existing = record.clone();
                        }
                    })
                    .or_insert(record);
            }
            Err(e) => {
                skipped += 1;
                warnings.push(format!("line {}: {e}", line_number + 1));
            }
        }
    }

    let mut records: Vec<DeletionRecord> = by_id.into_values().collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));

    LoadedManifest {
        records,
        skipped,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn rec(id: &str, ts_secs: i64) -> DeletionRecord {
        DeletionRecord {
            id: id.into(),
            ts: DateTime::from_timestamp(ts_secs, 0).unwrap(),
            by: "alice".into(),
            reason: "cleanup".into(),
        }
    }

    #[test]
    fn duplicate_ids_coalesce_to_latest() {
        let mut buf = Vec::new();
        append_deletion(&mut buf, &rec("bd-abc", 100)).unwrap();
        append_deletion(&mut buf, &rec("bd-abc", 200)).unwrap();

        let loaded = load_manifest(BufReader::new(buf.as_slice()));
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].ts.timestamp(), 200);
    }

    #[test]
    fn corrupt_lines_are_warnings_not_fatal() {
        let data = b"this is not valid json\n{\"broken\n{\"id\":\"bd-abc\",\"ts\":\"2024-01-01T00:00:00Z\",\"by\":\"u\",\"reason\":\"r\"}\nmore garbage {{{\n";
        let loaded = load_manifest(BufReader::new(data.as_slice()));
        assert_eq!(loaded.skipped, 3);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].id, "bd-abc");
        assert_eq!(loaded.warnings.len(), 3);
    }
}
