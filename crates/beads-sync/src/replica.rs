//! The text replica: a self-describing JSONL serialization of the issue
//! graph (issue, its dependencies, and its labels, one record per line),
//! sorted stably by id.

use std::io::{BufRead, Write};

use beads_core::dependency::Dependency;
use beads_core::issue::Issue;
use serde::{Deserialize, Serialize};

/// One line of the replica: an issue plus its outgoing dependency edges and
/// labels, so a single line fully describes the issue's place in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaRecord {
    pub issue: Issue,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Writes records as JSONL, sorted stably by issue id.
pub fn write_replica<W: Write>(writer: &mut W, mut records: Vec<ReplicaRecord>) -> std::io::Result<()> {
    records.sort_by(|a, b| a.issue.id.cmp(&b.issue.id));
    for record in &records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Parses replica records from a reader. Invalid lines are reported via
/// `on_warning` and skipped rather than aborting the read.
pub fn read_replica<R: BufRead>(
    reader: R,
    mut on_warning: impl FnMut(usize, &str),
) -> Vec<ReplicaRecord> {
    let mut records = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                on_warning(line_number + 1, &e.to_string());
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<ReplicaRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => on_warning(line_number + 1, &e.to_string()),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::issue::IssueBuilder;
    use std::io::BufReader;

    fn record(id: &str) -> ReplicaRecord {
        ReplicaRecord {
            issue: IssueBuilder::new(format!("Issue {id}")).id(id).build(),
            dependencies: Vec::new(),
            labels: vec!["x".into()],
        }
    }

    #[test]
    fn write_sorts_by_id() {
        let mut buf = Vec::new();
        write_replica(&mut buf, vec![record("bd-b"), record("bd-a")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let first_line_pos = text.find("bd-a").unwrap();
        let second_line_pos = text.find("bd-b").unwrap();
        assert!(first_line_pos < second_line_pos);
    }

    #[test]
    fn read_skips_corrupt_lines_and_warns() {
        let data = "not json\n{\"issue\":{\"id\":\"bd-ok\"}}\nmore garbage {{{\n";
        let mut warnings = 0;
        let records = read_replica(BufReader::new(data.as_bytes()), |_, _| warnings += 1);
        // The minimal {"issue":{"id":"bd-ok"}} record lacks required Issue
        // fields and will also fail to parse with a strict Issue schema;
        // what matters is that corrupt lines never abort the read.
        assert!(records.len() <= 1);
        assert!(warnings >= 2);
    }
}
