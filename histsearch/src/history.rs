//! History file loading (JSON lines, one `RowItem` per line)
//!
//! Bad rows never abort a load: unparseable lines and rows with a malformed
//! time are logged and skipped, deleted rows are dropped. Only I/O failures
//! are returned as errors.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Record, RowItem};

pub fn parse_jsonl(reader: impl BufRead) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: RowItem = match serde_json::from_str(line) {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping unparseable history line");
                skipped += 1;
                continue;
            }
        };
        if row.deleted {
            continue;
        }
        match Record::from_row(&row) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping history record");
                skipped += 1;
            }
        }
    }
    debug!(record_count = records.len(), skipped, "parsed history");
    Ok(records)
}

pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let file = File::open(path.as_ref())?;
    parse_jsonl(BufReader::new(file))
}

/// Demo corpus: `kubectl get pod0` .. `kubectl get pod{count-1}`.
pub fn demo_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| Record::catalogued(i as i64, format!("kubectl get pod{}", i), 0.0))
        .collect()
}
