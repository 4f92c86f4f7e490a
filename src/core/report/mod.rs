use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::error::HarnessError;

static RUN_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Verdict of a stress run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
}

/// One stress run, written as a single NDJSON line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: u64,
    pub producers: usize,
    pub items_per_producer: usize,
    pub expected: usize,
    pub received: usize,
    pub duplicates: usize,
    pub missing: usize,
    /// Items that overtook an earlier item from the same producer.
    pub out_of_order: usize,
    pub elapsed_ms: u64,
    pub outcome: Outcome,
}

impl RunRecord {
    pub(crate) fn next_run_id() -> u64 {
        RUN_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
    }
}

impl Display for RunRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run {}: {:?} ({} producers x {} items, received {}/{}, duplicates {}, missing {}, out of order {}, {} ms)",
            self.run_id,
            self.outcome,
            self.producers,
            self.items_per_producer,
            self.received,
            self.expected,
            self.duplicates,
            self.missing,
            self.out_of_order,
            self.elapsed_ms,
        )
    }
}

/// Append records to `path`, one JSON object per line.
pub fn append_records(records: &[RunRecord], path: &Path) -> Result<(), HarnessError> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;

    for record in records {
        let json = serde_json::to_string(record)?;
        writeln!(file, "{json}")?;
    }
    Ok(())
}

/// Read back every record of an NDJSON report. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<RunRecord>, HarnessError> {
    let file = std::fs::File::open(path)?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
