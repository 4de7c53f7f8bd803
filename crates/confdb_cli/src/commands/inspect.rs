//! Inspect command implementation.

use confdb_core::{parse_bucket_name, CoreResult, Database};
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Journal size in bytes.
    pub journal_size: u64,
    /// Bytes of an incomplete trailing frame, left in place.
    pub torn_tail_bytes: u64,
    /// Sequence of the last commit.
    pub sequence: u64,
    /// Total records over all buckets.
    pub record_count: usize,
    /// Per-bucket statistics.
    pub buckets: Vec<BucketInfo>,
}

/// Statistics for a single bucket.
#[derive(Debug, Serialize)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Table the bucket belongs to, if the name is well-formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Scope of the bucket, if the name is well-formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Number of records.
    pub records: usize,
    /// Auto-increment counter.
    pub sequence: u64,
}

/// Collects statistics from an open database.
pub fn inspect(db: &Database, path: &Path) -> CoreResult<InspectResult> {
    let buckets: Vec<BucketInfo> = db
        .engine()
        .stats()
        .into_iter()
        .map(|stats| {
            let parsed = parse_bucket_name(&stats.name);
            BucketInfo {
                table: parsed.map(|(table, _)| table.to_string()),
                scope: parsed.map(|(_, scope)| scope.to_string()),
                name: stats.name,
                records: stats.records,
                sequence: stats.sequence,
            }
        })
        .collect();

    Ok(InspectResult {
        path: path.display().to_string(),
        journal_size: db.engine().journal_size()?,
        torn_tail_bytes: db.engine().torn_tail_bytes(),
        sequence: db.engine().committed_sequence().as_u64(),
        record_count: buckets.iter().map(|b| b.records).sum(),
        buckets,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No database found at {:?}", path).into());
    }

    let db = super::open_existing(path)?;
    let result = inspect(&db, path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("ConfDB Database: {}", result.path);
    println!("========================================");
    println!();
    println!("Journal:  {} bytes", result.journal_size);
    if result.torn_tail_bytes > 0 {
        println!(
            "Torn tail: {} bytes (trimmed on next writable open)",
            result.torn_tail_bytes
        );
    }
    println!("Sequence: {}", result.sequence);
    println!("Records:  {}", result.record_count);
    println!();

    if result.buckets.is_empty() {
        println!("No buckets.");
        return;
    }

    println!("{:<40} {:>10} {:>10}", "Bucket", "Records", "Counter");
    println!("{:-<40} {:->10} {:->10}", "", "", "");
    for bucket in &result.buckets {
        println!(
            "{:<40} {:>10} {:>10}",
            bucket.name, bucket.records, bucket.sequence
        );
    }
}
