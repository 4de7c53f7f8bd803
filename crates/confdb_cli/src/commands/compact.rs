//! Compact command implementation.

use confdb_core::{Config, Database};
use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compacting journal at {:?}", path);
    println!();

    let db = Database::open_with_config(path, Config::default().create_if_missing(false))?;
    let stats = db.compact()?;

    println!("Buckets:     {}", stats.buckets);
    println!("Records:     {}", stats.records);
    println!("Sequence:    {}", stats.sequence.as_u64());
    println!("Size before: {} bytes", stats.bytes_before);
    println!("Size after:  {} bytes", stats.bytes_after);
    println!(
        "Space saved: {} bytes ({:.1}%)",
        stats.bytes_before.saturating_sub(stats.bytes_after),
        if stats.bytes_before > 0 {
            (stats.bytes_before.saturating_sub(stats.bytes_after)) as f64
                / stats.bytes_before as f64
                * 100.0
        } else {
            0.0
        }
    );
    println!();
    println!("✓ Compaction complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use confdb_core::{ProjectId, RetrieveQueryParams};
    use confdb_testkit::{integration, TestDatabase};

    #[test]
    fn compacts_file_in_place() {
        let db = TestDatabase::file();
        let project = ProjectId::new(1);
        for n in 0..4 {
            let hook = db
                .create_integration(integration(project, &format!("hook-{n}")))
                .unwrap();
            db.delete_integration(project, hook.id).unwrap();
        }
        let path = db.path().unwrap().to_path_buf();
        let before = std::fs::metadata(&path).unwrap().len();
        let _dir = db.close();

        run(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() < before);

        let db = Database::open(&path).unwrap();
        assert!(db
            .get_integrations(project, &RetrieveQueryParams::new())
            .unwrap()
            .is_empty());
        assert_eq!(db.create_integration(integration(project, "next")).unwrap().id, 5);
    }

    #[test]
    fn missing_database_is_an_error() {
        let db = TestDatabase::file();
        let dir = db.close();
        assert!(run(&dir.path().join("absent.journal")).is_err());
    }
}
