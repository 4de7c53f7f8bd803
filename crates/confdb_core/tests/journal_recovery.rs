//! Journal replay and recovery tests.

use confdb_core::{Config, CoreError, Database, ProjectId, RetrieveQueryParams};
use confdb_storage::{FileBackend, StorageError};
use confdb_testkit::prelude::*;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

const P1: ProjectId = ProjectId::new(1);

#[test]
fn committed_records_survive_reopen() {
    let db = TestDatabase::file();
    let hook = db.create_integration(integration(P1, "deploy")).unwrap();
    db.create_integration_matcher(P1, matcher(hook.id, "push")).unwrap();
    let sequence = db.engine().committed_sequence();

    let db = db.reopen();
    assert_eq!(db.engine().committed_sequence(), sequence);
    assert_eq!(db.get_integration(P1, hook.id).unwrap(), hook);
    assert_eq!(
        db.get_integration_matchers(P1, hook.id, &RetrieveQueryParams::new())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn torn_tail_is_trimmed() {
    let db = TestDatabase::file();
    let hook = db.create_integration(integration(P1, "deploy")).unwrap();
    let path = db.path().unwrap().to_path_buf();
    let size = db.engine().journal_size().unwrap();
    let config = db.config().clone();
    let _dir = db.close();

    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"CFDB\x01\x00\xff\x00\x00\x00partial").unwrap();
    }

    let db = Database::open_with_config(&path, config).unwrap();
    assert_eq!(db.engine().journal_size().unwrap(), size);
    assert_eq!(db.get_integration(P1, hook.id).unwrap(), hook);

    let next = db.create_integration(integration(P1, "next")).unwrap();
    assert_eq!(next.id, hook.id + 1);
}

#[test]
fn checksum_mismatch_is_corruption() {
    let db = TestDatabase::file();
    db.create_integration(integration(P1, "first")).unwrap();
    db.create_integration(integration(P1, "second")).unwrap();
    let path = db.path().unwrap().to_path_buf();
    let _dir = db.close();

    {
        let mut file = OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(12)).unwrap();
        file.write_all(&[0xff]).unwrap();
    }

    let err = Database::open_with_config(&path, test_config()).unwrap_err();
    assert!(matches!(err, CoreError::JournalCorruption { offset: 0, .. }), "{err}");
}

#[test]
fn second_handle_is_locked_out() {
    let db = TestDatabase::file();
    let path = db.path().unwrap().to_path_buf();

    let err = Database::open_with_config(&path, test_config()).unwrap_err();
    assert!(matches!(err, CoreError::Storage(StorageError::Locked { .. })), "{err}");
}

#[test]
fn missing_file_is_not_created_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("confdb.journal");

    let err = Database::open_with_config(&path, Config::default().create_if_missing(false))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidFormat { .. }));

    let db = Database::open_with_config(&path, test_config()).unwrap();
    assert!(path.exists());
    assert_eq!(db.path(), Some(path.as_path()));
}

#[test]
fn unrolled_back_commit_blocks_writes_until_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("confdb.journal");
    let backend = FaultyBackend::new(Box::new(FileBackend::open(&path).unwrap()));
    let faults = backend.handle();
    let db = Database::open_with_backend(Box::new(backend), test_config()).unwrap();
    db.create_integration(integration(P1, "first")).unwrap();

    // The frame reaches the file, the flush fails and so does the rollback.
    faults.fail_next_flush();
    faults.fail_next_truncate();
    let err = db.create_integration(integration(P1, "second")).unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)), "{err}");
    assert!(db.engine().is_poisoned());

    let err = db.create_integration(integration(P1, "third")).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation { .. }), "{err}");
    assert_eq!(
        db.get_integrations(P1, &RetrieveQueryParams::new()).unwrap().len(),
        1
    );
    drop(db);

    // The stray frame is a well-formed commit of its own, so the journal
    // still replays and later commits get fresh sequence numbers.
    let db = Database::open_with_config(&path, test_config()).unwrap();
    let ids: Vec<u64> = db
        .get_integrations(P1, &RetrieveQueryParams::new())
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(db.create_integration(integration(P1, "fourth")).unwrap().id, 3);
}

#[test]
fn read_only_open_leaves_torn_tail_in_place() {
    let db = TestDatabase::file();
    let hook = db.create_integration(integration(P1, "deploy")).unwrap();
    let path = db.path().unwrap().to_path_buf();
    let _dir = db.close();

    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"CFDB\x01\x00\xff\x00\x00\x00partial").unwrap();
    }
    let size = std::fs::metadata(&path).unwrap().len();

    let db = Database::open_read_only(&path).unwrap();
    assert_eq!(db.engine().torn_tail_bytes(), 17);
    assert_eq!(db.get_integration(P1, hook.id).unwrap(), hook);

    let err = db.create_integration(integration(P1, "next")).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation { .. }), "{err}");
    assert!(db.compact().is_err());
    drop(db);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), size);

    // A writable open trims it.
    let db = Database::open_with_config(&path, test_config()).unwrap();
    assert_eq!(db.engine().journal_size().unwrap(), size - 17);
}

#[test]
fn read_only_open_waits_for_writer() {
    let db = TestDatabase::file();
    let path = db.path().unwrap().to_path_buf();

    let err = Database::open_read_only(&path).unwrap_err();
    assert!(matches!(err, CoreError::Storage(StorageError::Locked { .. })), "{err}");
    let _dir = db.close();

    let reader = Database::open_read_only(&path).unwrap();
    let second = Database::open_read_only(&path).unwrap();
    assert!(reader.engine().is_read_only() && second.engine().is_read_only());
}

#[test]
fn read_only_open_of_missing_file_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("confdb.journal");

    let err = Database::open_read_only(&path).unwrap_err();
    assert!(matches!(err, CoreError::InvalidFormat { .. }));
    assert!(!path.exists());
}
