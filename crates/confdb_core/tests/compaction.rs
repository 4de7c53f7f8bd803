//! Journal compaction.

use confdb_core::{CoreError, IntegrationAlias, IntegrationRef, ProjectId, RetrieveQueryParams};
use confdb_testkit::prelude::*;

const P1: ProjectId = ProjectId::new(1);
const P2: ProjectId = ProjectId::new(2);

fn names(db: &TestDatabase, project: ProjectId) -> Vec<String> {
    db.get_integrations(project, &RetrieveQueryParams::new())
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect()
}

#[test]
fn compaction_shrinks_journal_and_keeps_state() {
    let db = TestDatabase::file();
    for n in 0..6 {
        db.create_integration(integration(P1, &format!("hook-{n}"))).unwrap();
    }
    db.create_integration(integration(P2, "other")).unwrap();
    for id in [2, 4, 6] {
        db.delete_integration(P1, id).unwrap();
    }
    let mut alias = db
        .create_integration_alias(IntegrationAlias::new(P1, IntegrationRef::Specific(1), "a"))
        .unwrap();
    alias.alias = "b".to_string();
    db.update_integration_alias(&alias).unwrap();

    let sequence = db.engine().committed_sequence();
    let stats = db.compact().unwrap();
    assert_eq!(stats.sequence, sequence);
    assert!(stats.bytes_after < stats.bytes_before);
    assert_eq!(db.engine().journal_size().unwrap(), stats.bytes_after);

    let path = db.path().unwrap().to_path_buf();
    assert!(!path.with_extension("compact").exists());

    let db = db.reopen();
    assert_eq!(names(&db, P1), vec!["hook-0", "hook-2", "hook-4"]);
    assert_eq!(names(&db, P2), vec!["other"]);
    assert_eq!(db.get_integration_alias_by_alias("b").unwrap(), alias);
    assert!(db.get_integration_alias_by_alias("a").unwrap_err().is_not_found());
    assert_eq!(db.engine().committed_sequence(), sequence);

    // Deleted ids stay retired.
    assert_eq!(db.create_integration(integration(P1, "after")).unwrap().id, 7);
}

#[test]
fn writes_after_compaction_survive_reopen() {
    let db = TestDatabase::file();
    let hook = db.create_integration(integration(P1, "deploy")).unwrap();
    db.compact().unwrap();

    db.create_integration_matcher(P1, matcher(hook.id, "push")).unwrap();
    let db = db.reopen();
    assert_eq!(
        db.get_integration_matchers(P1, hook.id, &RetrieveQueryParams::new())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn compacting_empty_database_leaves_empty_journal() {
    let db = TestDatabase::file();
    let stats = db.compact().unwrap();
    assert_eq!(stats.bytes_after, 0);

    let db = db.reopen();
    assert_eq!(db.create_integration(integration(P1, "first")).unwrap().id, 1);
}

#[test]
fn in_memory_database_compacts() {
    let db = TestDatabase::memory();
    let hook = db.create_integration(integration(P1, "deploy")).unwrap();
    db.delete_integration(P1, hook.id).unwrap();

    db.compact().unwrap();
    assert!(names(&db, P1).is_empty());
    assert_eq!(db.create_integration(integration(P1, "next")).unwrap().id, 2);
}

#[test]
fn custom_backend_cannot_compact() {
    let db = TestDatabase::faulty(test_config());
    let err = db.compact().unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation { .. }));
}
