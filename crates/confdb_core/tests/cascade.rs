//! Integration deletion cascades.
//!
//! Deleting an integration removes its matchers, extract values and alias
//! in the same transaction as the integration itself. If any of those
//! deletes, or the commit, fails, nothing is deleted and the caller gets
//! the error; a retry then removes everything.

use confdb_core::{
    CoreError, IntegrationAlias, IntegrationExtractValue, IntegrationRef, ProjectId,
    RetrieveQueryParams,
};
use confdb_testkit::prelude::*;

const P1: ProjectId = ProjectId::new(1);

struct Seeded {
    db: TestDatabase,
    hook: u64,
    other: u64,
}

fn seed(db: TestDatabase) -> Seeded {
    let hook = db.create_integration(integration(P1, "deploy")).unwrap().id;
    let other = db.create_integration(integration(P1, "other")).unwrap().id;

    db.create_integration_matcher(P1, matcher(hook, "push")).unwrap();
    db.create_integration_matcher(P1, matcher(other, "keep")).unwrap();
    db.create_integration_matcher(P1, matcher(hook, "tag")).unwrap();
    db.create_integration_extract_value(
        P1,
        IntegrationExtractValue {
            integration_id: hook,
            name: "branch".to_string(),
            key: "ref".to_string(),
            variable: "BRANCH".to_string(),
            ..IntegrationExtractValue::default()
        },
    )
    .unwrap();
    db.create_integration_alias(IntegrationAlias::new(
        P1,
        IntegrationRef::Specific(hook),
        "deploy",
    ))
    .unwrap();

    Seeded { db, hook, other }
}

fn matcher_count(db: &TestDatabase, integration_id: u64) -> usize {
    db.get_integration_matchers(P1, integration_id, &RetrieveQueryParams::new())
        .unwrap()
        .len()
}

#[test]
fn delete_integration_removes_children_and_alias() {
    let Seeded { db, hook, other } = seed(TestDatabase::memory());
    assert_eq!(matcher_count(&db, hook), 2);

    db.delete_integration(P1, hook).unwrap();

    assert!(db.get_integration(P1, hook).unwrap_err().is_not_found());
    assert_eq!(matcher_count(&db, hook), 0);
    assert!(db.get_integration_refs(P1, hook).unwrap().is_empty());
    assert!(db.get_integration_alias_by_alias("deploy").unwrap_err().is_not_found());
    assert!(db
        .get_integration_alias(P1, IntegrationRef::Specific(hook))
        .unwrap_err()
        .is_not_found());

    // Siblings are untouched.
    assert_eq!(matcher_count(&db, other), 1);
}

#[test]
fn failed_cascade_commit_deletes_nothing() {
    let Seeded { db, hook, .. } = seed(TestDatabase::faulty(test_config()));

    db.faults().fail_next_append();
    let err = db.delete_integration(P1, hook).unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));

    assert!(db.get_integration(P1, hook).is_ok());
    assert_eq!(matcher_count(&db, hook), 2);
    assert_eq!(db.get_integration_refs(P1, hook).unwrap().extract_values.len(), 1);
    assert!(db.get_integration_alias_by_alias("deploy").is_ok());

    db.delete_integration(P1, hook).unwrap();
    assert_eq!(matcher_count(&db, hook), 0);
    assert!(db.get_integration_alias_by_alias("deploy").unwrap_err().is_not_found());
}

#[test]
fn failed_flush_deletes_nothing() {
    let Seeded { db, hook, .. } = seed(TestDatabase::faulty(test_config()));

    db.faults().fail_next_flush();
    assert!(db.delete_integration(P1, hook).is_err());
    assert_eq!(matcher_count(&db, hook), 2);

    db.delete_integration(P1, hook).unwrap();
    assert_eq!(matcher_count(&db, hook), 0);
}

#[test]
fn cascade_survives_reopen() {
    let Seeded { db, hook, other } = seed(TestDatabase::file());
    db.delete_integration(P1, hook).unwrap();

    let db = db.reopen();
    assert_eq!(matcher_count(&db, hook), 0);
    assert_eq!(matcher_count(&db, other), 1);
    assert!(db.get_integration_alias_by_alias("deploy").unwrap_err().is_not_found());
}

#[test]
fn deleting_missing_integration_is_not_found() {
    let db = TestDatabase::memory();
    assert!(db.delete_integration(P1, 9).unwrap_err().is_not_found());
}
