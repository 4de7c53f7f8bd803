//! Object store behavior through the entity facades.

use confdb_core::{
    Integration, ObjectKey, ProjectId, RetrieveQueryParams, Scope, SortDirection,
};
use confdb_testkit::prelude::*;

const P1: ProjectId = ProjectId::new(1);
const P2: ProjectId = ProjectId::new(2);

fn ids(integrations: &[Integration]) -> Vec<u64> {
    integrations.iter().map(|i| i.id).collect()
}

#[test]
fn keys_increase_and_are_never_reused() {
    let db = TestDatabase::file();
    let mut seen = Vec::new();
    for n in 0..5 {
        seen.push(db.create_integration(integration(P1, &format!("h{n}"))).unwrap().id);
    }
    db.delete_integration(P1, seen[4]).unwrap();
    db.delete_integration(P1, seen[1]).unwrap();
    seen.push(db.create_integration(integration(P1, "after-delete")).unwrap().id);

    let db = db.reopen();
    seen.push(db.create_integration(integration(P1, "after-reopen")).unwrap().id);

    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(
        ids(&db.get_integrations(P1, &RetrieveQueryParams::new()).unwrap()),
        vec![1, 3, 4, 6, 7]
    );
}

#[test]
fn projects_are_isolated() {
    let db = TestDatabase::memory();
    let own = db.create_integration(integration(P1, "mine")).unwrap();

    assert!(db.get_integration(P2, own.id).unwrap_err().is_not_found());
    assert!(db
        .get_integrations(P2, &RetrieveQueryParams::new())
        .unwrap()
        .is_empty());
    assert!(db.delete_integration(P2, own.id).unwrap_err().is_not_found());

    // Same id, other project: a separate record.
    let theirs = db.create_integration(integration(P2, "theirs")).unwrap();
    assert_eq!(theirs.id, own.id);
    assert_eq!(db.get_integration(P1, own.id).unwrap().name, "mine");
    assert_eq!(db.get_integration(P2, own.id).unwrap().name, "theirs");
}

#[test]
fn empty_lists_are_empty_not_errors() {
    let db = TestDatabase::memory();
    let params = RetrieveQueryParams::new();

    assert!(db.get_integrations(P1, &params).unwrap().is_empty());
    assert!(db.get_integration_matchers(P1, 1, &params).unwrap().is_empty());
    assert!(db.get_integration_extract_values(P1, 1, &params).unwrap().is_empty());
    assert!(db.get_integration_aliases(P1).unwrap().is_empty());
}

#[test]
fn list_params_sort_and_page() {
    let db = TestDatabase::memory();
    for name in ["charlie", "alpha", "delta", "bravo"] {
        db.create_integration(integration(P1, name)).unwrap();
    }

    let params = RetrieveQueryParams::new()
        .sort_by("name", SortDirection::Descending)
        .offset(1)
        .limit(2);
    let names: Vec<String> = db
        .get_integrations(P1, &params)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["charlie", "bravo"]);
}

#[test]
fn update_requires_existing_record() {
    let db = TestDatabase::memory();
    let ghost = Integration {
        id: 42,
        ..integration(P1, "ghost")
    };
    assert!(db.update_integration(&ghost).unwrap_err().is_not_found());

    let mut real = db.create_integration(integration(P1, "real")).unwrap();
    real.searchable = true;
    db.update_integration(&real).unwrap();
    assert!(db.get_integration(P1, real.id).unwrap().searchable);
}

#[test]
fn generic_store_is_usable_directly() {
    let db = TestDatabase::memory();
    let created = db
        .store()
        .create(Scope::Project(P1), integration(P1, "raw"))
        .unwrap();

    let fetched: Integration = db
        .store()
        .get(Scope::Project(P1), &ObjectKey::Int(created.id))
        .unwrap();
    assert_eq!(fetched, created);
    assert_eq!(db.get_integration(P1, created.id).unwrap(), created);
}
