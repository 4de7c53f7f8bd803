//! Verify command implementation.

use confdb_core::{
    parse_bucket_name, AliasIndexEntry, CoreResult, Database, Integration, IntegrationAlias,
    IntegrationExtractValue, IntegrationMatcher, ObjectKey, ObjectStore, ReadTxn, ReadView,
    Record, Scope,
};
use confdb_core::referrer::ChildOf;
use std::collections::BTreeMap;
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of project alias records checked.
    pub aliases_checked: usize,
    /// Number of global index entries checked.
    pub index_entries_checked: usize,
    /// Number of matchers and extract values checked.
    pub children_checked: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks the alias invariant in both directions and looks for children
/// whose integration is gone.
pub fn verify(db: &Database) -> CoreResult<VerifyResult> {
    let txn = db.engine().begin_read();
    let mut result = VerifyResult::default();
    let mut owners: BTreeMap<String, IntegrationAlias> = BTreeMap::new();
    let mut index: BTreeMap<String, IntegrationAlias> = BTreeMap::new();

    for name in txn.bucket_names() {
        let Some((table, scope)) = parse_bucket_name(&name) else {
            result.errors.push(format!("Unrecognized bucket {name}"));
            continue;
        };

        match (table, scope) {
            (t, Scope::Global) if t == IntegrationAlias::TABLE => {
                let entries = ObjectStore::scan_in::<AliasIndexEntry, _>(&txn, scope)?;
                for AliasIndexEntry(owner) in entries {
                    result.index_entries_checked += 1;
                    index.insert(owner.alias.clone(), owner);
                }
            }
            (t, Scope::Project(project)) if t == IntegrationAlias::TABLE => {
                for alias in ObjectStore::scan_in::<IntegrationAlias, _>(&txn, scope)? {
                    result.aliases_checked += 1;
                    if alias.project_id != project {
                        result.errors.push(format!(
                            "Alias {:?} stored under {project} claims {}",
                            alias.alias, alias.project_id
                        ));
                    }
                    if let Some(previous) = owners.insert(alias.alias.clone(), alias) {
                        result.errors.push(format!(
                            "Alias {:?} is held by more than one record (one in {})",
                            previous.alias, previous.project_id
                        ));
                    }
                }
            }
            (t, Scope::Project(_)) if t == IntegrationMatcher::TABLE => {
                check_children::<IntegrationMatcher>(&txn, scope, &mut result)?;
            }
            (t, Scope::Project(_)) if t == IntegrationExtractValue::TABLE => {
                check_children::<IntegrationExtractValue>(&txn, scope, &mut result)?;
            }
            _ => {}
        }
    }

    for (alias, owner) in &owners {
        match index.get(alias) {
            Some(indexed) if indexed.same_owner(owner) => {}
            Some(indexed) => result.errors.push(format!(
                "Index entry {alias:?} points at {} {}, record belongs to {} {}",
                indexed.project_id, indexed.integration, owner.project_id, owner.integration
            )),
            None => result
                .errors
                .push(format!("Alias {alias:?} of {} has no index entry", owner.project_id)),
        }
    }

    for (alias, indexed) in &index {
        if !owners.contains_key(alias) {
            result.errors.push(format!(
                "Index entry {alias:?} has no alias record (claims {})",
                indexed.project_id
            ));
        }
    }

    Ok(result)
}

fn check_children<C: ChildOf>(
    txn: &ReadTxn,
    scope: Scope,
    result: &mut VerifyResult,
) -> CoreResult<()> {
    for child in ObjectStore::scan_in::<C, _>(txn, scope)? {
        result.children_checked += 1;
        let parent = ObjectKey::Int(child.parent_id());
        if ObjectStore::find_in::<Integration, _>(txn, scope, &parent)?.is_none() {
            result.errors.push(format!(
                "{} {} in {scope} references missing integration {}",
                C::TABLE,
                child.key(),
                child.parent_id()
            ));
        }
    }
    Ok(())
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying database at {:?}", path);
    println!();

    let db = super::open_existing(path)?;
    let result = verify(&db)?;

    println!("Alias records:  {}", result.aliases_checked);
    println!("Index entries:  {}", result.index_entries_checked);
    println!("Child records:  {}", result.children_checked);
    let torn = db.engine().torn_tail_bytes();
    if torn > 0 {
        println!("Torn tail:      {torn} bytes (trimmed on next writable open)");
    }
    for error in &result.errors {
        println!("  - {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Database verification passed");
        Ok(())
    } else {
        println!("✗ Database verification failed");
        Err("Verification failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confdb_core::{IntegrationRef, ProjectId};
    use confdb_testkit::{integration, matcher, TestDatabase};

    const P1: ProjectId = ProjectId::new(1);

    fn seeded() -> TestDatabase {
        let db = TestDatabase::memory();
        let hook = db.create_integration(integration(P1, "deploy")).unwrap();
        db.create_integration_matcher(P1, matcher(hook.id, "push"))
            .unwrap();
        db.create_integration_alias(IntegrationAlias::new(
            P1,
            IntegrationRef::Specific(hook.id),
            "deploy",
        ))
        .unwrap();
        db.create_integration_alias(IntegrationAlias::new(
            P1,
            IntegrationRef::ProjectLevel,
            "project-one",
        ))
        .unwrap();
        db
    }

    #[test]
    fn consistent_database_passes() {
        let db = seeded();
        let result = verify(&db).unwrap();
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.aliases_checked, 2);
        assert_eq!(result.index_entries_checked, 2);
        assert_eq!(result.children_checked, 1);
    }

    #[test]
    fn missing_index_entry_is_reported() {
        let db = seeded();
        db.engine()
            .update(|txn| {
                ObjectStore::delete_in::<AliasIndexEntry>(
                    txn,
                    Scope::Global,
                    &ObjectKey::from("deploy"),
                )
            })
            .unwrap();

        let result = verify(&db).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("has no index entry"));
    }

    #[test]
    fn dangling_index_entry_is_reported() {
        let db = seeded();
        db.engine()
            .update(|txn| {
                ObjectStore::delete_in::<IntegrationAlias>(
                    txn,
                    Scope::Project(P1),
                    &IntegrationRef::ProjectLevel.key(),
                )
            })
            .unwrap();

        let result = verify(&db).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("has no alias record"));
    }

    #[test]
    fn orphaned_matcher_is_reported() {
        let db = seeded();
        db.engine()
            .update(|txn| {
                ObjectStore::delete_in::<Integration>(txn, Scope::Project(P1), &ObjectKey::Int(1))
            })
            .unwrap();

        let result = verify(&db).unwrap();
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("references missing integration 1")));
    }
}
