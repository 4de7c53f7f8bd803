//! The global alias index.
//!
//! An alias exists twice: as an [`IntegrationAlias`] in its project's
//! bucket, and as an [`AliasIndexEntry`] keyed by the alias string in the
//! global bucket. Every operation here keeps the two in step, so that for
//! each alias string there is one project record exactly when there is one
//! global entry.

use crate::config::AliasWriteMode;
use crate::error::{CoreError, CoreResult};
use crate::kv::{Engine, WriteTxn};
use crate::model::{AliasIndexEntry, IntegrationAlias, IntegrationRef};
use crate::object::{ObjectStore, Record};
use crate::partition::bucket_name;
use crate::types::{ObjectKey, ProjectId, Scope};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads and writes aliases together with their global index entries.
#[derive(Clone)]
pub struct AliasIndex {
    engine: Arc<Engine>,
    mode: AliasWriteMode,
}

impl AliasIndex {
    /// Creates an index over `engine`.
    pub fn new(engine: Arc<Engine>, mode: AliasWriteMode) -> Self {
        Self { engine, mode }
    }

    /// The configured create strategy.
    #[must_use]
    pub fn mode(&self) -> AliasWriteMode {
        self.mode
    }

    /// Stores a new alias and its index entry.
    ///
    /// Fails with `Conflict` if the target already has an alias or the
    /// string is taken by any project. Either way nothing is left behind.
    pub fn create(&self, alias: IntegrationAlias) -> CoreResult<IntegrationAlias> {
        match self.mode {
            AliasWriteMode::Transactional => self.engine.update(|txn| Self::create_in(txn, alias)),
            AliasWriteMode::Compensating => self.create_compensating(alias),
        }
    }

    /// Writes both records inside `txn`.
    pub fn create_in(txn: &mut WriteTxn, alias: IntegrationAlias) -> CoreResult<IntegrationAlias> {
        let stored = ObjectStore::create_in(txn, alias.project_id.into(), alias)?;
        ObjectStore::create_in(txn, Scope::Global, AliasIndexEntry(stored.clone()))?;
        Ok(stored)
    }

    fn create_compensating(&self, alias: IntegrationAlias) -> CoreResult<IntegrationAlias> {
        let scope = Scope::from(alias.project_id);
        let stored = self
            .engine
            .update(|txn| ObjectStore::create_in(txn, scope, alias))?;

        let indexed = self.engine.update(|txn| {
            ObjectStore::create_in(txn, Scope::Global, AliasIndexEntry(stored.clone()))
        });

        if let Err(err) = indexed {
            let undo = self.engine.update(|txn| {
                ObjectStore::delete_in::<IntegrationAlias>(txn, scope, &stored.key())
            });
            match undo {
                Ok(()) => debug!(alias = %stored.alias, "rolled back alias record"),
                Err(undo_err) => warn!(
                    alias = %stored.alias,
                    project = %stored.project_id,
                    error = %undo_err,
                    "failed to roll back alias record after index write failed"
                ),
            }
            return Err(err);
        }

        Ok(stored)
    }

    /// Reads the alias of a project or integration.
    pub fn get(&self, project: ProjectId, integration: IntegrationRef) -> CoreResult<IntegrationAlias> {
        self.engine
            .view(|txn| ObjectStore::get_in(txn, project.into(), &integration.key()))
    }

    /// Looks an alias string up in the global index.
    pub fn get_by_alias(&self, alias: &str) -> CoreResult<IntegrationAlias> {
        let key = ObjectKey::Str(alias.to_owned());
        self.engine
            .view(|txn| ObjectStore::get_in::<AliasIndexEntry, _>(txn, Scope::Global, &key))
            .map(|entry| entry.0)
    }

    /// All aliases of a project, project-level first.
    pub fn list(&self, project: ProjectId) -> CoreResult<Vec<IntegrationAlias>> {
        let mut aliases = self
            .engine
            .view(|txn| ObjectStore::scan_in::<IntegrationAlias, _>(txn, project.into()))?;
        aliases.sort_by_key(|a| a.integration.integration_id());
        Ok(aliases)
    }

    /// Changes the alias string of an existing alias.
    ///
    /// Fails with `NotFound` if the owner has no alias and with `Conflict`
    /// if the new string belongs to someone else; in both cases nothing
    /// changes.
    pub fn update(&self, alias: &IntegrationAlias) -> CoreResult<()> {
        self.engine.update(|txn| Self::update_in(txn, alias))
    }

    /// Rename inside `txn`.
    pub fn update_in(txn: &mut WriteTxn, alias: &IntegrationAlias) -> CoreResult<()> {
        let scope = Scope::from(alias.project_id);
        let old: IntegrationAlias = ObjectStore::get_in(txn, scope, &alias.key())?;

        ObjectStore::update_in(txn, scope, alias)?;

        if old.alias == alias.alias {
            return Self::rewrite_entry_in(txn, alias);
        }

        Self::delete_entry_in(txn, &old)?;
        ObjectStore::create_in(txn, Scope::Global, AliasIndexEntry(alias.clone()))?;
        debug!(from = %old.alias, to = %alias.alias, "alias renamed");
        Ok(())
    }

    /// Deletes an alias and its index entry.
    pub fn delete(&self, project: ProjectId, integration: IntegrationRef) -> CoreResult<()> {
        self.engine
            .update(|txn| Self::delete_in(txn, project, integration).map(|_| ()))
    }

    /// Delete inside `txn`, returning the removed alias.
    ///
    /// A missing project record fails with `NotFound` before the global
    /// bucket is touched.
    pub fn delete_in(
        txn: &mut WriteTxn,
        project: ProjectId,
        integration: IntegrationRef,
    ) -> CoreResult<IntegrationAlias> {
        let scope = Scope::from(project);
        let key = integration.key();
        let existing: IntegrationAlias = ObjectStore::get_in(txn, scope, &key)?;

        ObjectStore::delete_in::<IntegrationAlias>(txn, scope, &key)?;
        Self::delete_entry_in(txn, &existing)?;
        Ok(existing)
    }

    /// Overwrites the global entry of an unchanged alias string, restoring
    /// it if it went missing.
    fn rewrite_entry_in(txn: &mut WriteTxn, alias: &IntegrationAlias) -> CoreResult<()> {
        let key = ObjectKey::Str(alias.alias.clone());
        let entry = AliasIndexEntry(alias.clone());
        match ObjectStore::find_in::<AliasIndexEntry, _>(txn, Scope::Global, &key)? {
            Some(AliasIndexEntry(indexed)) if indexed.same_owner(alias) => {
                ObjectStore::update_in(txn, Scope::Global, &entry)
            }
            Some(AliasIndexEntry(indexed)) => {
                warn!(
                    alias = %alias.alias,
                    owner = %indexed.project_id,
                    "alias index entry belongs to another owner"
                );
                Err(CoreError::conflict(
                    bucket_name(Scope::Global, AliasIndexEntry::TABLE),
                    key,
                ))
            }
            None => {
                warn!(alias = %alias.alias, "alias index entry missing, restoring it");
                ObjectStore::create_in(txn, Scope::Global, entry).map(|_| ())
            }
        }
    }

    /// Removes the global entry for `owner.alias`, but only if it points back
    /// at `owner`.
    fn delete_entry_in(txn: &mut WriteTxn, owner: &IntegrationAlias) -> CoreResult<()> {
        let key = ObjectKey::Str(owner.alias.clone());
        match ObjectStore::find_in::<AliasIndexEntry, _>(txn, Scope::Global, &key)? {
            Some(AliasIndexEntry(indexed)) if indexed.same_owner(owner) => {
                ObjectStore::delete_in::<AliasIndexEntry>(txn, Scope::Global, &key)
            }
            Some(AliasIndexEntry(indexed)) => {
                warn!(
                    alias = %owner.alias,
                    owner = %indexed.project_id,
                    "alias index entry belongs to another owner, left in place"
                );
                Ok(())
            }
            None => {
                warn!(alias = %owner.alias, "alias index entry missing");
                Ok(())
            }
        }
    }
}
