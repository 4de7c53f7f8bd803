//! Main database facade.

use crate::alias_index::AliasIndex;
use crate::config::{AliasWriteMode, Config};
use crate::error::{CoreError, CoreResult};
use crate::kv::{CompactStats, Engine, ReadView};
use crate::model::{
    Integration, IntegrationAlias, IntegrationExtractValue, IntegrationMatcher, IntegrationRef,
};
use crate::object::{ObjectStore, RetrieveQueryParams, Validate};
use crate::partition::bucket_name;
use crate::referrer::{resolve_child_refs, ChildOf, IntegrationReferrers};
use crate::types::{ObjectKey, ProjectId, Scope};
use confdb_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// The main database handle.
///
/// `Database` is the entry point for all entity operations. It is
/// `Send + Sync` and is shared between threads behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use confdb_core::{Database, Integration, ProjectId};
///
/// let db = Database::open_in_memory()?;
/// let hook = db.create_integration(Integration {
///     project_id: ProjectId::new(1),
///     name: "deploy".into(),
///     ..Integration::default()
/// })?;
/// assert_eq!(hook.id, 1);
/// ```
pub struct Database {
    config: Config,
    location: Location,
    engine: Arc<Engine>,
    store: ObjectStore,
    aliases: AliasIndex,
}

/// Where the journal lives. Compaction needs to know how to write a
/// replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
    Backend,
}

impl Database {
    /// Opens the database file at `path` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is locked, unreadable or corrupt.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens the database file at `path`.
    ///
    /// The file is created (with its parent directories) when missing,
    /// unless `create_if_missing` is off.
    ///
    /// ```rust,ignore
    /// let config = Config::default()
    ///     .sync_on_commit(false)
    ///     .alias_write_mode(AliasWriteMode::Compensating);
    ///
    /// let db = Database::open_with_config(Path::new("confdb.journal"), config)?;
    /// ```
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        if !config.create_if_missing && !path.exists() {
            return Err(CoreError::invalid_format(
                "database does not exist and create_if_missing is false",
            ));
        }

        let backend = FileBackend::open_with_create_dirs(path)?;
        let mut db = Self::open_with_backend(Box::new(backend), config)?;
        db.location = Location::File(path.to_path_buf());

        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an existing database file without ever writing to it.
    ///
    /// The file is held under a shared lock. A torn journal tail is left in
    /// place and reported by [`Engine::torn_tail_bytes`]; every write
    /// fails with [`CoreError::InvalidOperation`].
    pub fn open_read_only(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::invalid_format(format!(
                "database {} does not exist",
                path.display()
            )));
        }

        let backend = FileBackend::open_read_only(path)?;
        let engine = Arc::new(Engine::open_read_only(Box::new(backend))?);
        let config = Config::default().create_if_missing(false).sync_on_commit(false);
        let mut db = Self::from_engine(engine, config);
        db.location = Location::File(path.to_path_buf());

        info!(path = %path.display(), "database opened read-only");
        Ok(db)
    }

    /// Opens a database over an arbitrary backend.
    ///
    /// Useful for testing with in-memory or fault-injecting backends.
    pub fn open_with_backend(backend: Box<dyn StorageBackend>, config: Config) -> CoreResult<Self> {
        let engine = Arc::new(Engine::open(backend, config.sync_on_commit)?);
        Ok(Self::from_engine(engine, config))
    }

    fn from_engine(engine: Arc<Engine>, config: Config) -> Self {
        Self {
            store: ObjectStore::new(Arc::clone(&engine)),
            aliases: AliasIndex::new(Arc::clone(&engine), config.alias_write_mode),
            engine,
            config,
            location: Location::Backend,
        }
    }

    /// Opens an empty in-memory database.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_in_memory_with_config(Config::default())
    }

    /// Opens an empty in-memory database with custom configuration.
    pub fn open_in_memory_with_config(config: Config) -> CoreResult<Self> {
        let mut db = Self::open_with_backend(Box::new(InMemoryBackend::new()), config)?;
        db.location = Location::Memory;
        Ok(db)
    }

    /// The configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the database file, `None` for other backends.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory | Location::Backend => None,
        }
    }

    /// The underlying engine, for composing custom transactions.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// The generic object store.
    #[must_use]
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Rewrites the journal so it holds only the committed state.
    ///
    /// A file database is written to a sibling `.compact` file, synced and
    /// renamed over the journal, so a crash at any point leaves either the
    /// old or the new journal. Compacting also clears a poisoned journal,
    /// since the rewrite drops any frame a failed commit left behind.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::InvalidOperation`] for read-only databases
    /// and for databases opened over a caller-supplied backend.
    pub fn compact(&self) -> CoreResult<CompactStats> {
        match &self.location {
            Location::File(path) => {
                let temp = path.with_extension("compact");
                self.engine.compact(|frame| {
                    let mut backend = FileBackend::open(&temp)?;
                    backend.truncate(0)?;
                    backend.append(frame)?;
                    backend.flush()?;
                    backend.sync()?;
                    backend.persist_as(path)?;
                    Ok(Box::new(backend) as Box<dyn StorageBackend>)
                })
            }
            Location::Memory => self.engine.compact(|frame| {
                Ok(Box::new(InMemoryBackend::with_data(frame.to_vec())) as Box<dyn StorageBackend>)
            }),
            Location::Backend => Err(CoreError::invalid_operation(
                "compaction needs a file or in-memory database",
            )),
        }
    }

    // ========================================================================
    // Integrations
    // ========================================================================

    /// Validates and stores a new integration, assigning its id.
    pub fn create_integration(&self, integration: Integration) -> CoreResult<Integration> {
        integration.validate()?;
        self.store.create(integration.project_id.into(), integration)
    }

    /// Reads one integration.
    pub fn get_integration(&self, project: ProjectId, id: u64) -> CoreResult<Integration> {
        self.store.get(project.into(), &ObjectKey::Int(id))
    }

    /// Lists the integrations of a project.
    pub fn get_integrations(
        &self,
        project: ProjectId,
        params: &RetrieveQueryParams,
    ) -> CoreResult<Vec<Integration>> {
        self.store.get_all(project.into(), params)
    }

    /// Validates and overwrites an integration.
    pub fn update_integration(&self, integration: &Integration) -> CoreResult<()> {
        integration.validate()?;
        self.store.update(integration.project_id.into(), integration)
    }

    /// Children referencing an integration.
    pub fn get_integration_refs(
        &self,
        project: ProjectId,
        id: u64,
    ) -> CoreResult<IntegrationReferrers> {
        self.engine
            .view(|txn| resolve_child_refs(txn, project.into(), id))
    }

    /// Deletes an integration together with its matchers, extract values
    /// and alias.
    ///
    /// Everything goes in one transaction: if any part fails, the
    /// integration and all of its children are left as they were.
    pub fn delete_integration(&self, project: ProjectId, id: u64) -> CoreResult<()> {
        let scope = Scope::from(project);
        let key = ObjectKey::Int(id);

        let refs = self.engine.update(|txn| {
            ObjectStore::get_in::<Integration, _>(txn, scope, &key)?;

            let refs = resolve_child_refs(txn, scope, id)?;
            for matcher in &refs.matchers {
                ObjectStore::delete_in::<IntegrationMatcher>(
                    txn,
                    scope,
                    &ObjectKey::Int(matcher.id),
                )?;
            }
            for value in &refs.extract_values {
                ObjectStore::delete_in::<IntegrationExtractValue>(
                    txn,
                    scope,
                    &ObjectKey::Int(value.id),
                )?;
            }

            match AliasIndex::delete_in(txn, project, IntegrationRef::Specific(id)) {
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }

            ObjectStore::delete_in::<Integration>(txn, scope, &key)?;
            Ok(refs)
        })?;

        info!(
            project = %project,
            integration = id,
            matchers = refs.matchers.len(),
            extract_values = refs.extract_values.len(),
            "integration deleted"
        );
        Ok(())
    }

    // ========================================================================
    // Matchers
    // ========================================================================

    /// Validates and stores a matcher of an existing integration.
    pub fn create_integration_matcher(
        &self,
        project: ProjectId,
        matcher: IntegrationMatcher,
    ) -> CoreResult<IntegrationMatcher> {
        self.create_child(project, matcher)
    }

    /// Reads a matcher of the given integration.
    pub fn get_integration_matcher(
        &self,
        project: ProjectId,
        integration_id: u64,
        id: u64,
    ) -> CoreResult<IntegrationMatcher> {
        self.engine
            .view(|txn| owned_child_in(txn, project.into(), integration_id, id))
    }

    /// Lists the matchers of an integration.
    ///
    /// Paging counts only the integration's own matchers.
    pub fn get_integration_matchers(
        &self,
        project: ProjectId,
        integration_id: u64,
        params: &RetrieveQueryParams,
    ) -> CoreResult<Vec<IntegrationMatcher>> {
        self.get_children(project, integration_id, params)
    }

    /// Validates and overwrites a matcher. The matcher cannot move to
    /// another integration.
    pub fn update_integration_matcher(
        &self,
        project: ProjectId,
        matcher: &IntegrationMatcher,
    ) -> CoreResult<()> {
        self.update_child(project, matcher)
    }

    /// Deletes a matcher of the given integration.
    pub fn delete_integration_matcher(
        &self,
        project: ProjectId,
        integration_id: u64,
        id: u64,
    ) -> CoreResult<()> {
        self.delete_child::<IntegrationMatcher>(project, integration_id, id)
    }

    // ========================================================================
    // Extract values
    // ========================================================================

    /// Validates and stores an extract value of an existing integration.
    pub fn create_integration_extract_value(
        &self,
        project: ProjectId,
        value: IntegrationExtractValue,
    ) -> CoreResult<IntegrationExtractValue> {
        self.create_child(project, value)
    }

    /// Reads an extract value of the given integration.
    pub fn get_integration_extract_value(
        &self,
        project: ProjectId,
        integration_id: u64,
        id: u64,
    ) -> CoreResult<IntegrationExtractValue> {
        self.engine
            .view(|txn| owned_child_in(txn, project.into(), integration_id, id))
    }

    /// Lists the extract values of an integration.
    pub fn get_integration_extract_values(
        &self,
        project: ProjectId,
        integration_id: u64,
        params: &RetrieveQueryParams,
    ) -> CoreResult<Vec<IntegrationExtractValue>> {
        self.get_children(project, integration_id, params)
    }

    /// Validates and overwrites an extract value.
    pub fn update_integration_extract_value(
        &self,
        project: ProjectId,
        value: &IntegrationExtractValue,
    ) -> CoreResult<()> {
        self.update_child(project, value)
    }

    /// Deletes an extract value of the given integration.
    pub fn delete_integration_extract_value(
        &self,
        project: ProjectId,
        integration_id: u64,
        id: u64,
    ) -> CoreResult<()> {
        self.delete_child::<IntegrationExtractValue>(project, integration_id, id)
    }

    // ========================================================================
    // Aliases
    // ========================================================================

    /// Validates and stores an alias with its global index entry.
    ///
    /// An integration-level alias requires the integration to exist.
    pub fn create_integration_alias(&self, alias: IntegrationAlias) -> CoreResult<IntegrationAlias> {
        alias.validate()?;
        let scope = Scope::from(alias.project_id);
        let target = alias.integration.integration_id();

        match self.aliases.mode() {
            AliasWriteMode::Transactional => self.engine.update(|txn| {
                if let Some(id) = target {
                    ObjectStore::get_in::<Integration, _>(txn, scope, &ObjectKey::Int(id))?;
                }
                AliasIndex::create_in(txn, alias)
            }),
            AliasWriteMode::Compensating => {
                if let Some(id) = target {
                    self.get_integration(alias.project_id, id)?;
                }
                self.aliases.create(alias)
            }
        }
    }

    /// Reads the alias of a project or of one of its integrations.
    pub fn get_integration_alias(
        &self,
        project: ProjectId,
        integration: IntegrationRef,
    ) -> CoreResult<IntegrationAlias> {
        self.aliases.get(project, integration)
    }

    /// Finds the owner of an alias string, across all projects.
    pub fn get_integration_alias_by_alias(&self, alias: &str) -> CoreResult<IntegrationAlias> {
        self.aliases.get_by_alias(alias)
    }

    /// Lists every alias of a project.
    pub fn get_integration_aliases(&self, project: ProjectId) -> CoreResult<Vec<IntegrationAlias>> {
        self.aliases.list(project)
    }

    /// Validates and renames an alias.
    pub fn update_integration_alias(&self, alias: &IntegrationAlias) -> CoreResult<()> {
        alias.validate()?;
        self.aliases.update(alias)
    }

    /// Deletes an alias and its global index entry.
    pub fn delete_integration_alias(
        &self,
        project: ProjectId,
        integration: IntegrationRef,
    ) -> CoreResult<()> {
        self.aliases.delete(project, integration)
    }

    // ========================================================================
    // Child helpers
    // ========================================================================

    fn create_child<C: ChildOf + Validate>(&self, project: ProjectId, child: C) -> CoreResult<C> {
        child.validate()?;
        let scope = Scope::from(project);
        self.engine.update(|txn| {
            let parent = ObjectKey::Int(child.parent_id());
            ObjectStore::get_in::<Integration, _>(txn, scope, &parent)?;
            ObjectStore::create_in(txn, scope, child)
        })
    }

    fn get_children<C: ChildOf>(
        &self,
        project: ProjectId,
        integration_id: u64,
        params: &RetrieveQueryParams,
    ) -> CoreResult<Vec<C>> {
        self.store
            .get_all_where(project.into(), params, |c: &C| c.parent_id() == integration_id)
    }

    fn update_child<C: ChildOf + Validate>(&self, project: ProjectId, child: &C) -> CoreResult<()> {
        child.validate()?;
        let scope = Scope::from(project);
        self.engine.update(|txn| {
            let id = child_id(&child.key())?;
            owned_child_in::<C, _>(txn, scope, child.parent_id(), id)?;
            ObjectStore::update_in(txn, scope, child)
        })
    }

    fn delete_child<C: ChildOf>(&self, project: ProjectId, integration_id: u64, id: u64) -> CoreResult<()> {
        let scope = Scope::from(project);
        self.engine.update(|txn| {
            owned_child_in::<C, _>(txn, scope, integration_id, id)?;
            ObjectStore::delete_in::<C>(txn, scope, &ObjectKey::Int(id))
        })
    }
}

/// Reads child `id`, treating a child of another integration as absent.
fn owned_child_in<C: ChildOf, V: ReadView>(
    view: &V,
    scope: Scope,
    integration_id: u64,
    id: u64,
) -> CoreResult<C> {
    let key = ObjectKey::Int(id);
    let child: C = ObjectStore::get_in(view, scope, &key)?;
    if child.parent_id() != integration_id {
        return Err(CoreError::not_found(bucket_name(scope, C::TABLE), key));
    }
    Ok(child)
}

fn child_id(key: &ObjectKey) -> CoreResult<u64> {
    match key {
        ObjectKey::Int(id) => Ok(*id),
        ObjectKey::Str(_) => Err(CoreError::invalid_operation(format!(
            "child records are keyed by integer id, got {key}"
        ))),
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .field("sequence", &self.engine.committed_sequence())
            .finish_non_exhaustive()
    }
}
