//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random alias workloads over a small
//! pool of projects, targets and alias strings, so that collisions and
//! renames onto taken aliases happen often.

use confdb_core::{CoreResult, Database, IntegrationAlias, IntegrationRef, ProjectId};
use proptest::prelude::*;

/// Projects used by generated workloads.
pub const PROJECTS: [ProjectId; 3] = [ProjectId(1), ProjectId(2), ProjectId(3)];

/// Integrations per project a workload may target. Seed them with
/// [`crate::scenarios::seed_integrations`].
pub const INTEGRATIONS_PER_PROJECT: u64 = 2;

/// Alias strings used by generated workloads.
pub const ALIAS_POOL: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// One alias operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasOp {
    /// Create an alias.
    Create(IntegrationAlias),
    /// Rename an existing alias.
    Rename(IntegrationAlias),
    /// Delete the alias of a target.
    Delete(ProjectId, IntegrationRef),
}

impl AliasOp {
    /// Applies the operation to `db`.
    pub fn apply(&self, db: &Database) -> CoreResult<()> {
        match self {
            Self::Create(alias) => db.create_integration_alias(alias.clone()).map(|_| ()),
            Self::Rename(alias) => db.update_integration_alias(alias),
            Self::Delete(project, target) => db.delete_integration_alias(*project, *target),
        }
    }
}

/// Strategy for generating project ids from [`PROJECTS`].
pub fn project_id_strategy() -> impl Strategy<Value = ProjectId> {
    prop::sample::select(PROJECTS.to_vec())
}

/// Strategy for generating alias targets.
pub fn integration_ref_strategy() -> impl Strategy<Value = IntegrationRef> {
    prop_oneof![
        Just(IntegrationRef::ProjectLevel),
        (1..=INTEGRATIONS_PER_PROJECT).prop_map(IntegrationRef::Specific),
    ]
}

/// Strategy for generating alias strings from [`ALIAS_POOL`].
pub fn alias_pool_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(ALIAS_POOL.to_vec()).prop_map(str::to_string)
}

/// Strategy for generating any valid alias string.
pub fn alias_string_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_-]{1,64}").expect("Invalid regex")
}

/// Strategy for generating alias records from the pools.
pub fn alias_strategy() -> impl Strategy<Value = IntegrationAlias> {
    (
        project_id_strategy(),
        integration_ref_strategy(),
        alias_pool_strategy(),
    )
        .prop_map(|(project, target, alias)| IntegrationAlias::new(project, target, alias))
}

/// Strategy for generating one alias operation.
pub fn alias_op_strategy() -> impl Strategy<Value = AliasOp> {
    prop_oneof![
        3 => alias_strategy().prop_map(AliasOp::Create),
        2 => alias_strategy().prop_map(AliasOp::Rename),
        1 => (project_id_strategy(), integration_ref_strategy())
            .prop_map(|(project, target)| AliasOp::Delete(project, target)),
    ]
}

/// Strategy for generating alias workloads of up to `max_len` operations.
pub fn alias_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<AliasOp>> {
    prop::collection::vec(alias_op_strategy(), 0..=max_len)
}
