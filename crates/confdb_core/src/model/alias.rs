//! Integration aliases and their global index entries.

use crate::error::ValidationError;
use crate::object::{KeyStrategy, Record, Validate};
use crate::types::{ObjectKey, ProjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted alias.
pub const MAX_ALIAS_LEN: usize = 64;

const PROJECT_LEVEL_KEY: &str = "project";

/// What an alias routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationRef {
    /// One integration.
    Specific(u64),
    /// Every searchable integration of the project.
    ProjectLevel,
}

impl IntegrationRef {
    /// Key of the alias record inside the project bucket. Each target holds
    /// at most one alias.
    #[must_use]
    pub fn key(self) -> ObjectKey {
        match self {
            Self::Specific(id) => ObjectKey::Str(format!("integration:{id:010}")),
            Self::ProjectLevel => ObjectKey::Str(PROJECT_LEVEL_KEY.to_owned()),
        }
    }

    /// The integration id, if this is not a project-level reference.
    #[must_use]
    pub fn integration_id(self) -> Option<u64> {
        match self {
            Self::Specific(id) => Some(id),
            Self::ProjectLevel => None,
        }
    }
}

impl From<Option<u64>> for IntegrationRef {
    fn from(id: Option<u64>) -> Self {
        id.map_or(Self::ProjectLevel, Self::Specific)
    }
}

impl fmt::Display for IntegrationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Specific(id) => write!(f, "integration:{id}"),
            Self::ProjectLevel => f.write_str("project-level"),
        }
    }
}

/// A public name routing requests to a project or one of its integrations.
///
/// Stored in the owning project's bucket, keyed by [`IntegrationRef::key`],
/// and mirrored by an [`AliasIndexEntry`] in the global scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationAlias {
    /// Owning project.
    pub project_id: ProjectId,
    /// Target.
    pub integration: IntegrationRef,
    /// The alias string, unique across all projects.
    pub alias: String,
}

impl IntegrationAlias {
    /// Creates an alias record.
    pub fn new(project_id: ProjectId, integration: IntegrationRef, alias: impl Into<String>) -> Self {
        Self {
            project_id,
            integration,
            alias: alias.into(),
        }
    }

    /// Whether both records belong to the same project and target.
    #[must_use]
    pub fn same_owner(&self, other: &Self) -> bool {
        self.project_id == other.project_id && self.integration == other.integration
    }
}

impl Record for IntegrationAlias {
    const TABLE: &'static str = "integration_alias";
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::Natural { unique: true };

    fn key(&self) -> ObjectKey {
        self.integration.key()
    }
}

impl Validate for IntegrationAlias {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.alias.is_empty() {
            return Err(ValidationError::new("alias", "must not be empty"));
        }
        if self.alias.len() > MAX_ALIAS_LEN {
            return Err(ValidationError::new(
                "alias",
                format!("longer than {MAX_ALIAS_LEN} characters"),
            ));
        }
        if !self
            .alias
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ValidationError::new(
                "alias",
                "may only contain ASCII letters, digits, '-' and '_'",
            ));
        }
        Ok(())
    }
}

/// Global index entry: the alias string mapped to the record owning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasIndexEntry(pub IntegrationAlias);

impl Record for AliasIndexEntry {
    const TABLE: &'static str = IntegrationAlias::TABLE;
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::Natural { unique: true };

    fn key(&self) -> ObjectKey {
        ObjectKey::Str(self.0.alias.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(s: &str) -> IntegrationAlias {
        IntegrationAlias::new(ProjectId::new(1), IntegrationRef::ProjectLevel, s)
    }

    #[test]
    fn alias_rules() {
        assert!(alias("deploy-prod_2").validate().is_ok());
        assert!(alias("").validate().is_err());
        assert!(alias("has space").validate().is_err());
        assert!(alias("ünïcode").validate().is_err());
        assert!(alias(&"a".repeat(MAX_ALIAS_LEN)).validate().is_ok());
        assert!(alias(&"a".repeat(MAX_ALIAS_LEN + 1)).validate().is_err());
    }

    #[test]
    fn owner_keys_are_distinct() {
        assert_ne!(IntegrationRef::ProjectLevel.key(), IntegrationRef::Specific(1).key());
        assert_ne!(IntegrationRef::Specific(1).key(), IntegrationRef::Specific(2).key());
        assert_eq!(IntegrationRef::from(None), IntegrationRef::ProjectLevel);
        assert_eq!(IntegrationRef::from(Some(4)).integration_id(), Some(4));
    }

    #[test]
    fn index_entry_is_keyed_by_alias() {
        let entry = AliasIndexEntry(alias("hook"));
        assert_eq!(entry.key(), ObjectKey::Str("hook".into()));
    }
}
