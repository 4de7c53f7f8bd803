//! Child back-references.
//!
//! Matchers and extract values point at their integration by id. There is
//! no reverse index: resolving the children of an integration scans the
//! child buckets of its project.

use crate::error::CoreResult;
use crate::kv::ReadView;
use crate::model::{IntegrationExtractValue, IntegrationMatcher};
use crate::object::{ObjectStore, Record};
use crate::types::Scope;
use serde::{Deserialize, Serialize};

/// A child record pointing at a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReferrer {
    /// Child id.
    pub id: u64,
    /// Child name, for error messages and listings.
    pub name: String,
}

/// Every child referencing one integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationReferrers {
    /// Matchers of the integration.
    pub matchers: Vec<ObjectReferrer>,
    /// Extract values of the integration.
    pub extract_values: Vec<ObjectReferrer>,
}

impl IntegrationReferrers {
    /// Whether the integration has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty() && self.extract_values.is_empty()
    }
}

/// A record owned by an integration.
pub trait ChildOf: Record {
    /// Id of the owning integration.
    fn parent_id(&self) -> u64;

    /// This record as a referrer.
    fn referrer(&self) -> ObjectReferrer;
}

/// Children of type `C` referencing `parent_id`, in key order.
pub fn child_refs<C: ChildOf, V: ReadView>(
    view: &V,
    scope: Scope,
    parent_id: u64,
) -> CoreResult<Vec<ObjectReferrer>> {
    Ok(ObjectStore::scan_in::<C, V>(view, scope)?
        .iter()
        .filter(|child| child.parent_id() == parent_id)
        .map(ChildOf::referrer)
        .collect())
}

/// All children of the integration `parent_id`.
pub fn resolve_child_refs<V: ReadView>(
    view: &V,
    scope: Scope,
    parent_id: u64,
) -> CoreResult<IntegrationReferrers> {
    Ok(IntegrationReferrers {
        matchers: child_refs::<IntegrationMatcher, V>(view, scope, parent_id)?,
        extract_values: child_refs::<IntegrationExtractValue, V>(view, scope, parent_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::Engine;
    use crate::model::{ExtractValueSource, VariableType};
    use crate::types::ProjectId;
    use confdb_storage::InMemoryBackend;

    fn matcher(integration_id: u64, name: &str) -> IntegrationMatcher {
        IntegrationMatcher {
            integration_id,
            name: name.into(),
            key: "action".into(),
            ..IntegrationMatcher::default()
        }
    }

    #[test]
    fn resolves_only_children_of_the_parent() {
        let engine = Engine::open(Box::new(InMemoryBackend::new()), false).unwrap();
        let scope = Scope::Project(ProjectId::new(1));

        engine
            .update(|txn| {
                ObjectStore::create_in(txn, scope, matcher(1, "push"))?;
                ObjectStore::create_in(txn, scope, matcher(2, "tag"))?;
                ObjectStore::create_in(txn, scope, matcher(1, "merge"))?;
                ObjectStore::create_in(
                    txn,
                    scope,
                    IntegrationExtractValue {
                        integration_id: 1,
                        name: "ref".into(),
                        value_source: ExtractValueSource::Header,
                        key: "X-Ref".into(),
                        variable: "REF".into(),
                        variable_type: VariableType::Environment,
                        ..IntegrationExtractValue::default()
                    },
                )?;
                Ok(())
            })
            .unwrap();

        let refs = engine.view(|txn| resolve_child_refs(txn, scope, 1)).unwrap();
        let names: Vec<&str> = refs.matchers.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["push", "merge"]);
        assert_eq!(refs.extract_values.len(), 1);

        let none = engine.view(|txn| resolve_child_refs(txn, scope, 3)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn other_projects_are_not_scanned() {
        let engine = Engine::open(Box::new(InMemoryBackend::new()), false).unwrap();
        let p1 = Scope::Project(ProjectId::new(1));
        let p2 = Scope::Project(ProjectId::new(2));

        engine
            .update(|txn| ObjectStore::create_in(txn, p2, matcher(1, "push")))
            .unwrap();

        let refs = engine.view(|txn| resolve_child_refs(txn, p1, 1)).unwrap();
        assert!(refs.is_empty());
    }
}
