//! Bucket naming.
//!
//! Every (scope, table) pair owns exactly one bucket:
//!
//! ```text
//! integration_0000000007     table "integration", project 7
//! integration_alias_global   table "integration_alias", global scope
//! ```
//!
//! A project suffix is all digits and the global suffix is not, so a table
//! name that itself ends in `_<digits>` still cannot collide with another
//! pair: parsing always splits at the last underscore.

use crate::types::{ProjectId, Scope};

const GLOBAL_SUFFIX: &str = "global";

/// Returns the bucket holding `table` records for `scope`.
#[must_use]
pub fn bucket_name(scope: Scope, table: &str) -> String {
    match scope {
        Scope::Project(project) => format!("{table}_{:010}", project.as_u64()),
        Scope::Global => format!("{table}_{GLOBAL_SUFFIX}"),
    }
}

/// Splits a bucket name back into its table and scope.
///
/// Returns `None` for names not produced by [`bucket_name`].
#[must_use]
pub fn parse_bucket_name(name: &str) -> Option<(&str, Scope)> {
    let (table, suffix) = name.rsplit_once('_')?;
    if table.is_empty() {
        return None;
    }

    if suffix == GLOBAL_SUFFIX {
        return Some((table, Scope::Global));
    }

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = suffix.parse().ok()?;
    Some((table, Scope::Project(ProjectId::new(id))))
}
