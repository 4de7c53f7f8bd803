//! Stored entity types.

mod alias;
mod extract_value;
mod integration;
mod matcher;

pub use alias::{AliasIndexEntry, IntegrationAlias, IntegrationRef, MAX_ALIAS_LEN};
pub use extract_value::{ExtractValueSource, IntegrationExtractValue, VariableType};
pub use integration::{Integration, IntegrationAuthMethod};
pub use matcher::{BodyDataType, IntegrationMatcher, MatchMethod, MatchType};
