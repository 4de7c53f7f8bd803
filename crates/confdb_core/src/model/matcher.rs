//! Integration matchers.

use crate::error::ValidationError;
use crate::object::{KeyStrategy, Record, Validate};
use crate::referrer::{ChildOf, ObjectReferrer};
use crate::types::ObjectKey;
use serde::{Deserialize, Serialize};

/// Which part of the incoming request a matcher or extractor reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The request body.
    #[default]
    Body,
    /// A request header.
    Header,
}

/// Comparison applied by a matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Value equals the expected one.
    #[default]
    Equals,
    /// Value differs from the expected one.
    Unequals,
    /// Value contains the expected one.
    Contains,
}

/// How a request body is parsed before `key` is looked up in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyDataType {
    /// JSON, `key` is a dotted path.
    #[default]
    Json,
    /// XML, `key` is an element path.
    Xml,
    /// Raw text, `key` is ignored.
    String,
}

/// A condition an incoming request must meet to trigger an integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationMatcher {
    /// Auto-assigned id.
    pub id: u64,
    /// Owning integration.
    pub integration_id: u64,
    /// Display name.
    pub name: String,
    /// Where the compared value comes from.
    pub match_type: MatchType,
    /// Comparison.
    pub method: MatchMethod,
    /// Body format, for body matchers.
    pub body_data_type: BodyDataType,
    /// Header name or body path.
    pub key: String,
    /// Expected value.
    pub value: String,
}

impl Record for IntegrationMatcher {
    const TABLE: &'static str = "integration_matcher";
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::AutoIncrement;

    fn key(&self) -> ObjectKey {
        ObjectKey::Int(self.id)
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl ChildOf for IntegrationMatcher {
    fn parent_id(&self) -> u64 {
        self.integration_id
    }

    fn referrer(&self) -> ObjectReferrer {
        ObjectReferrer {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl Validate for IntegrationMatcher {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        if self.key.is_empty() {
            return Err(ValidationError::new("key", "must not be empty"));
        }
        Ok(())
    }
}
