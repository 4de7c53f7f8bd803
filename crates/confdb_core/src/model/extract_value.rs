//! Values extracted from integration requests into task variables.

use crate::error::ValidationError;
use crate::model::BodyDataType;
use crate::object::{KeyStrategy, Record, Validate};
use crate::referrer::{ChildOf, ObjectReferrer};
use crate::types::ObjectKey;
use serde::{Deserialize, Serialize};

/// Where an extracted value is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractValueSource {
    /// The request body.
    #[default]
    Body,
    /// A request header.
    Header,
}

/// Kind of variable the extracted value is passed as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    /// An environment variable of the task.
    #[default]
    Environment,
    /// A task parameter.
    Task,
}

/// Copies one value out of an incoming request into a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationExtractValue {
    /// Auto-assigned id.
    pub id: u64,
    /// Owning integration.
    pub integration_id: u64,
    /// Display name.
    pub name: String,
    /// Where the value comes from.
    pub value_source: ExtractValueSource,
    /// Body format, for body sources.
    pub body_data_type: BodyDataType,
    /// Header name or body path.
    pub key: String,
    /// Target variable name.
    pub variable: String,
    /// Target variable kind.
    pub variable_type: VariableType,
}

impl Record for IntegrationExtractValue {
    const TABLE: &'static str = "integration_extract_value";
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::AutoIncrement;

    fn key(&self) -> ObjectKey {
        ObjectKey::Int(self.id)
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl ChildOf for IntegrationExtractValue {
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

impl Validate for IntegrationExtractValue {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        if self.variable.is_empty() {
            return Err(ValidationError::new("variable", "must not be empty"));
        }
        Ok(())
    }
}
