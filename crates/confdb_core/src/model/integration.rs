//! Integrations.

use crate::error::ValidationError;
use crate::object::{KeyStrategy, Record, Validate};
use crate::types::{ObjectKey, ProjectId};
use serde::{Deserialize, Serialize};

/// How incoming requests to an integration authenticate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationAuthMethod {
    /// No authentication.
    #[default]
    None,
    /// A shared token in a request header.
    Token,
    /// An HMAC signature of the body.
    Hmac,
    /// HTTP basic auth.
    BasicAuth,
}

/// An inbound integration owned by a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    /// Auto-assigned id.
    pub id: u64,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Template run when the integration fires.
    pub template_id: u64,
    /// Authentication scheme.
    pub auth_method: IntegrationAuthMethod,
    /// Header carrying the token or signature.
    pub auth_header: Option<String>,
    /// Secret used to check the token or signature.
    pub auth_secret_id: Option<u64>,
    /// Whether the integration is matched by searching all integrations of
    /// the project rather than addressed by its own alias.
    pub searchable: bool,
}

impl Record for Integration {
    const TABLE: &'static str = "integration";
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::AutoIncrement;

    fn key(&self) -> ObjectKey {
        ObjectKey::Int(self.id)
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Validate for Integration {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let integration = Integration {
            name: "  ".into(),
            ..Integration::default()
        };
        assert_eq!(integration.validate().unwrap_err().field, "name");
    }
}
