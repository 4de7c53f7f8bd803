//! Record descriptors.

use crate::error::ValidationError;
use crate::types::ObjectKey;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// How a record type gets its primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The store assigns the next value of the bucket's counter.
    AutoIncrement,
    /// The record carries its own key.
    Natural {
        /// Whether creating a record under a taken key is a conflict
        /// rather than an overwrite.
        unique: bool,
    },
}

/// Static description of a storable record type.
///
/// Implementors are plain serde types; the store never inspects them
/// beyond this trait.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Hook { id: u64, name: String }
///
/// impl Record for Hook {
///     const TABLE: &'static str = "hook";
///     const KEY_STRATEGY: KeyStrategy = KeyStrategy::AutoIncrement;
///
///     fn key(&self) -> ObjectKey { ObjectKey::Int(self.id) }
///     fn assign_id(&mut self, id: u64) { self.id = id; }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Table name, combined with a scope to name the bucket.
    const TABLE: &'static str;

    /// Primary key derivation.
    const KEY_STRATEGY: KeyStrategy;

    /// The record's primary key.
    fn key(&self) -> ObjectKey;

    /// Stores an auto-assigned key. Only called for
    /// [`KeyStrategy::AutoIncrement`] types.
    fn assign_id(&mut self, id: u64) {
        let _ = id;
    }
}

/// Validation rules a record must pass before it is written.
pub trait Validate {
    /// Checks the record.
    ///
    /// # Errors
    ///
    /// Returns the first rule the record breaks.
    fn validate(&self) -> Result<(), ValidationError>;
}
