//! Unified error type for the mapping and shift engine.
//!
//! Every caller-fixable rejection is raised before the owning transaction performs a write,
//! so a returned error never leaves a partially applied mutation behind.

use crate::core::completeness::MissingItem;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced row does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of row that was looked up (e.g. `"sharaf definition"`)
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Caller-supplied ids or values violate a precondition
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable reason
        message: String,
    },

    /// The proposed mapping edge is self-referential or stays inside one miqaat
    #[error("Invalid mapping: {message}")]
    InvalidEdge {
        /// Human-readable reason
        message: String,
    },

    /// A mapping already exists between the two definitions, in either direction
    #[error(
        "Mapping between definitions {source_id} and {target_id} already exists (mapping {existing_id})"
    )]
    DuplicateEdge {
        /// Proposed source definition
        source_id: i64,
        /// Proposed target definition
        target_id: i64,
        /// Id of the mapping that already links the pair
        existing_id: i64,
    },

    /// A position or payment id is already used by another sub-mapping of the same edge
    #[error("Duplicate sub-mapping: {message}")]
    DuplicateSubMapping {
        /// Human-readable reason
        message: String,
    },

    /// A uniqueness invariant would be violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable reason
        message: String,
    },

    /// Adding the edge would close a cycle in the undirected mapping graph
    #[error(
        "Mapping {source_id} -> {target_id} would create a cycle through definitions {path:?}"
    )]
    CyclicEdge {
        /// Proposed source definition
        source_id: i64,
        /// Proposed target definition
        target_id: i64,
        /// Existing path from target back to source
        path: Vec<i64>,
    },

    /// A shift was attempted with positions or payment definitions left unmapped
    #[error(
        "Mapping is incomplete: {} position(s) and {} payment definition(s) unmapped",
        .missing_positions.len(),
        .missing_payment_definitions.len()
    )]
    IncompleteMapping {
        /// In-use positions without a sub-mapping
        missing_positions: Vec<MissingItem>,
        /// In-use payment definitions without a sub-mapping
        missing_payment_definitions: Vec<MissingItem>,
    },

    /// The operation is not allowed in the entity's current state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Human-readable reason
        message: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Storage failure; the surrounding transaction has been rolled back
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encoding or decoding failure (audit payloads)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A count did not fit the storage integer type
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether the caller can fix the request and retry.
    ///
    /// Storage, configuration and serialization failures are server errors; everything else is a
    /// rejection raised before any write.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Database(_)
                | Self::Serialization(_)
                | Self::IntConversion(_)
                | Self::Config { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::not_found("sharaf", 7).is_recoverable());
        assert!(
            Error::IncompleteMapping {
                missing_positions: vec![MissingItem {
                    id: 3,
                    name: "FM".to_string(),
                }],
                missing_payment_definitions: Vec::new(),
            }
            .is_recoverable()
        );
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_recoverable());
    }

    #[test]
    fn test_incomplete_mapping_message_counts_items() {
        let missing = |id: i64, name: &str| MissingItem {
            id,
            name: name.to_string(),
        };
        let err = Error::IncompleteMapping {
            missing_positions: vec![missing(3, "FM"), missing(4, "Zakereen")],
            missing_payment_definitions: vec![missing(9, "Niyaz")],
        };
        assert_eq!(
            err.to_string(),
            "Mapping is incomplete: 2 position(s) and 1 payment definition(s) unmapped"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("definition mapping", 42);
        assert_eq!(err.to_string(), "definition mapping not found: 42");
    }
}
