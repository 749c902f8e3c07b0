//! Error types for the scope registry

use thiserror::Error;

use crate::scope::ScopeError;

/// Opaque error raised by an externally supplied authorizer
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error raised by an entity reference parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected {kind} reference structure: {reference}")]
pub struct EntityRefError {
    /// Kind of entity the parser handles (e.g., "resource")
    pub kind: String,
    /// The offending reference
    pub reference: String,
}

impl EntityRefError {
    /// Create a new reference error
    pub fn new(kind: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reference: reference.into(),
        }
    }
}

/// Scope registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Malformed scope string
    #[error("Invalid scope: {0}")]
    ScopeSyntax(#[from] ScopeError),

    /// Requested entity type has no registered authorizers
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Entity reference could not be decomposed
    #[error("Invalid entity reference for '{entity_type}': {source}")]
    InvalidEntityRef {
        /// Entity type whose parser rejected the reference
        entity_type: String,
        /// Parser error
        #[source]
        source: EntityRefError,
    },

    /// Authorizer needs parameters the entity type does not provide
    #[error("Authorizer for '{entity_type}' requires parameters not produced by its reference parser: {missing:?}")]
    ParameterMismatch {
        /// Entity type being registered
        entity_type: String,
        /// Required parameter names with no producer
        missing: Vec<String>,
    },

    /// Second non-append registration for the same cell
    #[error("Duplicate authorizer binding for {entity_type} (subscope={subscope:?}, action={action:?})")]
    DuplicateBinding {
        /// Entity type of the cell
        entity_type: String,
        /// Subscope of the cell
        subscope: Option<String>,
        /// Action of the cell
        action: Option<String>,
    },

    /// Invalid registry configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorizer granted an action name a scope cannot express
    #[error("Authorizer granted an unrepresentable action: {0}")]
    InvalidGrant(#[source] ScopeError),

    /// Failure raised by an authorizer, passed through unchanged
    #[error(transparent)]
    Authorizer(BoxError),
}

impl RegistryError {
    /// Whether the error stems from the request rather than the host
    ///
    /// Boundary layers translate these into validation failures and
    /// surface everything else as internal errors.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ScopeSyntax(_) | Self::UnknownEntityType(_) | Self::InvalidEntityRef { .. }
        )
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
