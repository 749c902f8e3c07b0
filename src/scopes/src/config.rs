//! Registry configuration
//!
//! Aliases are an externally facing concern that deployments typically
//! want to change without touching the authorizer wiring, so they can be
//! loaded from a JSON document:
//!
//! ```json
//! {
//!   "duplicate_bindings": "reject",
//!   "type_aliases": { "dataset": "ds" },
//!   "action_aliases": [
//!     { "alias": "write", "action": "update", "entity_type": "ds" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What to do when a non-append registration targets a bound cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the earlier binding and log a warning
    #[default]
    Replace,
    /// Fail registration with `RegistryError::DuplicateBinding`
    Reject,
}

/// A single action alias entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAliasConfig {
    /// Externally facing action name
    pub alias: String,
    /// Canonical action checked internally
    pub action: String,
    /// Canonical entity type the alias applies to
    pub entity_type: String,
    /// Subscope the alias applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscope: Option<String>,
}

/// Registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Duplicate registration policy
    pub duplicate_bindings: DuplicatePolicy,

    /// Entity type aliases (alias -> canonical)
    pub type_aliases: BTreeMap<String, String>,

    /// Action aliases
    pub action_aliases: Vec<ActionAliasConfig>,
}

impl RegistryConfig {
    /// Parse a configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the duplicate registration policy
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_bindings = policy;
        self
    }

    /// Add an entity type alias
    pub fn with_type_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.type_aliases.insert(alias.into(), canonical.into());
        self
    }
}
