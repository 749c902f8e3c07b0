//! Contracts for externally supplied callables
//!
//! The registry performs structural dispatch and set algebra only. The
//! actual permission logic lives in three kinds of host-supplied callables:
//!
//! - [`Authorizer`]: computes the actions granted on an entity
//! - [`EntityRefParser`]: decomposes a compound entity reference
//! - [`ScopeNormalizer`]: post-processes a granted scope
//!
//! Plain closures implement all three through blanket impls, which keeps
//! test doubles short.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{BoxError, EntityRefError};
use crate::scope::{ActionSet, Scope};

/// Parameter name used when no reference parser is registered
pub const DEFAULT_PARAM: &str = "id";

/// Result returned by an authorizer
pub type AuthorizerResult = std::result::Result<ActionSet, BoxError>;

/// Named parameters derived from an entity reference
///
/// A missing key and a key mapped to `None` both mean "unspecified".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityParams {
    params: BTreeMap<String, Option<String>>,
}

impl EntityParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Default parameter set: the raw reference under `id`
    pub fn from_ref(entity_ref: Option<&str>) -> Self {
        Self::new().with(DEFAULT_PARAM, entity_ref)
    }

    /// Add a parameter
    pub fn with(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.insert(name, value.map(str::to_string));
        self
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.params.insert(name.into(), value);
    }

    /// Get a parameter value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.as_deref())
    }

    /// Shorthand for the `id` parameter
    pub fn id(&self) -> Option<&str> {
        self.get(DEFAULT_PARAM)
    }

    /// Whether a parameter name is present, even if unspecified
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Iterate over parameter names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}

/// Computes the actions a caller is granted on an entity
///
/// `C` is the per-request caller context handed to the resolution calls.
/// Implementations must return an empty set to signal "no access" and
/// reserve errors for genuine failures, which propagate to the caller
/// unchanged.
#[async_trait]
pub trait Authorizer<C>: Send + Sync {
    /// Compute the granted actions for the entity described by `params`
    async fn authorize(&self, ctx: &C, params: &EntityParams) -> AuthorizerResult;

    /// Parameter names this authorizer reads
    ///
    /// Checked at registration time against the names the entity type's
    /// reference parser produces. Empty means no requirement.
    fn required_params(&self) -> &[&str] {
        &[]
    }
}

#[async_trait]
impl<C, F> Authorizer<C> for F
where
    C: Send + Sync,
    F: Fn(&C, &EntityParams) -> AuthorizerResult + Send + Sync,
{
    async fn authorize(&self, ctx: &C, params: &EntityParams) -> AuthorizerResult {
        self(ctx, params)
    }
}

/// Decomposes a compound entity reference into named parameters
pub trait EntityRefParser: Send + Sync {
    /// Every parameter name `parse` may produce
    fn param_names(&self) -> &[&str];

    /// Parse a non-empty reference string
    fn parse(&self, entity_ref: &str) -> std::result::Result<EntityParams, EntityRefError>;
}

/// Post-processes a granted scope before it is returned
pub trait ScopeNormalizer: Send + Sync {
    /// Return the normalized grant
    fn normalize(&self, requested: &Scope, granted: Scope) -> Scope;
}

impl<F> ScopeNormalizer for F
where
    F: Fn(&Scope, Scope) -> Scope + Send + Sync,
{
    fn normalize(&self, requested: &Scope, granted: Scope) -> Scope {
        self(requested, granted)
    }
}

/// Normalizes an empty reference segment to "unspecified"
pub fn normalize_ref_part(part: &str) -> Option<&str> {
    if part.is_empty() {
        None
    } else {
        Some(part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = EntityParams::from_ref(Some("acme"));
        assert_eq!(params.id(), Some("acme"));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["id"]);

        let params = EntityParams::from_ref(None);
        assert!(params.contains("id"));
        assert_eq!(params.id(), None);
    }

    #[test]
    fn test_missing_param_is_unspecified() {
        let params = EntityParams::new().with("id", Some("foo"));
        assert_eq!(params.get("organization_id"), None);
        assert!(!params.contains("organization_id"));
    }

    #[tokio::test]
    async fn test_closure_authorizer() {
        let check = |_: &(), params: &EntityParams| -> AuthorizerResult {
            Ok(params.id().map(|_| ActionSet::from(["read".to_string()])).unwrap_or_default())
        };

        let granted = check.authorize(&(), &EntityParams::from_ref(Some("x"))).await.unwrap();
        assert!(granted.contains("read"));
        assert!(Authorizer::<()>::required_params(&check).is_empty());
    }

    #[test]
    fn test_closure_normalizer() {
        let collapse = |_: &Scope, mut granted: Scope| {
            granted.clear_actions();
            granted
        };
        let requested = Scope::parse("org").unwrap();
        let granted = collapse.normalize(&requested, Scope::parse("org:*:read").unwrap());
        assert!(granted.actions().is_none());
    }

    #[test]
    fn test_normalize_ref_part() {
        assert_eq!(normalize_ref_part(""), None);
        assert_eq!(normalize_ref_part("*"), Some("*"));
    }
}
