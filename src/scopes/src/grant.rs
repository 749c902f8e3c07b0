//! Batch scope grants
//!
//! Resolves a client's list of requested scopes in one call, the way a
//! token endpoint would before minting a token for the granted subset.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::registry::ScopeRegistry;
use crate::scope::Scope;

/// Outcome of a batch grant request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrantSummary {
    /// Every requested scope, in canonical form and request order
    pub requested_scopes: Vec<String>,
    /// Scopes that were at least partially granted, in request order
    pub granted_scopes: Vec<String>,
}

impl GrantSummary {
    /// Whether nothing was granted
    pub fn is_empty(&self) -> bool {
        self.granted_scopes.is_empty()
    }
}

/// Split a space-separated scope list
pub fn split_scopes(scopes: &str) -> Vec<&str> {
    scopes.split_whitespace().collect()
}

/// Resolve a list of requested scopes
///
/// All scopes are parsed before any is resolved, so a malformed scope fails
/// the whole request without invoking an authorizer. Scopes granting
/// nothing are dropped from the result.
///
/// # Errors
///
/// Returns the first parse or resolution error; unknown entity types are
/// not skipped.
pub async fn authorize_scopes<C>(registry: &ScopeRegistry<C>, ctx: &C, scopes: &[&str]) -> Result<GrantSummary>
where
    C: Send + Sync + 'static,
{
    let requested = scopes
        .iter()
        .map(|s| Scope::parse(s))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let granted = try_join_all(requested.iter().map(|scope| registry.authorize_scope(ctx, scope))).await?;

    let summary = GrantSummary {
        requested_scopes: requested.iter().map(Scope::to_string).collect(),
        granted_scopes: granted.into_iter().flatten().map(|s| s.to_string()).collect(),
    };

    info!(
        "Granted {} of {} requested scopes",
        summary.granted_scopes.len(),
        summary.requested_scopes.len()
    );

    Ok(summary)
}
