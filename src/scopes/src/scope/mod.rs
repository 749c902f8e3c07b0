/// Scope grammar module
///
/// This module provides the `Scope` value type and its canonical string
/// form, the one wire format shared with anything that stores or transmits
/// granted scopes.
///
/// # Examples
///
/// ```
/// use cretoai_scopes::scope::Scope;
///
/// let scope = Scope::parse("org:acme:read,update").unwrap();
/// assert_eq!(scope.entity_ref(), Some("acme"));
/// assert_eq!(scope.to_string(), "org:acme:read,update");
/// ```

mod types;

#[cfg(test)]
mod tests;

pub use types::{ActionSet, Scope, ScopeError, ScopeResult, WILDCARD};
