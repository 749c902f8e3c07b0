//! Default bindings for a catalog host
//!
//! Maps the three entity kinds of a data catalog (organizations, datasets
//! and their resources) onto the host's own named permission checks. The
//! host supplies a [`HostPermissions`] implementation as the per-request
//! context; the authorizers here only translate between scope requests and
//! those checks.
//!
//! | Entity type | Reference form                     | Subscopes          |
//! |-------------|------------------------------------|--------------------|
//! | `org`       | `name`                             | -                  |
//! | `ds`        | `dataset`, `org/dataset`, `org/*`  | `data`, `metadata` |
//! | `res`       | `resource`, `org/dataset/resource` | `data`, `metadata` |
//!
//! # Example
//!
//! ```rust,no_run
//! use cretoai_scopes::bindings::{DefaultBindings, HostPermissions};
//! use cretoai_scopes::{RegistryConfig, ScopeRegistry};
//!
//! fn init<H: HostPermissions>() -> cretoai_scopes::Result<ScopeRegistry<H>> {
//!     ScopeRegistry::build(RegistryConfig::default(), &[&DefaultBindings])
//! }
//! ```

pub mod dataset;
pub mod organization;
pub mod resource;

pub use dataset::{DatasetAuthorizer, DatasetRefParser, DATASET, DS_ENTITY_CHECKS};
pub use organization::{normalize_org_scope, OrganizationAuthorizer, ORG, ORG_ENTITY_CHECKS};
pub use resource::{ResourceAuthorizer, ResourceRefParser, RESOURCE, RES_ENTITY_CHECKS};

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::{BoxError, Result};
use crate::registry::{Binding, BindingProvider, ScopeRegistry};
use crate::scope::ActionSet;

/// Subscopes shared by datasets and resources
pub const DATA_SUBSCOPES: [&str; 2] = ["data", "metadata"];

/// Table mapping scope actions to host permission names
///
/// Actions without a host permission are granted only through special
/// cases (sysadmin, collection-level checks).
pub type EntityChecks = &'static [(&'static str, Option<&'static str>)];

/// Data passed along with a host permission check
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessTarget {
    /// Entity the check applies to
    pub id: Option<String>,
    /// Owning organization
    pub owner_org: Option<String>,
}

impl AccessTarget {
    /// Target a specific entity
    pub fn entity(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            owner_org: None,
        }
    }

    /// Target the collection owned by an organization
    pub fn owned_by(owner_org: impl Into<String>) -> Self {
        Self {
            id: None,
            owner_org: Some(owner_org.into()),
        }
    }

    /// Attach the owning organization
    pub fn with_owner(mut self, owner_org: impl Into<String>) -> Self {
        self.owner_org = Some(owner_org.into());
        self
    }
}

/// Ownership of a dataset as seen by the current caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetOwner {
    /// Owning organization id
    pub owner_org: Option<String>,
    /// Owning organization name
    pub organization_name: Option<String>,
}

impl DatasetOwner {
    /// Whether the dataset belongs to the organization given by id or name
    pub fn belongs_to(&self, organization: &str) -> bool {
        self.owner_org.as_deref() == Some(organization)
            || self.organization_name.as_deref() == Some(organization)
    }
}

/// The host's existing permission system, bound to the current caller
///
/// "Not authorized" and "not found" answers from the host are both `false`;
/// errors are reserved for failures of the host itself.
#[async_trait]
pub trait HostPermissions: Send + Sync + 'static {
    /// Whether the caller bypasses all checks
    async fn is_sysadmin(&self) -> std::result::Result<bool, BoxError>;

    /// Run a named host permission check
    async fn check_access(&self, permission: &str, target: &AccessTarget) -> std::result::Result<bool, BoxError>;

    /// Caller's role in an organization, if a member
    async fn role_in_group(&self, group_id: &str) -> std::result::Result<Option<String>, BoxError>;

    /// Ownership of a dataset, `None` if it is missing or hidden from the caller
    async fn dataset_owner(&self, dataset_id: &str) -> std::result::Result<Option<DatasetOwner>, BoxError>;
}

/// Every action in a check table
pub fn all_actions(checks: EntityChecks) -> ActionSet {
    checks.iter().map(|(action, _)| action.to_string()).collect()
}

/// Actions in a check table backed by a host permission
pub fn checked_actions(checks: EntityChecks) -> ActionSet {
    checks
        .iter()
        .filter(|(_, permission)| permission.is_some())
        .map(|(action, _)| action.to_string())
        .collect()
}

/// Run every host permission in a check table and collect granted actions
pub async fn check_entity_permissions<H: HostPermissions>(
    host: &H,
    checks: EntityChecks,
    target: &AccessTarget,
) -> std::result::Result<ActionSet, BoxError> {
    let checked = checks
        .iter()
        .filter_map(|(action, permission)| permission.map(|p| (*action, p)));

    let results = try_join_all(checked.map(|(action, permission)| async move {
        let allowed = host.check_access(permission, target).await?;
        Ok::<_, BoxError>(allowed.then(|| action.to_string()))
    }))
    .await?;

    Ok(results.into_iter().flatten().collect())
}

/// Registers the `org`, `ds` and `res` entity types
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindings;

impl<H: HostPermissions> BindingProvider<H> for DefaultBindings {
    fn register_bindings(&self, registry: &mut ScopeRegistry<H>) -> Result<()> {
        registry.register_scope_normalizer(ORG, Arc::new(normalize_org_scope), None);
        registry.register_authorizer(
            ORG,
            Arc::new(OrganizationAuthorizer),
            Binding::new()
                .actions(ORG_ENTITY_CHECKS.iter().map(|(a, _)| *a))
                .with_default_action(),
        )?;

        registry.register_entity_ref_parser(DATASET, Arc::new(DatasetRefParser))?;
        registry.register_authorizer(
            DATASET,
            Arc::new(DatasetAuthorizer),
            Binding::new()
                .actions(DS_ENTITY_CHECKS.iter().map(|(a, _)| *a))
                .with_default_action()
                .subscopes(DATA_SUBSCOPES)
                .with_default_subscope(),
        )?;

        registry.register_entity_ref_parser(RESOURCE, Arc::new(ResourceRefParser))?;
        registry.register_authorizer(
            RESOURCE,
            Arc::new(ResourceAuthorizer),
            Binding::new()
                .actions(RES_ENTITY_CHECKS.iter().map(|(a, _)| *a))
                .with_default_action()
                .subscopes(DATA_SUBSCOPES)
                .with_default_subscope(),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_owner_matching() {
        let owner = DatasetOwner {
            owner_org: Some("0a1b".to_string()),
            organization_name: Some("acme".to_string()),
        };
        assert!(owner.belongs_to("0a1b"));
        assert!(owner.belongs_to("acme"));
        assert!(!owner.belongs_to("other"));
    }

    #[test]
    fn test_check_table_helpers() {
        let all = all_actions(ORG_ENTITY_CHECKS);
        let checked = checked_actions(ORG_ENTITY_CHECKS);

        assert_eq!(all.len(), 7);
        assert!(checked.is_subset(&all));
        assert!(!checked.contains("list"));
        assert!(!checked.contains("create"));
    }

    #[test]
    fn test_access_target_builders() {
        let target = AccessTarget::entity("ds1").with_owner("acme");
        assert_eq!(target.id.as_deref(), Some("ds1"));
        assert_eq!(target.owner_org.as_deref(), Some("acme"));
        assert_eq!(AccessTarget::owned_by("acme").id, None);
    }
}
