//! Authorization bindings for resources
//!
//! Resource permissions are derived from the permissions on the owning
//! dataset; there are no per-resource grants.

use async_trait::async_trait;

use super::dataset::{dataset_permissions, ORGANIZATION_ID};
use super::{all_actions, EntityChecks, HostPermissions};
use crate::authorizer::{normalize_ref_part, Authorizer, AuthorizerResult, EntityParams, EntityRefParser};
use crate::error::EntityRefError;
use crate::scope::{ActionSet, WILDCARD};

/// Entity type name for resources
pub const RESOURCE: &str = "res";

/// Parameter name for the owning dataset
pub const DATASET_ID: &str = "dataset_id";

/// Resource actions and the host permissions backing them
pub const RES_ENTITY_CHECKS: EntityChecks = &[
    ("read", Some("resource_show")),
    ("create", None),
    ("update", Some("resource_update")),
    ("delete", Some("resource_delete")),
];

/// Parses resource references
///
/// Accepts either a bare resource id or a full
/// `organization/dataset/resource` path. Empty path parts are unspecified.
/// A two-part reference is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceRefParser;

impl EntityRefParser for ResourceRefParser {
    fn param_names(&self) -> &[&str] {
        &["id", DATASET_ID, ORGANIZATION_ID]
    }

    fn parse(&self, entity_ref: &str) -> Result<EntityParams, EntityRefError> {
        let parts: Vec<&str> = entity_ref.splitn(3, '/').collect();
        match parts.as_slice() {
            [id] => Ok(EntityParams::new().with("id", Some(*id))),
            [org, dataset, id] => Ok(EntityParams::new()
                .with(ORGANIZATION_ID, Some(*org))
                .with(DATASET_ID, normalize_ref_part(dataset))
                .with("id", normalize_ref_part(id))),
            _ => Err(EntityRefError::new(RESOURCE, entity_ref)),
        }
    }
}

/// Computes resource permissions
///
/// Only "all resources of a dataset" requests are granted, taking the
/// dataset permissions restricted to resource actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceAuthorizer;

#[async_trait]
impl<H: HostPermissions> Authorizer<H> for ResourceAuthorizer {
    async fn authorize(&self, host: &H, params: &EntityParams) -> AuthorizerResult {
        match params.id() {
            None | Some(WILDCARD) => {
                let granted = dataset_permissions(host, params.get(DATASET_ID), params.get(ORGANIZATION_ID)).await?;
                let resource_actions = all_actions(RES_ENTITY_CHECKS);
                Ok(granted.intersection(&resource_actions).cloned().collect())
            }
            Some(_) => Ok(ActionSet::new()),
        }
    }

    fn required_params(&self) -> &[&str] {
        &["id", DATASET_ID, ORGANIZATION_ID]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(entity_ref: &str) -> EntityParams {
        ResourceRefParser.parse(entity_ref).unwrap()
    }

    #[test]
    fn test_full_path() {
        let params = parse("foo/bar/baz");
        assert_eq!(params.get(ORGANIZATION_ID), Some("foo"));
        assert_eq!(params.get(DATASET_ID), Some("bar"));
        assert_eq!(params.id(), Some("baz"));
    }

    #[test]
    fn test_bare_id() {
        let params = parse("baz");
        assert_eq!(params.id(), Some("baz"));
        assert!(!params.contains(DATASET_ID));
        assert!(!params.contains(ORGANIZATION_ID));
    }

    #[test]
    fn test_empty_and_wildcard_parts() {
        let params = parse("foo/bar/");
        assert_eq!(params.get(DATASET_ID), Some("bar"));
        assert_eq!(params.id(), None);

        let params = parse("foo/*/");
        assert_eq!(params.get(DATASET_ID), Some("*"));
        assert_eq!(params.id(), None);

        let params = parse("foo/*/*");
        assert_eq!(params.get(DATASET_ID), Some("*"));
        assert_eq!(params.id(), Some("*"));

        let params = parse("foo//");
        assert_eq!(params.get(ORGANIZATION_ID), Some("foo"));
        assert!(params.contains(DATASET_ID));
        assert_eq!(params.get(DATASET_ID), None);
        assert_eq!(params.id(), None);
    }

    #[test]
    fn test_two_parts_rejected() {
        let err = ResourceRefParser.parse("foo/bar").unwrap_err();
        assert_eq!(err.reference, "foo/bar");
    }
}
