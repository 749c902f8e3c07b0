//! Authorization bindings for datasets

use async_trait::async_trait;

use super::{all_actions, check_entity_permissions, AccessTarget, EntityChecks, HostPermissions};
use crate::authorizer::{normalize_ref_part, Authorizer, AuthorizerResult, EntityParams, EntityRefParser};
use crate::error::{BoxError, EntityRefError};
use crate::scope::{ActionSet, WILDCARD};

/// Entity type name for datasets
pub const DATASET: &str = "ds";

/// Dataset actions and the host permissions backing them
pub const DS_ENTITY_CHECKS: EntityChecks = &[
    ("read", Some("package_show")),
    ("list", None),
    ("create", None),
    ("update", Some("package_update")),
    ("delete", Some("package_delete")),
    ("patch", Some("package_update")),
    ("purge", Some("dataset_purge")),
];

/// Parameter name for the owning organization
pub const ORGANIZATION_ID: &str = "organization_id";

/// Parses dataset references
///
/// | Reference     | organization_id | id        |
/// |---------------|-----------------|-----------|
/// | `bar`         | -               | `bar`     |
/// | `foo/bar`     | `foo`           | `bar`     |
/// | `foo/bar/baz` | `foo`           | `bar/baz` |
/// | `foo/*`       | `foo`           | `*`       |
/// | `foo/`        | `foo`           | -         |
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetRefParser;

impl EntityRefParser for DatasetRefParser {
    fn param_names(&self) -> &[&str] {
        &["id", ORGANIZATION_ID]
    }

    fn parse(&self, entity_ref: &str) -> Result<EntityParams, EntityRefError> {
        let params = match entity_ref.split_once('/') {
            None => EntityParams::new().with("id", Some(entity_ref)),
            Some((org, id)) => EntityParams::new()
                .with(ORGANIZATION_ID, Some(org))
                .with("id", normalize_ref_part(id)),
        };
        Ok(params)
    }
}

/// Computes dataset permissions
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetAuthorizer;

#[async_trait]
impl<H: HostPermissions> Authorizer<H> for DatasetAuthorizer {
    async fn authorize(&self, host: &H, params: &EntityParams) -> AuthorizerResult {
        dataset_permissions(host, params.id(), params.get(ORGANIZATION_ID)).await
    }

    fn required_params(&self) -> &[&str] {
        &["id", ORGANIZATION_ID]
    }
}

/// Dataset permissions for a dataset id and owning organization
///
/// Either part may be unspecified (`None`) or a wildcard.
pub async fn dataset_permissions<H: HostPermissions>(
    host: &H,
    id: Option<&str>,
    organization_id: Option<&str>,
) -> Result<ActionSet, BoxError> {
    let organization_id = match organization_id {
        None | Some(WILDCARD) => return unknown_org_permissions(host, id, organization_id).await,
        Some(org) => org,
    };

    let id = match id {
        None | Some(WILDCARD) => return unknown_dataset_permissions(host, id, organization_id).await,
        Some(id) => id,
    };

    if !dataset_in_org(host, id, organization_id).await? {
        // hidden or foreign datasets get nothing
        return Ok(ActionSet::new());
    }

    let target = AccessTarget::entity(id).with_owner(organization_id);
    check_entity_permissions(host, DS_ENTITY_CHECKS, &target).await
}

/// Permissions when no specific organization was given
async fn unknown_org_permissions<H: HostPermissions>(
    host: &H,
    id: Option<&str>,
    organization_id: Option<&str>,
) -> Result<ActionSet, BoxError> {
    if host.is_sysadmin().await? {
        return Ok(all_actions(DS_ENTITY_CHECKS));
    }

    // regular users get no wildcard-org or global dataset permissions
    if organization_id == Some(WILDCARD) {
        return Ok(ActionSet::new());
    }
    let id = match id {
        None | Some(WILDCARD) => return Ok(ActionSet::new()),
        Some(id) => id,
    };

    check_entity_permissions(host, DS_ENTITY_CHECKS, &AccessTarget::entity(id)).await
}

/// Permissions on the datasets of an organization when no dataset was given
async fn unknown_dataset_permissions<H: HostPermissions>(
    host: &H,
    id: Option<&str>,
    organization_id: &str,
) -> Result<ActionSet, BoxError> {
    let mut granted = ActionSet::new();
    let collection = AccessTarget::owned_by(organization_id);

    if host.check_access("package_create", &collection).await? {
        granted.insert("create".to_string());
    }
    if host.check_access("package_list", &collection).await? {
        granted.insert("list".to_string());
    }

    if id == Some(WILDCARD) {
        let org = AccessTarget::entity(organization_id);

        // only members read every dataset of the organization
        if host.role_in_group(organization_id).await?.is_some() {
            granted.insert("read".to_string());
        }
        if host.check_access("organization_update", &org).await? {
            granted.extend(["update".to_string(), "patch".to_string()]);
        }
        if host.check_access("organization_delete", &org).await? {
            granted.insert("delete".to_string());
        }
    }

    Ok(granted)
}

/// Whether a dataset exists, is visible, and belongs to the organization
async fn dataset_in_org<H: HostPermissions>(
    host: &H,
    id: &str,
    organization_id: &str,
) -> Result<bool, BoxError> {
    Ok(host
        .dataset_owner(id)
        .await?
        .is_some_and(|owner| owner.belongs_to(organization_id)))
}
