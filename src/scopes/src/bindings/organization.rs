//! Authorization bindings for organizations

use async_trait::async_trait;

use super::{all_actions, check_entity_permissions, checked_actions, AccessTarget, EntityChecks, HostPermissions};
use crate::authorizer::{Authorizer, AuthorizerResult, EntityParams, DEFAULT_PARAM};
use crate::scope::{ActionSet, Scope};

/// Entity type name for organizations
pub const ORG: &str = "org";

/// Organization actions and the host permissions backing them
pub const ORG_ENTITY_CHECKS: EntityChecks = &[
    ("read", Some("organization_show")),
    ("list", None),
    ("create", None),
    ("update", Some("organization_update")),
    ("delete", Some("organization_delete")),
    ("patch", Some("organization_patch")),
    ("purge", Some("organization_purge")),
];

/// Computes organization permissions
///
/// Sysadmins get every action, including collection-level ones. Without a
/// reference only `list` and `create` are considered.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationAuthorizer;

#[async_trait]
impl<H: HostPermissions> Authorizer<H> for OrganizationAuthorizer {
    async fn authorize(&self, host: &H, params: &EntityParams) -> AuthorizerResult {
        if host.is_sysadmin().await? {
            return Ok(all_actions(ORG_ENTITY_CHECKS));
        }

        let Some(id) = params.id() else {
            let mut granted = ActionSet::new();
            let any = AccessTarget::default();
            if host.check_access("organization_list", &any).await? {
                granted.insert("list".to_string());
            }
            if host.check_access("organization_create", &any).await? {
                granted.insert("create".to_string());
            }
            return Ok(granted);
        };

        check_entity_permissions(host, ORG_ENTITY_CHECKS, &AccessTarget::entity(id)).await
    }

    fn required_params(&self) -> &[&str] {
        &[DEFAULT_PARAM]
    }
}

/// Collapse a complete grant on a specific organization to "all actions"
///
/// Applies only when the caller requested no specific actions.
pub fn normalize_org_scope(requested: &Scope, mut granted: Scope) -> Scope {
    if requested.actions().is_none()
        && requested.entity_ref().is_some()
        && granted.actions() == Some(&checked_actions(ORG_ENTITY_CHECKS))
    {
        granted.clear_actions();
    }
    granted
}
