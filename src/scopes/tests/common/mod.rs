//! Shared test fixtures: an in-memory catalog host

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cretoai_scopes::bindings::{AccessTarget, DatasetOwner, HostPermissions};
use cretoai_scopes::BoxError;

/// Common test result type
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Host permission system backed by fixed tables
#[derive(Debug, Default)]
pub struct MockHost {
    sysadmin: bool,
    failing: bool,
    grants: HashSet<(String, AccessTarget)>,
    roles: HashMap<String, String>,
    datasets: HashMap<String, DatasetOwner>,
    checks: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sysadmin() -> Self {
        Self {
            sysadmin: true,
            ..Self::default()
        }
    }

    /// Host whose every check fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn allow(mut self, permission: &str, target: AccessTarget) -> Self {
        self.grants.insert((permission.to_string(), target));
        self
    }

    pub fn member_of(mut self, org: &str, role: &str) -> Self {
        self.roles.insert(org.to_string(), role.to_string());
        self
    }

    pub fn dataset(mut self, id: &str, owner_org: &str, organization_name: &str) -> Self {
        self.datasets.insert(
            id.to_string(),
            DatasetOwner {
                owner_org: Some(owner_org.to_string()),
                organization_name: Some(organization_name.to_string()),
            },
        );
        self
    }

    /// Number of `check_access` calls made so far
    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    fn fail_if_broken(&self) -> Result<(), BoxError> {
        if self.failing {
            return Err("host permission backend unavailable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl HostPermissions for MockHost {
    async fn is_sysadmin(&self) -> Result<bool, BoxError> {
        self.fail_if_broken()?;
        Ok(self.sysadmin)
    }

    async fn check_access(&self, permission: &str, target: &AccessTarget) -> Result<bool, BoxError> {
        self.fail_if_broken()?;
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.grants.contains(&(permission.to_string(), target.clone())))
    }

    async fn role_in_group(&self, group_id: &str) -> Result<Option<String>, BoxError> {
        self.fail_if_broken()?;
        Ok(self.roles.get(group_id).cloned())
    }

    async fn dataset_owner(&self, dataset_id: &str) -> Result<Option<DatasetOwner>, BoxError> {
        self.fail_if_broken()?;
        Ok(self.datasets.get(dataset_id).cloned())
    }
}
