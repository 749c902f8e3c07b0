//! Scope resolution
//!
//! Turns a requested scope into the set of granted actions by consulting
//! the registry tables and invoking the bound authorizers.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::try_join_all;
use tracing::debug;

use super::{BindingKey, ScopeRegistry};
use crate::authorizer::EntityParams;
use crate::error::{RegistryError, Result};
use crate::scope::{ActionSet, Scope};

impl<C> ScopeRegistry<C>
where
    C: Send + Sync + 'static,
{
    /// Check a requested scope and return the granted scope
    ///
    /// Wraps [`granted_actions`](Self::granted_actions): returns `None` when
    /// nothing is granted, otherwise a copy of the request carrying the
    /// granted actions, passed through the normalizer registered for the
    /// entity type and subscope if there is one.
    ///
    /// Fails with `InvalidGrant` when an authorizer reports an action name
    /// that a scope string cannot carry.
    pub async fn authorize_scope(&self, ctx: &C, scope: &Scope) -> Result<Option<Scope>> {
        let actions = self.granted_actions(ctx, scope).await?;
        if actions.is_empty() {
            debug!("No actions granted for scope {}", scope);
            return Ok(None);
        }

        let mut granted = scope.clone();
        granted
            .set_actions(Some(actions))
            .map_err(RegistryError::InvalidGrant)?;

        let key = (
            self.canonical_type(scope.entity_type()).to_string(),
            scope.subscope().map(str::to_string),
        );
        if let Some(normalizer) = self.normalizers.get(&key) {
            granted = normalizer.normalize(scope, granted);
            debug!("Normalized granted scope for {} to {}", scope, granted);
        }

        Ok(Some(granted))
    }

    /// Compute the actions granted for a requested scope
    ///
    /// # Algorithm
    ///
    /// 1. Resolve the entity type alias; unknown types are an error
    /// 2. Pick the subscope bucket, falling back to the default bucket
    /// 3. With actions requested, evaluate each canonical action against
    ///    its own cell (or the bucket's default cell when the action has
    ///    none); an action is granted when its cell's result contains it,
    ///    and is reported under the name the caller used
    /// 4. Without actions, evaluate the bucket's default cell
    ///
    /// Authorizers bound to the same cell are intersected. A cell only
    /// decides the actions it is consulted for, so an action denied by its
    /// own cell stays denied whatever other cells report. An empty set
    /// means fully denied.
    ///
    /// # Errors
    ///
    /// * `UnknownEntityType` - no authorizer is registered for the type
    /// * `InvalidEntityRef` - the reference parser rejected the reference
    /// * `Authorizer` - an authorizer failed; passed through unchanged
    pub async fn granted_actions(&self, ctx: &C, scope: &Scope) -> Result<ActionSet> {
        let entity_type = self.canonical_type(scope.entity_type());
        if !self.entity_types.contains(entity_type) {
            return Err(RegistryError::UnknownEntityType(scope.entity_type().to_string()));
        }

        let bucket = self.bucket_for(entity_type, scope.subscope());
        let params = self.entity_params(entity_type, scope.entity_ref())?;

        debug!(
            "Resolving scope {}: entity_type={}, bucket={}",
            scope,
            entity_type,
            bucket.unwrap_or("-")
        );

        let Some(requested) = scope.actions() else {
            let key = BindingKey::new(entity_type, bucket, None);
            return self.evaluate_cell(ctx, &key, &params).await;
        };

        let action_map = self.action_map(entity_type, scope.subscope(), requested);
        let evaluations = action_map.keys().map(|action| {
            let key = self.cell_for_action(entity_type, bucket, action);
            let params = &params;
            async move {
                let granted = self.evaluate_cell(ctx, &key, params).await?;
                Ok::<_, RegistryError>(granted.contains(action))
            }
        });
        let verdicts = try_join_all(evaluations).await?;

        Ok(action_map
            .into_iter()
            .zip(verdicts)
            .filter(|(_, granted)| *granted)
            .flat_map(|((_, names), _)| names)
            .collect())
    }

    /// Evaluate every authorizer bound to a cell and intersect the results
    async fn evaluate_cell(&self, ctx: &C, key: &BindingKey, params: &EntityParams) -> Result<ActionSet> {
        let Some(bound) = self.authorizers.get(key).filter(|bound| !bound.is_empty()) else {
            debug!("No authorizer bound to {}, denying", key);
            return Ok(ActionSet::new());
        };

        let results = try_join_all(bound.iter().map(|authorizer| authorizer.authorize(ctx, params)))
            .await
            .map_err(RegistryError::Authorizer)?;

        Ok(intersect_all(results))
    }

    /// Subscope bucket to consult for a request
    fn bucket_for<'a>(&self, entity_type: &str, subscope: Option<&'a str>) -> Option<&'a str> {
        subscope.filter(|s| {
            self.buckets
                .contains(&(entity_type.to_string(), Some(s.to_string())))
        })
    }

    /// Cell for a canonical action, or the bucket's default cell if unbound
    fn cell_for_action(&self, entity_type: &str, bucket: Option<&str>, action: &str) -> BindingKey {
        let key = BindingKey::new(entity_type, bucket, Some(action));
        if self.authorizers.contains_key(&key) {
            key
        } else {
            BindingKey::new(entity_type, bucket, None)
        }
    }

    /// Map each canonical action to the names it was requested under
    fn action_map(
        &self,
        entity_type: &str,
        subscope: Option<&str>,
        requested: &ActionSet,
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for action in requested {
            let key = (
                entity_type.to_string(),
                subscope.map(str::to_string),
                action.clone(),
            );
            let canonical = self.action_aliases.get(&key).unwrap_or(action);
            map.entry(canonical.clone()).or_default().insert(action.clone());
        }
        map
    }

    /// Derive the authorizer parameters from an entity reference
    fn entity_params(&self, entity_type: &str, entity_ref: Option<&str>) -> Result<EntityParams> {
        match (entity_ref, self.ref_parsers.get(entity_type)) {
            (Some(entity_ref), Some(parser)) => {
                parser
                    .parse(entity_ref)
                    .map_err(|source| RegistryError::InvalidEntityRef {
                        entity_type: entity_type.to_string(),
                        source,
                    })
            }
            _ => Ok(EntityParams::from_ref(entity_ref)),
        }
    }
}

/// Intersect a list of action sets; an empty list yields an empty set
fn intersect_all(results: Vec<ActionSet>) -> ActionSet {
    let mut iter = results.into_iter();
    let Some(mut acc) = iter.next() else {
        return ActionSet::new();
    };
    for set in iter {
        acc.retain(|action| set.contains(action));
    }
    acc
}
