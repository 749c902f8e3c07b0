//! Scope registry
//!
//! Holds the mapping from externally requestable scopes to host permission
//! checks, and resolves requested scopes into granted ones.
//!
//! # Lifecycle
//!
//! ```text
//! RegistryConfig ─┐
//!                 ├─→ ScopeRegistry::build ─→ Arc<ScopeRegistry> ─→ authorize_scope (concurrent)
//! BindingProvider ┘     (single-threaded)         (read-only)
//! ```
//!
//! All registration happens through `&mut self` before the registry is
//! shared; resolution takes `&self` only, so a built registry can be
//! shared across tasks without further synchronization.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cretoai_scopes::{ActionSet, AuthorizerResult, Binding, EntityParams, Scope, ScopeRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry: ScopeRegistry = ScopeRegistry::new();
//! registry.register_authorizer(
//!     "org",
//!     Arc::new(|_: &(), _: &EntityParams| -> AuthorizerResult {
//!         Ok(ActionSet::from(["read".to_string(), "update".to_string()]))
//!     }),
//!     Binding::new(),
//! )?;
//! registry.register_type_alias("organization", "org");
//!
//! let granted = registry
//!     .authorize_scope(&(), &Scope::parse("organization:acme")?)
//!     .await?
//!     .unwrap();
//! assert_eq!(granted.to_string(), "organization:acme:read,update");
//! # Ok(())
//! # }
//! ```

mod binding;
mod resolve;


pub use binding::{Binding, BindingKey};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::authorizer::{Authorizer, EntityRefParser, ScopeNormalizer, DEFAULT_PARAM};
use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::error::{RegistryError, Result};

/// (canonical entity type, subscope) key for normalizers and buckets
type BucketKey = (String, Option<String>);

/// (canonical entity type, subscope, alias) key for action aliases
type ActionAliasKey = (String, Option<String>, String);

/// Supplies a group of registrations to a registry
///
/// Hosts implement this once per family of entity types and hand the
/// providers to [`ScopeRegistry::build`], which applies them in order.
pub trait BindingProvider<C>
where
    C: Send + Sync + 'static,
{
    /// Register authorizers, parsers, normalizers and aliases
    fn register_bindings(&self, registry: &mut ScopeRegistry<C>) -> Result<()>;
}

/// Scope-to-permission mapping registry
///
/// `C` is the per-request caller context passed through to authorizers.
pub struct ScopeRegistry<C = ()> {
    /// Duplicate registration policy
    duplicate_policy: DuplicatePolicy,

    /// Authorizer cells, each evaluated as a conjunction
    authorizers: HashMap<BindingKey, Vec<Arc<dyn Authorizer<C>>>>,

    /// Canonical entity types with at least one bound cell
    entity_types: BTreeSet<String>,

    /// Registered (entity type, subscope) buckets
    buckets: BTreeSet<BucketKey>,

    /// Entity reference parsers by canonical entity type
    ref_parsers: HashMap<String, Arc<dyn EntityRefParser>>,

    /// Scope normalizers by (canonical entity type, subscope)
    normalizers: HashMap<BucketKey, Arc<dyn ScopeNormalizer>>,

    /// Entity type aliases (alias -> canonical)
    type_aliases: HashMap<String, String>,

    /// Action aliases ((entity type, subscope, alias) -> canonical action)
    action_aliases: HashMap<ActionAliasKey, String>,
}

impl<C> ScopeRegistry<C>
where
    C: Send + Sync + 'static,
{
    /// Create an empty registry with the default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given policy and aliases
    pub fn with_config(config: RegistryConfig) -> Self {
        let mut registry = Self {
            duplicate_policy: config.duplicate_bindings,
            authorizers: HashMap::new(),
            entity_types: BTreeSet::new(),
            buckets: BTreeSet::new(),
            ref_parsers: HashMap::new(),
            normalizers: HashMap::new(),
            type_aliases: HashMap::new(),
            action_aliases: HashMap::new(),
        };

        for (alias, canonical) in config.type_aliases {
            registry.register_type_alias(alias, canonical);
        }
        for entry in config.action_aliases {
            registry.register_action_alias(
                entry.alias,
                entry.action,
                &entry.entity_type,
                entry.subscope.as_deref(),
            );
        }

        registry
    }

    /// Build a registry by applying providers in order
    ///
    /// This is the single initialization routine: once it returns, the
    /// registry is ready to be wrapped in an `Arc` and shared.
    pub fn build(config: RegistryConfig, providers: &[&dyn BindingProvider<C>]) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for provider in providers {
            provider.register_bindings(&mut registry)?;
        }

        info!(
            "ScopeRegistry built with {} entity types, {} authorizer cells, {} type aliases, {} action aliases",
            registry.entity_types.len(),
            registry.authorizers.len(),
            registry.type_aliases.len(),
            registry.action_aliases.len()
        );

        Ok(registry)
    }

    /// Bind an authorizer to the cells described by `binding`
    ///
    /// A non-append binding replaces whatever is bound to a cell, or fails
    /// under [`DuplicatePolicy::Reject`]. An append binding adds the
    /// authorizer to the cell's conjunction.
    ///
    /// # Errors
    ///
    /// * `ParameterMismatch` - the authorizer requires parameters the
    ///   entity type's reference parser does not produce
    /// * `DuplicateBinding` - a cell is already bound and the policy rejects
    ///   replacement
    pub fn register_authorizer(
        &mut self,
        entity_type: &str,
        authorizer: Arc<dyn Authorizer<C>>,
        binding: Binding,
    ) -> Result<()> {
        let available = self.available_params(entity_type);
        check_params(entity_type, authorizer.as_ref(), &available)?;

        if !binding.is_append() && self.duplicate_policy == DuplicatePolicy::Reject {
            for (subscope, action) in binding.cells() {
                let key = BindingKey::new(entity_type, subscope, action);
                if self.authorizers.get(&key).is_some_and(|bound| !bound.is_empty()) {
                    return Err(RegistryError::DuplicateBinding {
                        entity_type: key.entity_type,
                        subscope: key.subscope,
                        action: key.action,
                    });
                }
            }
        }

        for (subscope, action) in binding.cells() {
            let key = BindingKey::new(entity_type, subscope, action);
            let cell = self.authorizers.entry(key).or_default();

            if binding.is_append() {
                cell.push(Arc::clone(&authorizer));
            } else {
                if !cell.is_empty() {
                    warn!(
                        "Replacing {} authorizer(s) bound to {}[{}/{}]",
                        cell.len(),
                        entity_type,
                        subscope.unwrap_or("-"),
                        action.unwrap_or("-")
                    );
                }
                *cell = vec![Arc::clone(&authorizer)];
            }

            self.buckets
                .insert((entity_type.to_string(), subscope.map(str::to_string)));
        }

        self.entity_types.insert(entity_type.to_string());
        Ok(())
    }

    /// Register the reference parser for an entity type
    ///
    /// # Errors
    ///
    /// * `ParameterMismatch` - an already bound authorizer of this entity
    ///   type requires a parameter the parser does not produce
    pub fn register_entity_ref_parser(
        &mut self,
        entity_type: &str,
        parser: Arc<dyn EntityRefParser>,
    ) -> Result<()> {
        let available: Vec<String> = parser.param_names().iter().map(|p| p.to_string()).collect();
        for (key, bound) in &self.authorizers {
            if key.entity_type != entity_type {
                continue;
            }
            for authorizer in bound {
                check_params(entity_type, authorizer.as_ref(), &available)?;
            }
        }

        self.ref_parsers.insert(entity_type.to_string(), parser);
        Ok(())
    }

    /// Register a normalizer for granted scopes of an entity type and subscope
    pub fn register_scope_normalizer(
        &mut self,
        entity_type: &str,
        normalizer: Arc<dyn ScopeNormalizer>,
        subscope: Option<&str>,
    ) {
        self.normalizers.insert(
            (entity_type.to_string(), subscope.map(str::to_string)),
            normalizer,
        );
    }

    /// Let callers address `canonical` under the name `alias`
    pub fn register_type_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.type_aliases.insert(alias.into(), canonical.into());
    }

    /// Let callers request `canonical_action` under the name `alias`
    ///
    /// `entity_type` is the canonical entity type; the alias applies only
    /// to requests for the given subscope.
    pub fn register_action_alias(
        &mut self,
        alias: impl Into<String>,
        canonical_action: impl Into<String>,
        entity_type: &str,
        subscope: Option<&str>,
    ) {
        self.action_aliases.insert(
            (
                entity_type.to_string(),
                subscope.map(str::to_string),
                alias.into(),
            ),
            canonical_action.into(),
        );
    }

    /// Resolve an entity type through the alias table
    pub fn canonical_type<'a>(&'a self, entity_type: &'a str) -> &'a str {
        self.type_aliases
            .get(entity_type)
            .map(String::as_str)
            .unwrap_or(entity_type)
    }

    /// Whether an entity type (or alias) has registered authorizers
    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.entity_types.contains(self.canonical_type(entity_type))
    }

    /// Canonical entity types with registered authorizers
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entity_types.iter().map(String::as_str)
    }

    /// Parameter names an authorizer of `entity_type` can rely on
    fn available_params(&self, entity_type: &str) -> Vec<String> {
        match self.ref_parsers.get(entity_type) {
            Some(parser) => parser.param_names().iter().map(|p| p.to_string()).collect(),
            None => vec![DEFAULT_PARAM.to_string()],
        }
    }
}

impl<C> Default for ScopeRegistry<C>
where
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ScopeRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cells: Vec<_> = self.authorizers.keys().map(ToString::to_string).collect();
        cells.sort();

        f.debug_struct("ScopeRegistry")
            .field("duplicate_policy", &self.duplicate_policy)
            .field("cells", &cells)
            .field("ref_parsers", &self.ref_parsers.keys().collect::<BTreeSet<_>>())
            .field("normalizers", &self.normalizers.keys().collect::<BTreeSet<_>>())
            .field("type_aliases", &self.type_aliases)
            .field("action_aliases", &self.action_aliases)
            .finish()
    }
}

/// Ensure an authorizer's required parameters are all available
fn check_params<C>(
    entity_type: &str,
    authorizer: &dyn Authorizer<C>,
    available: &[String],
) -> Result<()> {
    let missing: Vec<String> = authorizer
        .required_params()
        .iter()
        .filter(|name| !available.iter().any(|a| a == *name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::ParameterMismatch {
            entity_type: entity_type.to_string(),
            missing,
        })
    }
}
