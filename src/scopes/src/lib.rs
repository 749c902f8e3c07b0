//! # CretoAI Scope Registry
//!
//! Maps OAuth-like scope requests onto a host application's existing
//! permission checks.
//!
//! ## Features
//!
//! - **Scope grammar** `entity_type[:ref[:subscope]:actions]` with wildcard handling
//! - **Pluggable authorizers** bound per entity type, subscope and action
//! - **Conjunctive bindings**: appended authorizers must all agree
//! - **Type and action aliases** resolved before lookup
//! - **Async-first resolution**, actions evaluated concurrently
//! - **Default catalog bindings** for organizations, datasets and resources
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cretoai_scopes::{ActionSet, AuthorizerResult, Binding, EntityParams, Scope, ScopeRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry: ScopeRegistry = ScopeRegistry::new();
//!     registry.register_authorizer(
//!         "ds",
//!         Arc::new(|_: &(), params: &EntityParams| -> AuthorizerResult {
//!             let mut granted = ActionSet::new();
//!             if params.id() == Some("public") {
//!                 granted.insert("read".to_string());
//!             }
//!             Ok(granted)
//!         }),
//!         Binding::new(),
//!     )?;
//!
//!     let requested = Scope::parse("ds:public:read,update")?;
//!     if let Some(granted) = registry.authorize_scope(&(), &requested).await? {
//!         println!("Granted {}", granted);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod authorizer;
pub mod bindings;
pub mod config;
pub mod error;
pub mod grant;
pub mod registry;
pub mod scope;

// Re-export commonly used types
pub use authorizer::{Authorizer, AuthorizerResult, EntityParams, EntityRefParser, ScopeNormalizer};
pub use config::{ActionAliasConfig, DuplicatePolicy, RegistryConfig};
pub use error::{BoxError, EntityRefError, RegistryError, Result};
pub use grant::{authorize_scopes, GrantSummary};
pub use registry::{Binding, BindingKey, BindingProvider, ScopeRegistry};
pub use scope::{ActionSet, Scope, ScopeError, WILDCARD};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
