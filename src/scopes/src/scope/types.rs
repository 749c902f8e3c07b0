/// Scope type definitions and grammar
///
/// Provides the core Scope value type together with parsing from and
/// serialization to the canonical colon-separated string form.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between scope parts
const PART_SEPARATOR: char = ':';

/// Separator between actions in the action part
const ACTION_SEPARATOR: char = ',';

/// Marker for an intentionally omitted part
pub const WILDCARD: &str = "*";

/// Maximum number of colon-separated parts in a scope string
const MAX_PARTS: usize = 4;

/// Set of action identifiers, kept sorted for deterministic output
pub type ActionSet = BTreeSet<String>;

/// Result type for scope operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Errors that can occur while parsing or building a scope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Empty scope string provided
    #[error("Scope cannot be empty")]
    EmptyScope,

    /// More parts than the grammar allows
    #[error("Invalid scope format: expected at most 4 parts, got {0}")]
    TooManyParts(usize),

    /// Entity type part is empty
    #[error("Invalid scope format: entity type cannot be empty")]
    EmptyEntityType,

    /// A part contains a separator of the string form
    #[error("Invalid scope {part} '{value}': contains a reserved separator")]
    ReservedCharacter {
        /// Which part was rejected
        part: &'static str,
        /// The rejected value
        value: String,
    },

    /// `*` listed as an action name
    #[error("Invalid scope action: '*' is not an action name")]
    WildcardAction,
}

/// A requested or granted permission scope
///
/// The string form has between 1 and 4 colon separated parts:
///
/// - `entity_type[:ref[:actions]]`
/// - `entity_type[:ref[:subscope:actions]]`
///
/// Each optional part can be replaced with `*` if a following part is
/// specified, or omitted entirely otherwise. Multiple actions are comma
/// separated and compared as a set.
///
/// Every constructor and setter rejects values the string form cannot
/// carry, so any `Scope` serializes to a string that parses back to it.
///
/// # Examples
///
/// ```
/// use cretoai_scopes::Scope;
///
/// let scope: Scope = "ds:foobaz:meta:read".parse().unwrap();
/// assert_eq!(scope.entity_type(), "ds");
/// assert_eq!(scope.entity_ref(), Some("foobaz"));
/// assert_eq!(scope.subscope(), Some("meta"));
/// assert!(scope.actions().unwrap().contains("read"));
///
/// let scope = Scope::new("ds")?.with_actions(["write", "read"])?.with_subscope("meta")?;
/// assert_eq!(scope.to_string(), "ds:*:meta:read,write");
///
/// assert!(Scope::new("ds")?.with_ref("a:b").is_err());
/// # Ok::<(), cretoai_scopes::ScopeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope {
    /// Category of protected entity
    entity_type: String,
    /// Specific entity instance, `None` meaning any
    entity_ref: Option<String>,
    /// Sub-resource within the entity
    subscope: Option<String>,
    /// Requested or granted actions, `None` meaning unspecified
    actions: Option<ActionSet>,
}

impl Scope {
    /// Creates a scope covering every entity of a type
    ///
    /// # Errors
    ///
    /// * `EmptyEntityType` - the type is empty
    /// * `ReservedCharacter` - the type contains `:`
    pub fn new(entity_type: impl Into<String>) -> ScopeResult<Self> {
        let entity_type = entity_type.into();
        if entity_type.is_empty() {
            return Err(ScopeError::EmptyEntityType);
        }
        check_part("entity type", &entity_type, &[PART_SEPARATOR])?;

        Ok(Self {
            entity_type,
            entity_ref: None,
            subscope: None,
            actions: None,
        })
    }

    /// Parses a scope string
    ///
    /// # Arguments
    ///
    /// * `s` - The scope string (e.g., "org:acme:read")
    ///
    /// # Returns
    ///
    /// Returns a `ScopeResult<Self>` containing the parsed scope or an error
    pub fn parse(s: &str) -> ScopeResult<Self> {
        if s.is_empty() {
            return Err(ScopeError::EmptyScope);
        }

        let parts: Vec<&str> = s.split(PART_SEPARATOR).collect();
        if parts.len() > MAX_PARTS {
            return Err(ScopeError::TooManyParts(parts.len()));
        }

        let mut scope = Self::new(parts[0])?;
        if let Some(entity_ref) = parts.get(1) {
            scope.set_entity_ref(Some(*entity_ref))?;
        }

        match parts.len() {
            3 => scope.set_actions(parse_actions(parts[2]))?,
            4 => {
                scope.set_subscope(Some(parts[2]))?;
                scope.set_actions(parse_actions(parts[3]))?;
            }
            _ => {}
        }

        Ok(scope)
    }

    /// Restricts the scope to a specific entity
    pub fn with_ref(mut self, entity_ref: impl Into<String>) -> ScopeResult<Self> {
        self.set_entity_ref(Some(entity_ref.into()))?;
        Ok(self)
    }

    /// Restricts the scope to a sub-resource
    pub fn with_subscope(mut self, subscope: impl Into<String>) -> ScopeResult<Self> {
        self.set_subscope(Some(subscope.into()))?;
        Ok(self)
    }

    /// Restricts the scope to a set of actions
    pub fn with_actions<I, S>(mut self, actions: I) -> ScopeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_actions(Some(actions.into_iter().map(Into::into).collect()))?;
        Ok(self)
    }

    /// Returns the entity type
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the entity reference, if one was given
    pub fn entity_ref(&self) -> Option<&str> {
        self.entity_ref.as_deref()
    }

    /// Returns the subscope, if one was given
    pub fn subscope(&self) -> Option<&str> {
        self.subscope.as_deref()
    }

    /// Returns the action set, if actions were specified
    pub fn actions(&self) -> Option<&ActionSet> {
        self.actions.as_ref()
    }

    /// Sets the entity reference; empty and wildcard references mean any entity
    ///
    /// Leaves the scope unchanged on error.
    pub fn set_entity_ref<S: Into<String>>(&mut self, entity_ref: Option<S>) -> ScopeResult<()> {
        self.entity_ref = specified_part("reference", entity_ref)?;
        Ok(())
    }

    /// Sets the subscope; empty and wildcard subscopes mean no subscope
    ///
    /// Leaves the scope unchanged on error.
    pub fn set_subscope<S: Into<String>>(&mut self, subscope: Option<S>) -> ScopeResult<()> {
        self.subscope = specified_part("subscope", subscope)?;
        Ok(())
    }

    /// Sets the action set; empty names are dropped and an empty set means
    /// unspecified
    ///
    /// Leaves the scope unchanged on error.
    pub fn set_actions(&mut self, actions: Option<ActionSet>) -> ScopeResult<()> {
        let actions = actions
            .map(|set| set.into_iter().filter(|a| !a.is_empty()).collect::<ActionSet>())
            .filter(|set| !set.is_empty());

        for action in actions.iter().flatten() {
            if action == WILDCARD {
                return Err(ScopeError::WildcardAction);
            }
            check_part("action", action, &[PART_SEPARATOR, ACTION_SEPARATOR])?;
        }

        self.actions = actions;
        Ok(())
    }

    /// Marks the actions as unspecified
    pub fn clear_actions(&mut self) {
        self.actions = None;
    }

    /// Returns the canonical string form of this scope
    pub fn to_canonical_string(&self) -> String {
        let mut parts: Vec<&str> = vec![self.entity_type.as_str()];
        let actions = self
            .actions
            .as_ref()
            .map(|set| set.iter().map(String::as_str).collect::<Vec<_>>().join(","));

        match &self.entity_ref {
            Some(entity_ref) => parts.push(entity_ref),
            None if self.subscope.is_some() || actions.is_some() => parts.push(WILDCARD),
            None => {}
        }

        if let Some(subscope) = &self.subscope {
            parts.push(subscope);
            if actions.is_none() {
                parts.push(WILDCARD);
            }
        }

        let mut out = parts.join(":");
        if let Some(actions) = actions {
            out.push(PART_SEPARATOR);
            out.push_str(&actions);
        }
        out
    }
}

/// Splits the action part; `*` means unspecified
fn parse_actions(part: &str) -> Option<ActionSet> {
    if part == WILDCARD {
        return None;
    }
    Some(part.split(ACTION_SEPARATOR).map(str::to_string).collect())
}

/// Normalizes an optional part and rejects separators
fn specified_part<S: Into<String>>(part: &'static str, value: Option<S>) -> ScopeResult<Option<String>> {
    let value = value.map(Into::into).filter(|v| is_specified(v));
    if let Some(value) = &value {
        check_part(part, value, &[PART_SEPARATOR])?;
    }
    Ok(value)
}

fn check_part(part: &'static str, value: &str, reserved: &[char]) -> ScopeResult<()> {
    if value.contains(reserved) {
        return Err(ScopeError::ReservedCharacter {
            part,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn is_specified(part: &str) -> bool {
    !part.is_empty() && part != WILDCARD
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Scope {
    type Error = ScopeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_canonical_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}
