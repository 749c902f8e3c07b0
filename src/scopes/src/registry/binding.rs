//! Authorizer table keys and registration options

use std::fmt;

/// Composite key of one authorizer cell
///
/// `None` subscope means "applies regardless of subscope"; `None` action
/// is the default check used when no specific action is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    /// Canonical entity type
    pub entity_type: String,
    /// Subscope bucket
    pub subscope: Option<String>,
    /// Action cell
    pub action: Option<String>,
}

impl BindingKey {
    /// Create a new key
    pub fn new(entity_type: &str, subscope: Option<&str>, action: Option<&str>) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            subscope: subscope.map(str::to_string),
            action: action.map(str::to_string),
        }
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}/{}]",
            self.entity_type,
            self.subscope.as_deref().unwrap_or("-"),
            self.action.as_deref().unwrap_or("-")
        )
    }
}

/// Which cells an authorizer is bound to
///
/// The authorizer is bound to every combination of the listed subscopes
/// and actions. An omitted dimension binds the "no filter" cell only.
///
/// # Examples
///
/// ```
/// use cretoai_scopes::Binding;
///
/// // read/update cells plus the default cell, in the `data` and default buckets
/// let binding = Binding::new()
///     .actions(["read", "update"])
///     .with_default_action()
///     .subscopes(["data"])
///     .with_default_subscope();
/// assert_eq!(binding.cells().count(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    actions: Vec<Option<String>>,
    subscopes: Vec<Option<String>>,
    append: bool,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            actions: vec![None],
            subscopes: vec![None],
            append: false,
        }
    }
}

impl Binding {
    /// Bind the default cell of the default bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind specific actions instead of the default cell
    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(|a| Some(a.into())).collect();
        self
    }

    /// Also bind the default (no action) cell
    pub fn with_default_action(mut self) -> Self {
        if !self.actions.contains(&None) {
            self.actions.push(None);
        }
        self
    }

    /// Bind specific subscopes instead of the default bucket
    pub fn subscopes<I, S>(mut self, subscopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscopes = subscopes.into_iter().map(|s| Some(s.into())).collect();
        self
    }

    /// Also bind the default (no subscope) bucket
    pub fn with_default_subscope(mut self) -> Self {
        if !self.subscopes.contains(&None) {
            self.subscopes.push(None);
        }
        self
    }

    /// Add to existing cells instead of replacing them
    ///
    /// Every authorizer in a cell must grant an action for it to count.
    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }

    /// Whether this binding appends
    pub fn is_append(&self) -> bool {
        self.append
    }

    /// Iterate over every (subscope, action) cell
    pub fn cells(&self) -> impl Iterator<Item = (Option<&str>, Option<&str>)> {
        self.subscopes.iter().flat_map(move |s| {
            self.actions
                .iter()
                .map(move |a| (s.as_deref(), a.as_deref()))
        })
    }
}
