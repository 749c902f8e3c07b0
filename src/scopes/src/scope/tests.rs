/// Test suite for the scope grammar
///
/// Tests cover:
/// - Parsing of every part-count shape
/// - Canonical serialization
/// - Round-trip property
/// - Serde string representation

use super::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn actions(list: &[&str]) -> Option<BTreeSet<String>> {
    Some(list.iter().map(|a| a.to_string()).collect())
}

// ============================================================================
// Parsing Tests
// ============================================================================

#[test]
fn test_scope_parsing() {
    let cases = vec![
        ("org:myorg:*", "org", Some("myorg"), None, None),
        ("org:myorg", "org", Some("myorg"), None, None),
        ("ds", "ds", None, None, None),
        ("ds:*", "ds", None, None, None),
        ("ds:*:read", "ds", None, None, actions(&["read"])),
        ("ds:foobaz:meta:read", "ds", Some("foobaz"), Some("meta"), actions(&["read"])),
        ("ds:foobaz:*:read", "ds", Some("foobaz"), None, actions(&["read"])),
        ("ds:foobaz:meta:*", "ds", Some("foobaz"), Some("meta"), None),
        ("ds:foobaz:delete", "ds", Some("foobaz"), None, actions(&["delete"])),
        ("ds:foobaz:create,delete", "ds", Some("foobaz"), None, actions(&["create", "delete"])),
    ];

    for (input, entity_type, entity_ref, subscope, expected_actions) in cases {
        let scope = Scope::parse(input).unwrap();
        assert_eq!(scope.entity_type(), entity_type, "entity type of {}", input);
        assert_eq!(scope.entity_ref(), entity_ref, "entity ref of {}", input);
        assert_eq!(scope.subscope(), subscope, "subscope of {}", input);
        assert_eq!(scope.actions(), expected_actions.as_ref(), "actions of {}", input);
    }
}

#[test]
fn test_scope_validation_errors() {
    assert_eq!(Scope::parse(""), Err(ScopeError::EmptyScope));
    assert_eq!(Scope::parse("org:a:b:c:d"), Err(ScopeError::TooManyParts(5)));
    assert_eq!(Scope::parse(":a:read"), Err(ScopeError::EmptyEntityType));
}

#[test]
fn test_action_order_is_irrelevant() {
    let a = Scope::parse("ds:foo:update,read").unwrap();
    let b = Scope::parse("ds:foo:read,update").unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Serialization Tests
// ============================================================================

fn build(entity_type: &str, entity_ref: Option<&str>, subscope: Option<&str>, actions: &[&str]) -> Scope {
    let mut scope = Scope::new(entity_type).unwrap();
    scope.set_entity_ref(entity_ref).unwrap();
    scope.set_subscope(subscope).unwrap();
    scope
        .set_actions(Some(actions.iter().map(|a| a.to_string()).collect()))
        .unwrap();
    scope
}

#[test]
fn test_scope_stringify() {
    let cases = vec![
        (build("org", Some("myorg"), None, &[]), "org:myorg"),
        (build("org", Some("myorg"), Some("meta"), &[]), "org:myorg:meta:*"),
        (build("ds", None, None, &[]), "ds"),
        (build("ds", Some("foobaz"), None, &["read"]), "ds:foobaz:read"),
        (build("ds", Some("foobaz"), Some("meta"), &["read"]), "ds:foobaz:meta:read"),
        (build("ds", None, Some("meta"), &["read"]), "ds:*:meta:read"),
        (build("ds", None, Some("meta"), &["write", "read"]), "ds:*:meta:read,write"),
        (build("ds", None, Some("meta"), &[]), "ds:*:meta:*"),
    ];

    for (scope, expected) in cases {
        assert_eq!(scope.to_string(), expected);
    }
}

#[test]
fn test_trailing_wildcards_omitted() {
    let scope = Scope::parse("org:*:*").unwrap();
    assert_eq!(scope.to_string(), "org");

    let scope = Scope::parse("org:acme:*:*").unwrap();
    assert_eq!(scope.to_string(), "org:acme");
}

#[test]
fn test_serde_uses_canonical_string() {
    let scope = build("ds", Some("foo"), None, &["update", "read"]);
    let json = serde_json::to_string(&scope).unwrap();
    assert_eq!(json, "\"ds:foo:read,update\"");

    let back: Scope = serde_json::from_str(&json).unwrap();
    assert_eq!(back, scope);

    assert!(serde_json::from_str::<Scope>("\"\"").is_err());
}

// ============================================================================
// Builder Validation Tests
// ============================================================================

#[test]
fn test_builders_reject_separators() {
    let org = Scope::new("org").unwrap();

    assert_eq!(Scope::new(""), Err(ScopeError::EmptyEntityType));
    assert!(matches!(
        Scope::new("org:acme"),
        Err(ScopeError::ReservedCharacter { part: "entity type", .. })
    ));
    assert!(matches!(
        org.clone().with_ref("a:b"),
        Err(ScopeError::ReservedCharacter { part: "reference", ref value }) if value == "a:b"
    ));
    assert!(matches!(
        org.clone().with_subscope("data:read"),
        Err(ScopeError::ReservedCharacter { part: "subscope", .. })
    ));
    assert!(matches!(
        org.clone().with_actions(["read,update"]),
        Err(ScopeError::ReservedCharacter { part: "action", .. })
    ));
    assert!(matches!(
        org.clone().with_actions(["read:x"]),
        Err(ScopeError::ReservedCharacter { part: "action", .. })
    ));
    assert_eq!(org.with_actions(["*"]), Err(ScopeError::WildcardAction));
}

#[test]
fn test_separators_allowed_where_unambiguous() {
    let scope = Scope::new("org").unwrap().with_ref("a,b").unwrap();
    assert_eq!(scope.to_string(), "org:a,b");
    assert_eq!(Scope::parse("org:a,b").unwrap(), scope);
}

#[test]
fn test_rejected_setter_leaves_scope_unchanged() {
    let mut scope = Scope::parse("ds:foo:data:read").unwrap();
    let before = scope.clone();

    assert!(scope.set_entity_ref(Some("foo:bar")).is_err());
    assert!(scope.set_subscope(Some("a:b")).is_err());
    assert!(scope.set_actions(Some(["read".to_string(), "*".to_string()].into())).is_err());
    assert_eq!(scope, before);
}

#[test]
fn test_wildcard_in_action_list_is_rejected() {
    assert_eq!(Scope::parse("ds:foo:*,read"), Err(ScopeError::WildcardAction));
    assert_eq!(Scope::parse("ds:foo:meta:read,*"), Err(ScopeError::WildcardAction));
}

// ============================================================================
// Round-trip Property
// ============================================================================

/// Parts drawn from an alphabet that includes every separator
fn part() -> impl Strategy<Value = String> {
    "[a-c0-9_/.:,*-]{0,6}"
}

fn try_build(
    entity_type: String,
    entity_ref: Option<String>,
    subscope: Option<String>,
    actions: Option<BTreeSet<String>>,
) -> ScopeResult<Scope> {
    let mut scope = Scope::new(entity_type)?;
    scope.set_entity_ref(entity_ref)?;
    scope.set_subscope(subscope)?;
    scope.set_actions(actions)?;
    Ok(scope)
}

proptest! {
    #[test]
    fn prop_built_scopes_round_trip(
        entity_type in part(),
        entity_ref in proptest::option::of(part()),
        subscope in proptest::option::of(part()),
        actions in proptest::option::of(proptest::collection::btree_set(part(), 1..5)),
    ) {
        if let Ok(scope) = try_build(entity_type, entity_ref, subscope, actions) {
            let parsed = Scope::parse(&scope.to_string());
            prop_assert_eq!(parsed, Ok(scope));
        }
    }

    #[test]
    fn prop_parsed_scopes_reserialize(input in "[a-c*,:]{1,12}") {
        if let Ok(scope) = Scope::parse(&input) {
            let reparsed = Scope::parse(&scope.to_string());
            prop_assert_eq!(reparsed, Ok(scope));
        }
    }
}
