use super::path::{get_nested, remove_nested};
use super::*;

fn parse(s: &str) -> toml::Value {
    toml::from_str(s).unwrap()
}

fn defaults() -> toml::Value {
    parse(include_str!("../defaults.toml"))
}

/// Merge `workspace` over the defaults and enforce restrictions.
fn apply_workspace(workspace: &str) -> toml::Value {
    let baseline = defaults();
    let ws = parse(workspace);
    let mut merged = baseline.clone();
    deep_merge(&mut merged, &ws);
    enforce_restrictions(&mut merged, &baseline, &ws);
    merged
}

fn strings(val: &toml::Value, path: &[&str]) -> Vec<String> {
    get_nested(val, path)
        .and_then(toml::Value::as_array)
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_owned())
        .collect()
}

#[test]
fn test_deep_merge_scalars_and_new_keys() {
    let mut base = parse(
        r#"
        [guards]
        enforce = true
        ambiguity_threshold = 0.3
    "#,
    );
    let overlay = parse(
        r#"
        [guards]
        ambiguity_threshold = 0.2
        [logging]
        level = "debug"
    "#,
    );

    deep_merge(&mut base, &overlay);

    assert_eq!(
        get_nested(&base, &["guards", "enforce"]).and_then(toml::Value::as_bool),
        Some(true)
    );
    assert_eq!(
        get_nested(&base, &["guards", "ambiguity_threshold"]).and_then(toml::Value::as_float),
        Some(0.2)
    );
    assert_eq!(
        get_nested(&base, &["logging", "level"]).and_then(toml::Value::as_str),
        Some("debug")
    );
}

#[test]
fn test_deep_merge_replaces_arrays() {
    let mut base = parse(r#"list = ["a", "b"]"#);
    deep_merge(&mut base, &parse(r#"list = ["c"]"#));
    assert_eq!(strings(&base, &["list"]), vec!["c"]);
}

#[test]
fn test_deep_merge_tracking_records_leaves() {
    let mut base = parse("[guards]\nenforce = true");
    let overlay = parse(
        r#"
        [guards]
        enforce = false
        [approval]
        audit_dir = "/var/log/opsguard"
    "#,
    );
    let mut sources = FieldSources::new();
    deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::User, &mut sources);

    assert_eq!(sources.get("guards.enforce"), Some(&ConfigLayer::User));
    assert_eq!(sources.get("approval.audit_dir"), Some(&ConfigLayer::User));
    assert_eq!(sources.len(), 2);
}

#[test]
fn test_set_and_remove_nested() {
    let mut val = parse("[a]\nb = 1");
    set_nested(&mut val, &["a", "c", "d"], toml::Value::Integer(2));
    assert_eq!(
        get_nested(&val, &["a", "c", "d"]).and_then(toml::Value::as_integer),
        Some(2)
    );
    remove_nested(&mut val, &["a", "b"]);
    assert!(get_nested(&val, &["a", "b"]).is_none());
    remove_nested(&mut val, &["missing", "path"]);
}

#[test]
fn test_workspace_cannot_disable_enforcement() {
    let merged = apply_workspace("[guards]\nenforce = false");
    assert_eq!(
        get_nested(&merged, &["guards", "enforce"]).and_then(toml::Value::as_bool),
        Some(true)
    );
}

#[test]
fn test_workspace_thresholds_only_tighten() {
    let loosened = apply_workspace(
        "[guards]\nambiguity_threshold = 0.9\nmin_routing_confidence = 0.1",
    );
    assert_eq!(
        get_nested(&loosened, &["guards", "ambiguity_threshold"]).and_then(toml::Value::as_float),
        Some(0.3)
    );
    assert_eq!(
        get_nested(&loosened, &["guards", "min_routing_confidence"])
            .and_then(toml::Value::as_float),
        Some(0.7)
    );

    let tightened = apply_workspace(
        "[guards]\nambiguity_threshold = 0.1\nmin_routing_confidence = 0.9",
    );
    assert_eq!(
        get_nested(&tightened, &["guards", "ambiguity_threshold"])
            .and_then(toml::Value::as_float),
        Some(0.1)
    );
    assert_eq!(
        get_nested(&tightened, &["guards", "min_routing_confidence"])
            .and_then(toml::Value::as_float),
        Some(0.9)
    );
}

#[test]
fn test_workspace_lists_union() {
    let merged = apply_workspace(
        r#"
        [policy]
        protected_branches = ["release/*"]
        extra_denylist = ["\\bvault\\s+delete\\b"]
    "#,
    );
    let branches = strings(&merged, &["policy", "protected_branches"]);
    assert_eq!(branches[0], "release/*");
    for required in ["main", "master", "develop", "production"] {
        assert!(branches.iter().any(|b| b == required), "{required} was dropped");
    }
    assert_eq!(
        strings(&merged, &["policy", "extra_denylist"]),
        vec![r"\bvault\s+delete\b"]
    );
}

#[test]
fn test_workspace_cannot_register_new_units() {
    let merged = apply_workspace(r#"[guards]
registered_units = ["kubernetes", "shell"]"#);
    assert_eq!(
        strings(&merged, &["guards", "registered_units"]),
        vec!["gitops", "infrastructure", "kubernetes", "release", "version-control"]
    );

    let narrowed = apply_workspace(r#"[guards]
registered_units = ["kubernetes"]"#);
    assert_eq!(
        strings(&narrowed, &["guards", "registered_units"]),
        vec!["kubernetes"]
    );
}

#[test]
fn test_workspace_cannot_touch_approval_tokens_or_audit() {
    let merged = apply_workspace(
        r#"
        [approval]
        approve_token = "y"
        audit_dir = "/tmp/elsewhere"
        max_files_shown = 3
    "#,
    );
    assert_eq!(
        get_nested(&merged, &["approval", "approve_token"]).and_then(toml::Value::as_str),
        Some("approve")
    );
    assert!(get_nested(&merged, &["approval", "audit_dir"]).is_none());
    assert_eq!(
        get_nested(&merged, &["approval", "max_files_shown"]).and_then(toml::Value::as_integer),
        Some(3),
        "display caps are not restricted"
    );
}

#[test]
fn test_every_restricted_field_exists_in_defaults() {
    let defaults = defaults();
    for (field, rule) in RESTRICTIONS {
        if *field == "approval.audit_dir" {
            continue;
        }
        let path: Vec<&str> = field.split('.').collect();
        assert!(
            get_nested(&defaults, &path).is_some(),
            "{field} ({rule:?}) missing from defaults.toml"
        );
    }
}
