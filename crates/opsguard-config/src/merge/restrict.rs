//! Workspace restriction enforcement.
//!
//! A workspace config lives inside the repository being operated on, so it
//! may only make opsguard stricter. After the workspace layer is merged,
//! every field in [`RESTRICTIONS`] that the workspace touched is compared
//! against the baseline (defaults plus user config) and reverted or repaired
//! when it loosens anything.

use tracing::warn;

use super::path::{get_nested, remove_nested, set_nested};

/// How a workspace may change a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tighten {
    /// A number may only go down.
    Decrease,
    /// A number may only go up.
    Increase,
    /// A boolean may only become `true`.
    OnlyTrue,
    /// A list may only gain entries.
    Union,
    /// A list may only lose entries.
    Subset,
    /// The workspace may not set the field at all.
    Locked,
}

/// Restricted fields and their rule.
pub const RESTRICTIONS: &[(&str, Tighten)] = &[
    ("guards.enforce", Tighten::OnlyTrue),
    ("guards.ambiguity_threshold", Tighten::Decrease),
    ("guards.min_routing_confidence", Tighten::Increase),
    ("guards.registered_units", Tighten::Subset),
    ("guards.required_context_sections", Tighten::Union),
    ("policy.protected_branches", Tighten::Union),
    ("policy.extra_denylist", Tighten::Union),
    ("policy.forbidden_commit_trailers", Tighten::Union),
    ("policy.require_conventional_commits", Tighten::OnlyTrue),
    ("policy.reconciliation_units", Tighten::Union),
    ("approval.approve_token", Tighten::Locked),
    ("approval.reject_token", Tighten::Locked),
    ("approval.audit_dir", Tighten::Locked),
    ("approval.audit_prefix", Tighten::Locked),
    ("approval.audit_period", Tighten::Locked),
];

/// Undo every loosening the workspace layer made.
///
/// `baseline` is the merged tree *before* the workspace layer, so the
/// defaults act as the baseline when no user config exists.
pub fn enforce_restrictions(
    merged: &mut toml::Value,
    baseline: &toml::Value,
    workspace_layer: &toml::Value,
) {
    for &(field, rule) in RESTRICTIONS {
        let path: Vec<&str> = field.split('.').collect();
        let Some(ws_val) = get_nested(workspace_layer, &path) else {
            continue;
        };
        let base_val = get_nested(baseline, &path);

        match rule {
            Tighten::Decrease | Tighten::Increase => {
                let (Some(ws), Some(base)) = (as_number(ws_val), base_val.and_then(as_number))
                else {
                    continue;
                };
                let loosened = if rule == Tighten::Decrease {
                    ws > base
                } else {
                    ws < base
                };
                if loosened && let Some(base_val) = base_val {
                    warn!(field, from = base, to = ws, "Workspace config loosened a threshold; reverting");
                    set_nested(merged, &path, base_val.clone());
                }
            },
            Tighten::OnlyTrue => {
                if ws_val.as_bool() == Some(false) {
                    warn!(field, "Workspace config tried to disable a safety flag; forcing to true");
                    set_nested(merged, &path, toml::Value::Boolean(true));
                }
            },
            Tighten::Union => {
                let Some(base_items) = base_val.and_then(toml::Value::as_array) else {
                    continue;
                };
                let mut items = get_nested(merged, &path)
                    .and_then(toml::Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let mut restored = false;
                for item in base_items {
                    if !items.contains(item) {
                        items.push(item.clone());
                        restored = true;
                    }
                }
                if restored {
                    warn!(field, "Workspace config removed list entries; restoring them");
                    set_nested(merged, &path, toml::Value::Array(items));
                }
            },
            Tighten::Subset => {
                let base_items = base_val
                    .and_then(toml::Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let expands = ws_val
                    .as_array()
                    .is_none_or(|items| items.iter().any(|i| !base_items.contains(i)));
                if expands {
                    warn!(field, "Workspace config tried to add list entries; reverting");
                    set_nested(merged, &path, toml::Value::Array(base_items));
                }
            },
            Tighten::Locked => {
                if base_val == Some(ws_val) {
                    continue;
                }
                warn!(field, "Workspace config may not set this field; reverting");
                match base_val {
                    Some(base_val) => set_nested(merged, &path, base_val.clone()),
                    None => remove_nested(merged, &path),
                }
            },
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_number(val: &toml::Value) -> Option<f64> {
    match val {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}
