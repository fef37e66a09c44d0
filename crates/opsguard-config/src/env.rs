//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set. A value that came from the embedded defaults counts as
//! unset.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::merge::{ConfigLayer, FieldSources, set_nested};

/// How an env var value is converted before insertion.
#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Bool,
    Str,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: EnvKind,
}

/// All supported `OPSGUARD_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "OPSGUARD_ENFORCE",
        field_path: "guards.enforce",
        kind: EnvKind::Bool,
    },
    EnvMapping {
        var_name: "OPSGUARD_LOG_LEVEL",
        field_path: "logging.level",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "OPSGUARD_AUDIT_DIR",
        field_path: "approval.audit_dir",
        kind: EnvKind::Str,
    },
];

/// Apply environment variable fallbacks to fields no config file set.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let Some(value) = coerce(mapping.kind, raw) else {
            warn!(
                var = mapping.var_name,
                value = %raw,
                "ignoring env var with an unparseable value"
            );
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        let path: Vec<&str> = mapping.field_path.split('.').collect();
        set_nested(merged, &path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    count
}

fn coerce(kind: EnvKind, raw: &str) -> Option<toml::Value> {
    match kind {
        EnvKind::Str => Some(toml::Value::String(raw.to_owned())),
        EnvKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Some(toml::Value::Boolean(false)),
            _ => None,
        },
    }
}

/// Snapshot of the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::deep_merge_tracking;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn defaults_with_sources() -> (toml::Value, FieldSources) {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let defaults: toml::Value = toml::from_str(include_str!("defaults.toml")).unwrap();
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut merged, &defaults, "", ConfigLayer::Defaults, &mut sources);
        (merged, sources)
    }

    #[test]
    fn test_env_fills_default_fields() {
        let (mut merged, mut sources) = defaults_with_sources();
        let env = make_env(&[
            ("OPSGUARD_ENFORCE", "false"),
            ("OPSGUARD_LOG_LEVEL", "debug"),
            ("OPSGUARD_AUDIT_DIR", "/var/log/opsguard"),
        ]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env);
        assert_eq!(applied, 3);
        assert_eq!(merged["guards"]["enforce"].as_bool(), Some(false));
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(
            merged["approval"]["audit_dir"].as_str(),
            Some("/var/log/opsguard")
        );
        assert_eq!(sources.get("guards.enforce"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_env_does_not_override_files() {
        let (mut merged, mut sources) = defaults_with_sources();
        let user: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        deep_merge_tracking(&mut merged, &user, "", ConfigLayer::User, &mut sources);

        let env = make_env(&[("OPSGUARD_LOG_LEVEL", "trace")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_unparseable_bool_is_ignored() {
        let (mut merged, mut sources) = defaults_with_sources();
        let env = make_env(&[("OPSGUARD_ENFORCE", "sometimes")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["guards"]["enforce"].as_bool(), Some(true));
    }
}
