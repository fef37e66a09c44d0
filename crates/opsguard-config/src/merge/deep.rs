use super::{ConfigLayer, FieldSources};

/// Recursively deep-merge `overlay` into `base`.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    if let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) =
        (&mut *base, overlay)
    {
        for (key, overlay_val) in overlay_table {
            match base_table.get_mut(key) {
                Some(base_val) => deep_merge(base_val, overlay_val),
                None => {
                    base_table.insert(key.clone(), overlay_val.clone());
                },
            }
        }
        return;
    }
    *base = overlay.clone();
}

/// Deep-merge `overlay` into `base`, recording `layer` as the source of
/// every leaf the overlay sets. `prefix` is the dotted path of `base`.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) =
        (&mut *base, overlay)
    else {
        *base = overlay.clone();
        sources.insert(prefix.to_owned(), layer);
        return;
    };

    for (key, overlay_val) in overlay_table {
        let path = join_path(prefix, key);
        match base_table.get_mut(key) {
            Some(base_val) if overlay_val.is_table() => {
                deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
            },
            Some(base_val) => {
                *base_val = overlay_val.clone();
                sources.insert(path, layer);
            },
            None => {
                base_table.insert(key.clone(), overlay_val.clone());
                record_leaves(overlay_val, &path, layer, sources);
            },
        }
    }
}

/// Record `layer` for every leaf below `val`.
pub(crate) fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match val {
        toml::Value::Table(table) => {
            for (key, child) in table {
                record_leaves(child, &join_path(prefix, key), layer, sources);
            }
        },
        _ => {
            sources.insert(prefix.to_owned(), layer);
        },
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}
