//! Merge of config layers under the requirements layer.

use serde_json::{Map, Value};

/// Apply `overlay` onto `base`, skipping keys locked by `locks`.
///
/// Objects merge recursively; any other value replaces the base value. A key
/// present in `locks` with a non-object value is locked as a whole; when the
/// overlay tries to change it, its dotted path is appended to `locked`.
pub(super) fn apply_layer(
    base: &mut Value,
    overlay: &Value,
    locks: Option<&Value>,
    path: &str,
    locked: &mut Vec<String>,
) {
    let lock_map = match locks {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(lock) => {
            if overlay != lock {
                locked.push(display_path(path));
            }
            return;
        }
    };

    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let key_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let key_lock = lock_map.and_then(|map| map.get(key));
                let slot = base_map
                    .entry(key.clone())
                    .or_insert_with(|| empty_like(value));
                apply_layer(slot, value, key_lock, &key_path, locked);
            }
        }
        (base_slot, overlay_value) => {
            if lock_map.is_none() {
                *base_slot = overlay_value.clone();
            } else {
                locked.push(display_path(path));
            }
        }
    }
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::Object(Map::new()),
        _ => Value::Null,
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "root".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn overlay_merges_objects_and_replaces_scalars() {
        let mut base = json!({ "a": { "b": 1, "c": 2 }, "d": [1] });
        let mut locked = Vec::new();
        apply_layer(
            &mut base,
            &json!({ "a": { "b": 5 }, "d": [2, 3], "e": true }),
            None,
            "",
            &mut locked,
        );
        assert_eq!(
            base,
            json!({ "a": { "b": 5, "c": 2 }, "d": [2, 3], "e": true })
        );
        assert!(locked.is_empty());
    }

    #[test]
    fn locked_keys_survive_and_are_reported() {
        let locks = json!({ "compilers": { "solc": { "version": "0.5.16" } } });
        let mut base = locks.clone();
        let mut locked = Vec::new();
        apply_layer(
            &mut base,
            &json!({ "compilers": { "solc": { "version": "0.5.17", "settings": { "optimizer": { "enabled": false } } } } }),
            Some(&locks),
            "",
            &mut locked,
        );
        assert_eq!(
            base,
            json!({ "compilers": { "solc": {
                "version": "0.5.16",
                "settings": { "optimizer": { "enabled": false } }
            } } })
        );
        assert_eq!(locked, vec!["compilers.solc.version".to_string()]);
    }
}
