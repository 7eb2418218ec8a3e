use serde_json::{Map, Value};

/// Collect `(path, old, new)` for every leaf that differs between two bodies.
///
/// Paths are dot-joined; array elements are addressed by index so a change in
/// one thermostat of a `DP` list shows up as `ICONS.<id>.DP.<n>.<field>`.
/// Array elements present only in `previous` are reported with a `Null` new
/// value; object keys present only in `previous` are not reported.
pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = join(path_prefix, key);
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => added(curr_val, &path, changes),
                }
            }
        }
        (Value::Array(prev_items), Value::Array(curr_items)) => {
            for (idx, curr_val) in curr_items.iter().enumerate() {
                let path = join(path_prefix, &idx.to_string());
                match prev_items.get(idx) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => added(curr_val, &path, changes),
                }
            }
            for (idx, prev_val) in prev_items.iter().enumerate().skip(curr_items.len()) {
                let path = join(path_prefix, &idx.to_string());
                changes.push((path, prev_val.clone(), Value::Null));
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

fn added(value: &Value, path: &str, changes: &mut Vec<(String, Value, Value)>) {
    if value.is_object() {
        diff_json(&Value::Object(Map::new()), value, path, changes);
    } else {
        changes.push((path.to_string(), Value::Null, value.clone()));
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
