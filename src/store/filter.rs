//! Minimal filter/update/aggregate interpreter backing [`super::memory::MemoryStore`].
//!
//! This is deliberately not a general Mongo-compatible engine — it covers
//! the operator surface the core actually emits (equality, `$in`,
//! `$exists`, comparisons, `$set`/`$unset`/`$addToSet`/`$pull`, and a small
//! aggregate pipeline subset). A production `DocumentStore` wraps the real
//! external store and its real query language; this interpreter only needs
//! to be faithful enough to make the in-memory store usable for tests and
//! for running the node without a backing store.

use serde_json::{Map, Value};

fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(arr) => {
                let idx: usize = segment.parse().ok()?;
                arr.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

fn set_path(doc: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    set_path_rec(doc, &segments, value);
}

fn set_path_rec(doc: &mut Value, segments: &[&str], value: Value) {
    if segments.is_empty() {
        *doc = value;
        return;
    }
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let obj = doc.as_object_mut().unwrap();
    if segments.len() == 1 {
        obj.insert(segments[0].to_string(), value);
        return;
    }
    let entry = obj
        .entry(segments[0].to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    set_path_rec(entry, &segments[1..], value);
}

fn unset_path(doc: &mut Value, path: &str) {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.is_empty() {
        return;
    }
    let mut current = doc;
    for seg in &segments[..segments.len() - 1] {
        match current.get_mut(seg) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(obj) = current.as_object_mut() {
        obj.remove(segments[segments.len() - 1]);
    }
}

fn value_matches_operators(actual: Option<&Value>, ops: &Map<String, Value>) -> bool {
    for (op, expected) in ops {
        let ok = match op.as_str() {
            "$eq" => actual == Some(expected),
            "$ne" => actual != Some(expected),
            "$exists" => actual.is_some() == expected.as_bool().unwrap_or(true),
            "$in" => expected
                .as_array()
                .map(|arr| actual.map(|a| arr.contains(a)).unwrap_or(false))
                .unwrap_or(false),
            "$gt" | "$gte" | "$lt" | "$lte" => match (actual.and_then(|v| v.as_f64()), expected.as_f64()) {
                (Some(a), Some(e)) => match op.as_str() {
                    "$gt" => a > e,
                    "$gte" => a >= e,
                    "$lt" => a < e,
                    _ => a <= e,
                },
                _ => false,
            },
            _ => false,
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Returns whether `doc` satisfies `filter`. An empty filter matches
/// everything. Each top-level key is a dot-path into `doc`; its value is
/// either a literal (equality) or an object of `$`-operators.
pub fn matches(doc: &Value, filter: &Value) -> bool {
    let Some(filter_obj) = filter.as_object() else {
        return true;
    };
    for (path, expected) in filter_obj {
        let actual = get_path(doc, path);
        let ok = match expected {
            Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) => {
                value_matches_operators(actual, ops)
            }
            other => actual == Some(other),
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Apply a Mongo-style partial update document (`$set`/`$unset`/`$addToSet`/`$pull`) to `doc`.
pub fn apply_update(doc: &mut Value, update: &Value) {
    let Some(update_obj) = update.as_object() else {
        return;
    };
    for (op, fields) in update_obj {
        let Some(fields) = fields.as_object() else {
            continue;
        };
        match op.as_str() {
            "$set" => {
                for (path, value) in fields {
                    set_path(doc, path, value.clone());
                }
            }
            "$unset" => {
                for path in fields.keys() {
                    unset_path(doc, path);
                }
            }
            "$addToSet" => {
                for (path, value) in fields {
                    let current = get_path(doc, path).cloned().unwrap_or(Value::Array(vec![]));
                    let mut arr = current.as_array().cloned().unwrap_or_default();
                    if !arr.contains(value) {
                        arr.push(value.clone());
                    }
                    set_path(doc, path, Value::Array(arr));
                }
            }
            "$pull" => {
                for (path, value) in fields {
                    let current = get_path(doc, path).cloned().unwrap_or(Value::Array(vec![]));
                    let mut arr = current.as_array().cloned().unwrap_or_default();
                    arr.retain(|v| v != value);
                    set_path(doc, path, Value::Array(arr));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_plain_equality() {
        let doc = json!({"a": 1, "b": {"c": "x"}});
        assert!(matches(&doc, &json!({"a": 1})));
        assert!(matches(&doc, &json!({"b.c": "x"})));
        assert!(!matches(&doc, &json!({"a": 2})));
    }

    #[test]
    fn matches_operators() {
        let doc = json!({"age": 42});
        assert!(matches(&doc, &json!({"age": {"$gte": 40}})));
        assert!(!matches(&doc, &json!({"age": {"$lt": 40}})));
        assert!(matches(&doc, &json!({"age": {"$in": [1, 42]}})));
        assert!(matches(&doc, &json!({"missing": {"$exists": false}})));
    }

    #[test]
    fn set_and_unset_paths() {
        let mut doc = json!({"a": {"b": 1}});
        apply_update(&mut doc, &json!({"$set": {"a.b": 2, "c": "new"}}));
        assert_eq!(doc["a"]["b"], 2);
        assert_eq!(doc["c"], "new");

        apply_update(&mut doc, &json!({"$unset": {"c": ""}}));
        assert!(doc.get("c").is_none());
    }

    #[test]
    fn add_to_set_is_idempotent() {
        let mut doc = json!({"items": ["x"]});
        apply_update(&mut doc, &json!({"$addToSet": {"items": "y"}}));
        apply_update(&mut doc, &json!({"$addToSet": {"items": "y"}}));
        assert_eq!(doc["items"], json!(["x", "y"]));
    }

    #[test]
    fn pull_removes_matching_values() {
        let mut doc = json!({"items": ["x", "y"]});
        apply_update(&mut doc, &json!({"$pull": {"items": "x"}}));
        assert_eq!(doc["items"], json!(["y"]));
    }
}
