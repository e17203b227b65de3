//! A small aggregate-pipeline interpreter for [`super::memory::MemoryStore`].
//!
//! Supports the stages query.pipeline_schema declares as permitted:
//! `$match`, `$sort`, `$skip`, `$limit`, `$project`, `$group`, `$count`.

use serde_json::{Map, Value};

use super::filter;

pub fn run(mut docs: Vec<Value>, pipeline: &[Value]) -> Vec<Value> {
    for stage in pipeline {
        let Some(stage_obj) = stage.as_object() else {
            continue;
        };
        let Some((op, arg)) = stage_obj.iter().next() else {
            continue;
        };
        docs = match op.as_str() {
            "$match" => docs.into_iter().filter(|d| filter::matches(d, arg)).collect(),
            "$sort" => {
                sort_stage(docs, arg)
            }
            "$skip" => {
                let n = arg.as_u64().unwrap_or(0) as usize;
                docs.into_iter().skip(n).collect()
            }
            "$limit" => {
                let n = arg.as_u64().unwrap_or(u64::MAX) as usize;
                docs.into_iter().take(n).collect()
            }
            "$project" => docs.into_iter().map(|d| project(&d, arg)).collect(),
            "$group" => vec![group(&docs, arg)],
            "$count" => {
                let field = arg.as_str().unwrap_or("count");
                vec![Value::Object(Map::from_iter([(
                    field.to_string(),
                    Value::Number(docs.len().into()),
                )]))]
            }
            _ => docs,
        };
    }
    docs
}

fn sort_stage(mut docs: Vec<Value>, spec: &Value) -> Vec<Value> {
    let Some(spec) = spec.as_object() else {
        return docs;
    };
    let keys: Vec<(String, i64)> = spec
        .iter()
        .map(|(k, v)| (k.clone(), v.as_i64().unwrap_or(1)))
        .collect();

    docs.sort_by(|a, b| {
        for (field, dir) in &keys {
            let av = a.get(field);
            let bv = b.get(field);
            let ord = compare_values(av, bv);
            let ord = if *dir < 0 { ord.reverse() } else { ord };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
    docs
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(doc: &Value, spec: &Value) -> Value {
    let Some(spec) = spec.as_object() else {
        return doc.clone();
    };
    let mut out = Map::new();
    for (field, include) in spec {
        if include.as_i64() == Some(0) {
            continue;
        }
        if let Some(v) = doc.get(field) {
            out.insert(field.clone(), v.clone());
        }
    }
    Value::Object(out)
}

fn group(docs: &[Value], spec: &Value) -> Value {
    let Some(spec) = spec.as_object() else {
        return Value::Null;
    };
    let mut out = Map::new();

    let id_expr = spec.get("_id").cloned().unwrap_or(Value::Null);
    out.insert("_id".to_string(), id_expr);

    for (key, acc) in spec {
        if key == "_id" {
            continue;
        }
        let Some(acc_obj) = acc.as_object() else {
            continue;
        };
        let Some((acc_op, field_ref)) = acc_obj.iter().next() else {
            continue;
        };
        let value = match acc_op.as_str() {
            "$sum" => {
                if let Some(field) = field_ref.as_str().and_then(|s| s.strip_prefix('$')) {
                    let sum: f64 = docs
                        .iter()
                        .filter_map(|d| d.get(field).and_then(|v| v.as_f64()))
                        .sum();
                    serde_json::json!(sum)
                } else {
                    serde_json::json!(docs.len())
                }
            }
            "$avg" => {
                if let Some(field) = field_ref.as_str().and_then(|s| s.strip_prefix('$')) {
                    let values: Vec<f64> = docs
                        .iter()
                        .filter_map(|d| d.get(field).and_then(|v| v.as_f64()))
                        .collect();
                    let avg = if values.is_empty() {
                        0.0
                    } else {
                        values.iter().sum::<f64>() / values.len() as f64
                    };
                    serde_json::json!(avg)
                } else {
                    Value::Null
                }
            }
            _ => Value::Null,
        };
        out.insert(key.clone(), value);
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_then_limit() {
        let docs = vec![json!({"age": 1}), json!({"age": 2}), json!({"age": 3})];
        let pipeline = vec![json!({"$match": {"age": {"$gte": 2}}}), json!({"$limit": 1})];
        let result = run(docs, &pipeline);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["age"], 2);
    }

    #[test]
    fn group_sums_field() {
        let docs = vec![json!({"v": 1}), json!({"v": 2}), json!({"v": 3})];
        let pipeline = vec![json!({"$group": {"_id": Value::Null, "total": {"$sum": "$v"}}})];
        let result = run(docs, &pipeline);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["total"], 6.0);
    }

    #[test]
    fn sort_descending() {
        let docs = vec![json!({"v": 1}), json!({"v": 3}), json!({"v": 2})];
        let pipeline = vec![json!({"$sort": {"v": -1}})];
        let result = run(docs, &pipeline);
        let values: Vec<i64> = result.iter().map(|d| d["v"].as_i64().unwrap()).collect();
        assert_eq!(values, vec![3, 2, 1]);
    }
}
