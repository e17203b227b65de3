//! Variable validation at execution time (§4.5)

use std::collections::HashMap;

use serde_json::Value;

use crate::entities::VariableSpec;
use crate::error::{AppError, AppResult};
use crate::store::coerce::CoerceType;

/// Strip and honour an optional `$coerce` map in `provided`, then check
/// each value against the query's variable template.
pub fn validate(
    template: &HashMap<String, VariableSpec>,
    mut provided: HashMap<String, Value>,
) -> AppResult<HashMap<String, Value>> {
    let coerce_spec = provided.remove("$coerce");

    for (key, spec) in template {
        if !spec.optional && !provided.contains_key(key) {
            return Err(AppError::VariableInjection(format!(
                "missing required variable: {key}"
            )));
        }
    }
    for key in provided.keys() {
        if !template.contains_key(key) {
            return Err(AppError::VariableInjection(format!("unknown variable: {key}")));
        }
    }

    if let Some(coerce_spec) = coerce_spec {
        let Some(coerce_spec) = coerce_spec.as_object() else {
            return Err(AppError::VariableInjection("$coerce must be an object".to_string()));
        };
        for (key, type_name) in coerce_spec {
            let Some(value) = provided.get(key) else {
                continue;
            };
            let Some(type_name) = type_name.as_str() else {
                return Err(AppError::VariableInjection(format!(
                    "$coerce target for {key} must be a string"
                )));
            };
            let coerced = CoerceType::parse(type_name)?.apply(value)?;
            provided.insert(key.clone(), coerced);
        }
    }

    for (key, value) in &provided {
        validate_shape(key, value)?;
    }

    Ok(provided)
}

fn validate_shape(key: &str, value: &Value) -> AppResult<()> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
        Value::Array(items) => {
            let mut kind: Option<&'static str> = None;
            for item in items {
                let item_kind = match item {
                    Value::String(_) => "string",
                    Value::Number(_) => "number",
                    Value::Bool(_) => "boolean",
                    _ => {
                        return Err(AppError::VariableInjection(format!(
                            "variable {key} must be a primitive or a homogeneous array of primitives"
                        )))
                    }
                };
                match kind {
                    None => kind = Some(item_kind),
                    Some(k) if k != item_kind => {
                        return Err(AppError::VariableInjection(format!(
                            "variable {key} array is not homogeneous"
                        )))
                    }
                    _ => {}
                }
            }
            Ok(())
        }
        _ => Err(AppError::VariableInjection(format!(
            "variable {key} must be a primitive or a homogeneous array of primitives"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> HashMap<String, VariableSpec> {
        let mut t = HashMap::new();
        t.insert(
            "age".to_string(),
            VariableSpec {
                path: "$.pipeline.0.$match.age".to_string(),
                description: None,
                optional: false,
            },
        );
        t
    }

    #[test]
    fn rejects_missing_required_variable() {
        let err = validate(&template(), HashMap::new()).unwrap_err();
        assert_eq!(err.code(), "VariableInjection");
    }

    #[test]
    fn rejects_unknown_variable() {
        let mut provided = HashMap::new();
        provided.insert("age".to_string(), json!(1));
        provided.insert("bogus".to_string(), json!(1));
        assert!(validate(&template(), provided).is_err());
    }

    #[test]
    fn rejects_mixed_type_array() {
        let mut provided = HashMap::new();
        provided.insert("age".to_string(), json!([1, "two"]));
        assert!(validate(&template(), provided).is_err());
    }

    #[test]
    fn honours_coerce_map() {
        let mut provided = HashMap::new();
        provided.insert("age".to_string(), json!("42"));
        provided.insert("$coerce".to_string(), json!({"age": "number"}));
        let result = validate(&template(), provided).unwrap();
        assert_eq!(result["age"], json!(42.0));
        assert!(!result.contains_key("$coerce"));
    }
}
