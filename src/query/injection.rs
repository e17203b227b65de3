//! Variable injection into a stored pipeline (§4.5, §8 invariant 5)

use std::collections::HashMap;

use serde_json::Value;

use crate::entities::VariableSpec;
use crate::error::{AppError, AppResult};

use super::path;

/// Deep-clones `pipeline` and writes each `provided[k]` at the template's
/// path for `k`. Purely positional — values are not re-validated against
/// any collection schema at this stage.
pub fn inject(
    pipeline: &[Value],
    template: &HashMap<String, VariableSpec>,
    provided: &HashMap<String, Value>,
) -> AppResult<Vec<Value>> {
    let mut pipeline = pipeline.to_vec();
    for (key, value) in provided {
        let Some(spec) = template.get(key) else {
            continue;
        };
        let segments = path::parse(&spec.path)?;
        let target = path::resolve_mut(&mut pipeline, &segments).ok_or_else(|| {
            AppError::VariableInjection(format!("path for variable {key} does not resolve"))
        })?;
        *target = value.clone();
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn injects_value_at_path_and_reads_back() {
        let pipeline = vec![json!({"$match": {"age": 0}})];
        let mut template = HashMap::new();
        template.insert(
            "age".to_string(),
            VariableSpec {
                path: "$.pipeline.0.$match.age".to_string(),
                description: None,
                optional: false,
            },
        );
        let mut provided = HashMap::new();
        provided.insert("age".to_string(), json!(42));

        let injected = inject(&pipeline, &template, &provided).unwrap();
        assert_eq!(injected[0]["$match"]["age"], json!(42));
    }
}
