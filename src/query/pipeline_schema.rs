//! Fixed JSON schema describing permitted aggregation pipeline operators
//! (§4.5 step 1)
//!
//! Deliberately matches the stage surface the shipped [`crate::store::aggregate`]
//! interpreter actually executes; a production store may support more, but
//! registration validates against this closed set so a registered query is
//! guaranteed portable across `DocumentStore` implementations.

use serde_json::{json, Value};

pub fn schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "minProperties": 1,
            "maxProperties": 1,
            "properties": {
                "$match": {"type": "object"},
                "$sort": {"type": "object"},
                "$skip": {"type": "integer", "minimum": 0},
                "$limit": {"type": "integer", "minimum": 0},
                "$project": {"type": "object"},
                "$group": {"type": "object"},
                "$count": {"type": "string"}
            },
            "additionalProperties": false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_compiles() {
        assert!(jsonschema::JSONSchema::compile(&schema()).is_ok());
    }
}
