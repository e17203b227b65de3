//! `$coerce` type-coercion interpreter for filter and update documents
//! (§4.4, §9). The permitted coercion set is closed: `string`,
//! `number`, `boolean`, `date`, `uuid`. Anything else is a validation
//! error raised at registration/use time rather than silently ignored.

use chrono::DateTime;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceType {
    String,
    Number,
    Boolean,
    Date,
    Uuid,
}

impl CoerceType {
    pub fn parse(name: &str) -> AppResult<Self> {
        match name {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "uuid" => Ok(Self::Uuid),
            other => Err(AppError::DataValidation(format!(
                "unsupported $coerce type: {other}"
            ))),
        }
    }

    pub fn apply(self, value: &Value) -> AppResult<Value> {
        match self {
            Self::String => coerce_string(value),
            Self::Number => coerce_number(value),
            Self::Boolean => coerce_boolean(value),
            Self::Date => coerce_date(value),
            Self::Uuid => coerce_uuid(value),
        }
    }
}

fn invalid(kind: &str, value: &Value) -> AppError {
    AppError::DataValidation(format!("cannot coerce {value} to {kind}"))
}

fn coerce_string(value: &Value) -> AppResult<Value> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(invalid("string", value)),
    }
}

fn coerce_number(value: &Value) -> AppResult<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("number", value)),
        _ => Err(invalid("number", value)),
    }
}

fn coerce_boolean(value: &Value) -> AppResult<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => match s.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean", value)),
        },
        _ => Err(invalid("boolean", value)),
    }
}

fn coerce_date(value: &Value) -> AppResult<Value> {
    let s = value.as_str().ok_or_else(|| invalid("date", value))?;
    DateTime::parse_from_rfc3339(s)
        .map(|_| value.clone())
        .map_err(|_| invalid("date", value))
}

fn coerce_uuid(value: &Value) -> AppResult<Value> {
    let s = value.as_str().ok_or_else(|| invalid("uuid", value))?;
    Uuid::parse_str(s)
        .map(|_| value.clone())
        .map_err(|_| invalid("uuid", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_string_to_number() {
        let t = CoerceType::parse("number").unwrap();
        assert_eq!(t.apply(&json!("42")).unwrap(), json!(42.0));
    }

    #[test]
    fn rejects_malformed_uuid() {
        let t = CoerceType::parse("uuid").unwrap();
        assert!(t.apply(&json!("not-a-uuid")).is_err());
    }

    #[test]
    fn rejects_unknown_coerce_type() {
        assert!(CoerceType::parse("currency").is_err());
    }

    #[test]
    fn date_round_trips_rfc3339() {
        let t = CoerceType::parse("date").unwrap();
        let value = json!("2026-07-28T00:00:00Z");
        assert_eq!(t.apply(&value).unwrap(), value);
    }
}
