//! `update` / `delete` / `flush` (§4.4)

use chrono::Utc;
use serde_json::{Map, Value};

use crate::entities::{Collection, LogOp};
use crate::error::AppResult;
use crate::ids::CollectionType;
use crate::store::{coerce::CoerceType, Namespace};

use super::DataPlane;

/// Rewrite any `$coerce` map's target leaves in place, then strip the
/// `$coerce` key itself before the document reaches the store (§4.4).
pub fn apply_coerce(doc: &mut Value) -> AppResult<()> {
    let Some(obj) = doc.as_object_mut() else {
        return Ok(());
    };
    let Some(coerce_spec) = obj.remove("$coerce") else {
        return Ok(());
    };
    let Some(coerce_spec) = coerce_spec.as_object() else {
        return Ok(());
    };

    for (path, type_name) in coerce_spec.clone() {
        let Some(type_name) = type_name.as_str() else {
            continue;
        };
        let coerce_type = CoerceType::parse(type_name)?;
        if let Some(current) = get_leaf(obj, &path) {
            let coerced = coerce_type.apply(&current)?;
            set_leaf(obj, &path, coerced);
        }
    }
    Ok(())
}

fn get_leaf(obj: &Map<String, Value>, path: &str) -> Option<Value> {
    let mut current = Value::Object(obj.clone());
    for segment in path.split('.') {
        current = current.get(segment)?.clone();
    }
    Some(current)
}

fn set_leaf(obj: &mut Map<String, Value>, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() == 1 {
        obj.insert(segments[0].to_string(), value);
        return;
    }
    let mut wrapper = Value::Object(std::mem::take(obj));
    set_nested(&mut wrapper, &segments, value);
    if let Value::Object(inner) = wrapper {
        *obj = inner;
    }
}

fn set_nested(current: &mut Value, segments: &[&str], value: Value) {
    if segments.len() == 1 {
        if let Some(obj) = current.as_object_mut() {
            obj.insert(segments[0].to_string(), value);
        }
        return;
    }
    if let Some(obj) = current.as_object_mut() {
        let entry = obj
            .entry(segments[0].to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        set_nested(entry, &segments[1..], value);
    }
}

impl DataPlane {
    pub async fn update(
        &self,
        collection: &Collection,
        mut filter_doc: Value,
        mut update_doc: Value,
    ) -> AppResult<u64> {
        apply_coerce(&mut filter_doc)?;
        apply_coerce(&mut update_doc)?;

        let now = Utc::now();
        let ns = Namespace::Data(collection.meta.id);

        if collection.kind == CollectionType::Owned {
            let matched = self
                .store
                .find_many(&ns, &filter_doc, crate::store::FindOptions::default())
                .await?;
            self.bookkeep_owned(&matched, collection.meta.id, LogOp::UpdateData, now, false)
                .await?;
        }

        self.store.update_many(&ns, &filter_doc, &update_doc).await
    }

    pub async fn delete(&self, collection: &Collection, mut filter_doc: Value) -> AppResult<u64> {
        apply_coerce(&mut filter_doc)?;
        self.delete_matching(collection, filter_doc).await
    }

    pub async fn flush(&self, collection: &Collection) -> AppResult<u64> {
        self.delete_matching(collection, serde_json::json!({})).await
    }

    async fn delete_matching(&self, collection: &Collection, filter_doc: Value) -> AppResult<u64> {
        let now = Utc::now();
        let ns = Namespace::Data(collection.meta.id);

        if collection.kind == CollectionType::Owned {
            let matched = self
                .store
                .find_many(&ns, &filter_doc, crate::store::FindOptions::default())
                .await?;
            self.bookkeep_owned(&matched, collection.meta.id, LogOp::DeleteData, now, true)
                .await?;
        }

        self.store.delete_many(&ns, &filter_doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_coerce_on_top_level_field() {
        let mut doc = json!({"age": "42", "$coerce": {"age": "number"}});
        apply_coerce(&mut doc).unwrap();
        assert_eq!(doc["age"], json!(42.0));
        assert!(doc.get("$coerce").is_none());
    }
}
