//! `uploadOwned` / `uploadStandard` (§4.4)

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{Collection, LogOp};
use crate::error::{AppError, AppResult};
use crate::ids::{AclEntry, CollectionType};
use crate::store::{InsertFailureReason, Namespace};

use super::{DataPlane, UploadError, UploadReport};

fn stamp_new_document(mut doc: Value, now: chrono::DateTime<Utc>) -> AppResult<Value> {
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| AppError::DataValidation("document must be a JSON object".to_string()))?;

    let id = match obj.get("_id").and_then(Value::as_str) {
        Some(s) => Uuid::parse_str(s)
            .map_err(|_| AppError::DataValidation("_id must be a UUID".to_string()))?,
        None => Uuid::new_v4(),
    };
    obj.insert("_id".to_string(), Value::String(id.to_string()));
    obj.insert("_created".to_string(), Value::String(now.to_rfc3339()));
    obj.insert("_updated".to_string(), Value::String(now.to_rfc3339()));
    Ok(doc)
}

/// Coerce scalar fields the schema declares as `format: date-time | uuid`
/// from whatever primitive JSON type they arrived as into strings, before
/// validation runs (§4.4: "Datetime fields, UUID fields and DID
/// fields declared by schema are coerced from strings before validation").
fn coerce_schema_typed_fields(schema: &Value, doc: &mut Value) {
    let (Some(props), Some(obj)) = (
        schema.get("properties").and_then(Value::as_object),
        doc.as_object_mut(),
    ) else {
        return;
    };
    for (field, field_schema) in props {
        let needs_string = matches!(
            field_schema.get("format").and_then(Value::as_str),
            Some("date-time") | Some("uuid")
        );
        if !needs_string {
            continue;
        }
        if let Some(value) = obj.get_mut(field) {
            if !value.is_string() {
                let as_string = match value {
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                *value = Value::String(as_string);
            }
        }
    }
}

fn validate_against_schema(collection: &Collection, doc: &Value) -> AppResult<()> {
    let compiled = collection.compiled_schema()?;
    let errors: Vec<String> = compiled
        .validate(doc)
        .err()
        .map(|iter| iter.map(|e| e.to_string()).collect())
        .unwrap_or_default();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::DataValidation(errors.join("; ")))
    }
}

impl DataPlane {
    pub async fn upload_owned(
        &self,
        collection: &Collection,
        owner: &crate::ids::Did,
        acl: Vec<AclEntry>,
        docs: Vec<Value>,
    ) -> AppResult<UploadReport> {
        if collection.kind != CollectionType::Owned {
            return Err(AppError::DataValidation(
                "uploadOwned requires an owned collection".to_string(),
            ));
        }
        self.upload(collection, docs, Some((owner.clone(), acl))).await
    }

    pub async fn upload_standard(
        &self,
        collection: &Collection,
        docs: Vec<Value>,
    ) -> AppResult<UploadReport> {
        if collection.kind != CollectionType::Standard {
            return Err(AppError::DataValidation(
                "uploadStandard requires a standard collection".to_string(),
            ));
        }
        self.upload(collection, docs, None).await
    }

    async fn upload(
        &self,
        collection: &Collection,
        docs: Vec<Value>,
        owned: Option<(crate::ids::Did, Vec<AclEntry>)>,
    ) -> AppResult<UploadReport> {
        let now = Utc::now();
        let mut prepared = Vec::with_capacity(docs.len());
        let mut errors = Vec::new();

        for raw in docs {
            let mut coerced = raw.clone();
            coerce_schema_typed_fields(&collection.schema, &mut coerced);

            let mut stamped = match stamp_new_document(coerced, now) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(UploadError {
                        reason: e.to_string(),
                        doc: raw,
                    });
                    continue;
                }
            };

            if let Err(e) = validate_against_schema(collection, &stamped) {
                errors.push(UploadError {
                    reason: e.to_string(),
                    doc: stamped,
                });
                continue;
            }

            if let Some((owner, acl)) = &owned {
                let obj = stamped.as_object_mut().expect("stamped document is an object");
                obj.insert("_owner".to_string(), Value::String(owner.as_str()));
                obj.insert(
                    "_acl".to_string(),
                    serde_json::to_value(acl).map_err(AppError::from)?,
                );
            }
            prepared.push(stamped);
        }

        let ns = Namespace::Data(collection.meta.id);
        let report = self.store.insert_many(&ns, prepared).await?;

        for failure in report.failures {
            let reason = match failure.reason {
                InsertFailureReason::DuplicateKey => "duplicate entry".to_string(),
                InsertFailureReason::Other(msg) => msg,
            };
            errors.push(UploadError {
                reason,
                doc: failure.document,
            });
        }

        let created: Vec<Uuid> = report.inserted.into_iter().collect();

        if let Some((owner, acl)) = owned {
            self.record_owned_creation(
                &owner,
                &collection.owner,
                collection.meta.id,
                &created,
                !acl.is_empty(),
                now,
            )
            .await?;
        }

        Ok(UploadReport { created, errors })
    }

    /// `owner` is the document owner (a User); `builder` is the Collection's
    /// owning Builder, recorded in each `(builder, collection, document)`
    /// reference per §8 invariant 2.
    async fn record_owned_creation(
        &self,
        owner: &crate::ids::Did,
        builder: &crate::ids::Did,
        collection: Uuid,
        created: &[Uuid],
        granted_acl: bool,
        now: chrono::DateTime<Utc>,
    ) -> AppResult<()> {
        let mut user = self.load_or_create_user(owner, now).await?;
        for &doc_id in created {
            user.data.insert(crate::entities::DataRef {
                builder: builder.clone(),
                collection,
                document: doc_id,
            });
            user.record(LogOp::CreateData, collection, doc_id, now);
            if granted_acl {
                user.record(LogOp::GrantAccess, collection, doc_id, now);
            }
        }
        self.users.replace(&user).await
    }

    pub(crate) async fn load_or_create_user(
        &self,
        did: &crate::ids::Did,
        now: chrono::DateTime<Utc>,
    ) -> AppResult<crate::entities::User> {
        match self.users.find(did).await? {
            Some(user) => Ok(user),
            None => {
                let user = crate::entities::User::new(did.clone(), now);
                self.users.insert(&user).await?;
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRepo;
    use crate::ids::Did;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn plane() -> DataPlane {
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(MemoryStore::new());
        DataPlane::new(store.clone(), Arc::new(UserRepo::new(store)))
    }

    fn owned_collection() -> Collection {
        Collection::new(
            Did::parse("did:nil:aa").unwrap(),
            CollectionType::Owned,
            json!({"type": "object", "properties": {"v": {"type": "number"}}, "required": ["v"]}),
            "c".to_string(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn upload_owned_round_trip_updates_user() {
        let plane = plane();
        let collection = owned_collection();
        let owner = Did::parse("did:nil:u1").unwrap();

        let report = plane
            .upload_owned(&collection, &owner, vec![], vec![json!({"v": 1})])
            .await
            .unwrap();

        assert_eq!(report.created.len(), 1);
        assert!(report.errors.is_empty());

        let user = plane.users.find(&owner).await.unwrap().unwrap();
        assert_eq!(user.data.len(), 1);
        assert_eq!(user.logs.len(), 1);
        assert_eq!(user.logs[0].op, LogOp::CreateData);
    }

    #[tokio::test]
    async fn upload_owned_rejects_schema_violation() {
        let plane = plane();
        let collection = owned_collection();
        let owner = Did::parse("did:nil:u1").unwrap();

        let report = plane
            .upload_owned(&collection, &owner, vec![], vec![json!({"v": "not-a-number"})])
            .await
            .unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn upload_standard_rejects_owned_collection() {
        let plane = plane();
        let collection = owned_collection();
        let err = plane
            .upload_standard(&collection, vec![json!({"v": 1})])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DataValidation");
    }
}
