//! User-reference bookkeeping shared by `update`/`delete`/`flush` (§4.4)

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::LogOp;
use crate::error::AppResult;
use crate::ids::Did;

use super::DataPlane;

impl DataPlane {
    /// Append log entries (and, when `removing`, drop the reference) for
    /// every owned document in `matched`, batched per owner so each
    /// owner's User record is read and written once (§4.4, §9 Open
    /// Question 2: empty-data predicate removes the User record).
    pub(crate) async fn bookkeep_owned(
        &self,
        matched: &[Value],
        collection: Uuid,
        op: LogOp,
        now: DateTime<Utc>,
        removing: bool,
    ) -> AppResult<()> {
        let mut by_owner: HashMap<Did, Vec<Uuid>> = HashMap::new();
        for doc in matched {
            let (Some(owner), Some(id)) = (
                doc.get("_owner").and_then(Value::as_str).and_then(|s| Did::parse(s).ok()),
                doc.get("_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()),
            ) else {
                continue;
            };
            by_owner.entry(owner).or_default().push(id);
        }

        for (owner, doc_ids) in by_owner {
            let Some(mut user) = self.users.find(&owner).await? else {
                continue;
            };
            for doc_id in doc_ids {
                if removing {
                    user.data.retain(|r| !(r.collection == collection && r.document == doc_id));
                }
                user.record(op, collection, doc_id, now);
            }
            if removing && user.is_empty() {
                self.users.delete(&owner).await?;
            } else {
                self.users.replace(&user).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRepo;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn bookkeep_owned_removes_empty_user() {
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(MemoryStore::new());
        let users = Arc::new(UserRepo::new(store.clone()));
        let plane = DataPlane::new(store, users.clone());

        let owner = Did::parse("did:nil:u1").unwrap();
        let collection = Uuid::new_v4();
        let doc_id = Uuid::new_v4();
        let now = Utc::now();

        let mut user = crate::entities::User::new(owner.clone(), now);
        user.data.insert(crate::entities::DataRef {
            builder: Did::parse("did:nil:b1").unwrap(),
            collection,
            document: doc_id,
        });
        users.insert(&user).await.unwrap();

        let matched = vec![json!({"_id": doc_id.to_string(), "_owner": owner.as_str()})];
        plane
            .bookkeep_owned(&matched, collection, LogOp::DeleteData, now, true)
            .await
            .unwrap();

        assert!(users.find(&owner).await.unwrap().is_none());
    }
}
