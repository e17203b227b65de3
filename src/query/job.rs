//! Background query execution (§4.5 "Background execution")
//!
//! A background run is a [`QueryRun`] record that starts `pending`, flips to
//! `running` once the spawned task picks it up, and ends `complete` or
//! `error` — never both, never back. The HTTP layer hands the caller the run
//! id the moment it is created; the task updates the record as it
//! progresses and the caller polls for it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{Query, QueryRunRepo};
use crate::error::AppResult;
use crate::system::logger::{self, Severity};

use super::execution::QueryExecutor;

/// §4.5: background runs are killed after 30 minutes.
pub const BACKGROUND_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct QueryJobRunner {
    runs: Arc<QueryRunRepo>,
    executor: Arc<QueryExecutor>,
}

impl QueryJobRunner {
    pub fn new(runs: Arc<QueryRunRepo>, executor: Arc<QueryExecutor>) -> Self {
        Self { runs, executor }
    }

    /// Creates the `pending` QueryRun, returns its id immediately, and
    /// spawns the task that will drive it to completion.
    pub async fn spawn(&self, query: Query, provided: HashMap<String, Value>) -> AppResult<Uuid> {
        let run = crate::entities::QueryRun::new_pending(query.meta.id, Utc::now());
        let run_id = run.meta.id;
        self.runs.insert(&run).await?;

        let runs = self.runs.clone();
        let executor = self.executor.clone();
        tokio::spawn(async move {
            run_job(runs, executor, run_id, query, provided).await;
        });

        Ok(run_id)
    }
}

async fn run_job(
    runs: Arc<QueryRunRepo>,
    executor: Arc<QueryExecutor>,
    run_id: Uuid,
    query: Query,
    provided: HashMap<String, Value>,
) {
    let Ok(Some(mut run)) = runs.find(run_id).await else {
        let run_id_str = run_id.to_string();
        logger::log(Severity::Error, "query_run_missing_at_start", &[("run", run_id_str.as_str())]);
        return;
    };

    run.start(Utc::now());
    if runs.replace(&run).await.is_err() {
        return;
    }

    let outcome = tokio::time::timeout(BACKGROUND_TIMEOUT, executor.run(&query, provided)).await;

    match outcome {
        Ok(Ok(result)) => {
            run.complete(Value::Array(result), Utc::now());
        }
        Ok(Err(e)) => {
            run.fail(vec![e.to_string()], Utc::now());
        }
        Err(_) => {
            run.fail(vec!["query execution timed out".to_string()], Utc::now());
        }
    }

    if let Err(e) = runs.replace(&run).await {
        let run_id_str = run_id.to_string();
        let error_str = e.to_string();
        logger::log(
            Severity::Error,
            "query_run_persist_failed",
            &[("run", run_id_str.as_str()), ("error", error_str.as_str())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Collection, CollectionRepo, VariableSpec};
    use crate::ids::{CollectionType, Did};
    use crate::store::{DocumentStore, MemoryStore, Namespace};
    use serde_json::json;

    #[tokio::test]
    async fn background_run_completes_and_is_terminal() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let collections = Arc::new(CollectionRepo::new(store.clone()));
        let runs = Arc::new(QueryRunRepo::new(store.clone()));
        let owner = Did::parse("did:nil:aa").unwrap();
        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            Utc::now(),
        );
        collections.insert(&collection).await.unwrap();
        store
            .insert_many(
                &Namespace::Data(collection.meta.id),
                vec![json!({"_id": Uuid::new_v4().to_string(), "age": 42})],
            )
            .await
            .unwrap();

        let mut variables = HashMap::new();
        variables.insert(
            "age".to_string(),
            VariableSpec {
                path: "$.pipeline.0.$match.age".to_string(),
                description: None,
                optional: false,
            },
        );
        let query = Query::new(
            owner,
            "q".to_string(),
            collection.meta.id,
            variables,
            vec![json!({"$match": {"age": 0}})],
            Utc::now(),
        );

        let executor = Arc::new(QueryExecutor::new(store, collections));
        let runner = QueryJobRunner::new(runs.clone(), executor);

        let mut provided = HashMap::new();
        provided.insert("age".to_string(), json!(42));
        let run_id = runner.spawn(query, provided).await.unwrap();

        let mut seen_terminal = false;
        for _ in 0..50 {
            let run = runs.find(run_id).await.unwrap().unwrap();
            if run.status.is_terminal() {
                seen_terminal = true;
                assert_eq!(run.status, crate::entities::RunStatus::Complete);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(seen_terminal, "background run never reached a terminal state");
    }
}
