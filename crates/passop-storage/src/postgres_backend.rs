//! PostgreSQL document store.
//!
//! Stores every document as `JSONB` in a single `documents` table, tagged
//! with its collection name. Each filter field becomes a top-level equality
//! test (`doc -> key = value`), the same rule as [`crate::matches`], and
//! updates map onto `doc || set`, so matching happens in the database rather
//! than in process.
//!
//! Feature-gated behind `postgres-backend`. Uses `sqlx` with the Tokio
//! runtime for fully async operations, with no `spawn_blocking`.

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::{assign_id, Document, DocumentStore, StorageError, ID_FIELD};

/// A document collection backed by PostgreSQL.
///
/// Thread-safe via `PgPool` (connection pool). All operations are fully async.
///
/// # Examples
///
/// ```no_run
/// # use passop_storage::PostgresBackend;
/// # #[tokio::main]
/// # async fn main() {
/// let backend = PostgresBackend::connect("postgres://localhost/passop", "passwords")
///     .await
///     .unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    collection: String,
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("pool", &"[PgPool]")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl PostgresBackend {
    /// Connect to PostgreSQL and create the `documents` table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the connection or table creation fails.
    pub async fn connect(database_url: &str, collection: &str) -> Result<Self, StorageError> {
        // Never echo credentials embedded in the URL.
        let location = "[postgres]".to_owned();

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Open {
                location: location.clone(),
                reason: e.to_string(),
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (\
                seq        BIGSERIAL PRIMARY KEY, \
                collection TEXT  NOT NULL, \
                id         TEXT  NOT NULL UNIQUE, \
                doc        JSONB NOT NULL\
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| StorageError::Open {
            location: location.clone(),
            reason: format!("table creation failed: {e}"),
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection \
             ON documents (collection, seq)",
        )
        .execute(&pool)
        .await
        .map_err(|e| StorageError::Open {
            location,
            reason: format!("index creation failed: {e}"),
        })?;

        info!(collection, "postgres document store ready");
        Ok(Self {
            pool,
            collection: collection.to_owned(),
        })
    }
}

/// Append a subquery selecting the `seq` of the first document in
/// `collection` whose top-level fields equal every field of `filter`.
///
/// `doc -> key` is NULL for a missing key, so a missing field never matches,
/// not even a `null` filter value.
fn push_first_match(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Document) {
    qb.push("SELECT seq FROM documents WHERE collection = ");
    qb.push_bind(collection.to_owned());
    for (key, value) in filter {
        qb.push(" AND doc -> ");
        qb.push_bind(key.clone());
        qb.push(" = ");
        qb.push_bind(Json(value.clone()));
    }
    qb.push(" ORDER BY seq LIMIT 1");
}

fn filter_id(filter: &Document) -> String {
    filter
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[async_trait::async_trait]
impl DocumentStore for PostgresBackend {
    async fn find_all(&self) -> Result<Vec<Document>, StorageError> {
        let rows: Vec<(Json<Document>,)> =
            sqlx::query_as("SELECT doc FROM documents WHERE collection = $1 ORDER BY seq")
                .bind(&self.collection)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Read {
                    collection: self.collection.clone(),
                    reason: e.to_string(),
                })?;

        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn insert_one(&self, doc: Document) -> Result<Document, StorageError> {
        let (id, doc) = assign_id(doc);

        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(&self.collection)
            .bind(&id)
            .bind(Json(&doc))
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Write {
                id,
                reason: e.to_string(),
            })?;

        Ok(doc)
    }

    async fn delete_one(&self, filter: &Document) -> Result<u64, StorageError> {
        let mut qb = QueryBuilder::new("DELETE FROM documents WHERE seq = (");
        push_first_match(&mut qb, &self.collection, filter);
        qb.push(")");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Delete {
                id: filter_id(filter),
                reason: e.to_string(),
            })?;

        Ok(result.rows_affected())
    }

    async fn update_one(
        &self,
        filter: &Document,
        set: &Document,
    ) -> Result<Option<Document>, StorageError> {
        let mut set = set.clone();
        set.remove(ID_FIELD);

        let mut qb = QueryBuilder::new("UPDATE documents SET doc = doc || ");
        qb.push_bind(Json(set));
        qb.push(" WHERE seq = (");
        push_first_match(&mut qb, &self.collection, filter);
        qb.push(") RETURNING doc");

        let row: Option<(Json<Document>,)> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Write {
                id: filter_id(filter),
                reason: e.to_string(),
            })?;

        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        debug!(collection = %self.collection, "postgres pool closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::new_document_id;

    /// Connect to the database named by `PASSOP_TEST_DATABASE_URL`, using a
    /// fresh collection. `None` when the variable is unset.
    async fn backend() -> Option<PostgresBackend> {
        let url = std::env::var("PASSOP_TEST_DATABASE_URL").ok()?;
        let collection = format!("test-{}", new_document_id());
        Some(PostgresBackend::connect(&url, &collection).await.unwrap())
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn insert_update_delete_by_filter() {
        let Some(db) = backend().await else {
            return;
        };

        let first = db
            .insert_one(doc(json!({"site": "a.com", "userId": "u1"})))
            .await
            .unwrap();
        db.insert_one(doc(json!({"site": "b.com", "userId": "u2"})))
            .await
            .unwrap();

        let updated = db
            .update_one(
                &doc(json!({"_id": first["_id"], "userId": "u1"})),
                &doc(json!({"site": "c.com"})),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["site"], json!("c.com"));
        assert_eq!(updated["_id"], first["_id"]);

        assert_eq!(db.delete_one(&doc(json!({"userId": "u3"}))).await.unwrap(), 0);
        assert_eq!(db.delete_one(&doc(json!({"userId": "u2"}))).await.unwrap(), 1);

        let rest = db.find_all().await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["site"], json!("c.com"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn filters_compare_whole_values() {
        let Some(db) = backend().await else {
            return;
        };

        db.insert_one(doc(json!({"tags": ["x"], "meta": {"a": 1, "b": 2}})))
            .await
            .unwrap();

        for filter in [
            json!({"tags": []}),
            json!({"tags": "x"}),
            json!({"meta": {"a": 1}}),
            json!({"missing": null}),
        ] {
            let filter = doc(filter);
            assert!(db.update_one(&filter, &Document::new()).await.unwrap().is_none());
            assert_eq!(db.delete_one(&filter).await.unwrap(), 0);
        }

        assert_eq!(
            db.delete_one(&doc(json!({"tags": ["x"]}))).await.unwrap(),
            1
        );
        db.close().await.unwrap();
    }
}
