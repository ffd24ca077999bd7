//! PostgreSQL document storage for kitchen.
//!
//! [`PostgresDocumentStore`] implements [`DocumentStore`] on top of a lazily connected
//! sqlx pool. The pool is built once at startup and shared by every request; the first
//! operation that needs the `documents` table creates it.

/// Document operations against the shared `documents` table.
pub mod documents;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;

use crate::{Collection, Document, DocumentStore, Fields, Filter, ObjectId, Order, StoreError};

/// A [`DocumentStore`] backed by PostgreSQL JSONB documents.
///
/// # Examples
/// ```no_run
/// # use kitchen::{DocumentStore, PostgresDocumentStore};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresDocumentStore::connect_lazy("postgres://localhost/kitchen")?;
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```
pub struct PostgresDocumentStore {
    pool: PgPool,
    schema: OnceCell<()>,
}

impl PostgresDocumentStore {
    /// Builds a pool for `database_url` without connecting.
    ///
    /// Connections are opened on first use, so a database that is down at startup only
    /// affects the requests that need it.
    pub fn connect_lazy(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().connect_lazy(database_url)?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    async fn ready(&self) -> Result<&PgPool, StoreError> {
        self.schema
            .get_or_try_init(|| documents::create_schema(&self.pool))
            .await?;
        Ok(&self.pool)
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn list(
        &self,
        collection: Collection,
        filter: &Filter,
        order: &Order,
    ) -> Result<Vec<Document>, StoreError> {
        documents::list(self.ready().await?, collection, filter, order).await
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        documents::find_one(self.ready().await?, collection, filter).await
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<ObjectId, StoreError> {
        documents::insert(self.ready().await?, collection, fields).await
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &ObjectId,
        fields: Fields,
    ) -> Result<bool, StoreError> {
        documents::update_fields(self.ready().await?, collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &ObjectId) -> Result<bool, StoreError> {
        documents::delete(self.ready().await?, collection, id).await
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError> {
        documents::delete_all(self.ready().await?, collection).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        documents::ping(&self.pool).await
    }
}

#[cfg(test)]
/// Test utilities for PostgreSQL database operations.
pub mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use serde_json::json;
    use sqlx::PgPool;

    use super::*;

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    /// Creates a unique test database for each test invocation.
    ///
    /// Returns `None` when `TEST_DATABASE_URL` is unset so that the suite still runs on
    /// machines without PostgreSQL.
    pub async fn setup_test_db() -> Option<PgPool> {
        let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping PostgreSQL test");
            return None;
        };

        let pid = std::process::id();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("kitchen_test_{}_{}_{}", pid, timestamp, counter);

        let mut parsed_url = url::Url::parse(&base_url).expect("Invalid database URL");

        let admin_pool = PgPool::connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin_pool)
            .await
            .expect("Failed to create test database");

        admin_pool.close().await;

        parsed_url.set_path(&format!("/{}", db_name));

        let pool = PgPool::connect(parsed_url.as_str())
            .await
            .expect("Failed to connect to test database");

        documents::create_schema(&pool)
            .await
            .expect("Failed to create documents table");

        Some(pool)
    }

    #[tokio::test]
    async fn store_creates_schema_on_first_use() {
        let Some(pool) = setup_test_db().await else {
            return;
        };
        sqlx::query("DROP TABLE documents")
            .execute(&pool)
            .await
            .unwrap();

        let store = PostgresDocumentStore::from_pool(pool);
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("Oatmeal Bowl"));
        let id = store.insert(Collection::Recipes, fields).await.unwrap();

        let doc = store
            .find_one(Collection::Recipes, &Filter::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Oatmeal Bowl")));
    }

    #[tokio::test]
    async fn connect_lazy_rejects_malformed_url() {
        assert!(PostgresDocumentStore::connect_lazy("not a url").is_err());
    }
}
