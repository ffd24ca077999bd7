//! # Document Store Abstraction
//!
//! The [`DocumentStore`] trait is the only path from the resource controllers to durable
//! state. It exposes collection-scoped CRUD primitives over [`Document`]s keyed by
//! [`ObjectId`]. Every call is a single round trip; there are no transactions, no caching
//! and no retries at this layer.
//!
//! ## Implementations
//!
//! - **InMemoryDocumentStore**: ordered maps behind a `Mutex`, for tests and local runs
//! - **PostgresDocumentStore**: JSONB documents in PostgreSQL (see [`crate::sql`])
//!
//! ## Usage Examples
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use kitchen::{Collection, DocumentStore, Fields, Filter, InMemoryDocumentStore, Order};
//! use serde_json::json;
//!
//! let store = InMemoryDocumentStore::new();
//! let mut fields = Fields::new();
//! fields.insert("name".into(), json!("Tomato Egg"));
//!
//! let id = store.insert(Collection::Recipes, fields).await.unwrap();
//! let found = store.find_one(Collection::Recipes, &Filter::by_id(id)).await.unwrap();
//! assert_eq!(found.unwrap().get("name"), Some(&json!("Tomato Egg")));
//!
//! let all = store.list(Collection::Recipes, &Filter::new(), &Order::default()).await.unwrap();
//! assert_eq!(all.len(), 1);
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{Collection, Document, Fields, Filter, ObjectId, Order, StoreError};

/// Collection-scoped CRUD over stored documents.
///
/// Implementations must be safe to share between concurrently running requests; the
/// service holds exactly one instance behind an `Arc<dyn DocumentStore>`.
///
/// # Error Handling
///
/// "Not found" is never an error at this layer: lookups return `Option` and mutations
/// return whether a document matched. Every `Err` is a backend failure.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document in `collection` matching `filter`, sorted by `order`.
    async fn list(
        &self,
        collection: Collection,
        filter: &Filter,
        order: &Order,
    ) -> Result<Vec<Document>, StoreError>;

    /// Returns one document matching `filter`, if any.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Stores a new document and returns the identifier assigned to it.
    async fn insert(&self, collection: Collection, fields: Fields) -> Result<ObjectId, StoreError>;

    /// Replaces the given top-level fields of one document, leaving the rest untouched.
    ///
    /// # Returns
    /// * `Ok(true)` - A document with `id` existed and was updated
    /// * `Ok(false)` - No document with `id` exists
    async fn update_fields(
        &self,
        collection: Collection,
        id: &ObjectId,
        fields: Fields,
    ) -> Result<bool, StoreError>;

    /// Deletes one document.
    ///
    /// # Returns
    /// * `Ok(true)` - A document with `id` existed and was deleted
    /// * `Ok(false)` - No document with `id` exists
    async fn delete(&self, collection: Collection, id: &ObjectId) -> Result<bool, StoreError>;

    /// Deletes every document in `collection` and returns how many there were.
    async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

type CollectionMap = BTreeMap<ObjectId, Fields>;

/// Thread-safe in-memory implementation of [`DocumentStore`].
///
/// Documents live in one ordered map per collection, so identifier order (and therefore
/// creation order) is the map's natural order.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<Collection, CollectionMap>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Collection, CollectionMap>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Internal("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(
        &self,
        collection: Collection,
        filter: &Filter,
        order: &Order,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock()?;
        let Some(documents) = collections.get(&collection) else {
            return Ok(Vec::new());
        };
        let mut matching: Vec<(&ObjectId, &Fields)> = documents
            .iter()
            .filter(|(id, fields)| filter.matches(id, fields))
            .collect();
        matching.sort_by(|a, b| order.compare(*a, *b));
        Ok(matching
            .into_iter()
            .map(|(id, fields)| Document::new(*id, fields.clone()))
            .collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.lock()?;
        Ok(collections.get(&collection).and_then(|documents| {
            documents
                .iter()
                .find(|(id, fields)| filter.matches(id, fields))
                .map(|(id, fields)| Document::new(*id, fields.clone()))
        }))
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<ObjectId, StoreError> {
        let mut collections = self.lock()?;
        let documents = collections.entry(collection).or_default();
        let mut id = ObjectId::generate();
        while documents.contains_key(&id) {
            id = ObjectId::generate();
        }
        documents.insert(id, fields);
        Ok(id)
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &ObjectId,
        fields: Fields,
    ) -> Result<bool, StoreError> {
        let mut collections = self.lock()?;
        match collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(id))
        {
            Some(existing) => {
                existing.extend(fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, id: &ObjectId) -> Result<bool, StoreError> {
        let mut collections = self.lock()?;
        Ok(collections
            .get_mut(&collection)
            .is_some_and(|documents| documents.remove(id).is_some()))
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError> {
        let mut collections = self.lock()?;
        let removed = collections.remove(&collection).map_or(0, |d| d.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
