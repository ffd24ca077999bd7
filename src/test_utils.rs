#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::{
        Collection, Document, DocumentStore, Fields, Filter, InMemoryDocumentStore, ObjectId,
        Order, StoreError,
    };

    /// Creates a test data store instance
    pub fn test_data_store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    /// Unwraps a JSON object literal into document fields
    pub fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    /// An in-memory store that counts every call made to it
    #[derive(Default)]
    pub struct RecordingStore {
        inner: InMemoryDocumentStore,
        calls: AtomicUsize,
    }

    impl RecordingStore {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Number of store operations issued so far
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn list(
            &self,
            collection: Collection,
            filter: &Filter,
            order: &Order,
        ) -> Result<Vec<Document>, StoreError> {
            self.record();
            self.inner.list(collection, filter, order).await
        }

        async fn find_one(
            &self,
            collection: Collection,
            filter: &Filter,
        ) -> Result<Option<Document>, StoreError> {
            self.record();
            self.inner.find_one(collection, filter).await
        }

        async fn insert(
            &self,
            collection: Collection,
            fields: Fields,
        ) -> Result<ObjectId, StoreError> {
            self.record();
            self.inner.insert(collection, fields).await
        }

        async fn update_fields(
            &self,
            collection: Collection,
            id: &ObjectId,
            fields: Fields,
        ) -> Result<bool, StoreError> {
            self.record();
            self.inner.update_fields(collection, id, fields).await
        }

        async fn delete(&self, collection: Collection, id: &ObjectId) -> Result<bool, StoreError> {
            self.record();
            self.inner.delete(collection, id).await
        }

        async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError> {
            self.record();
            self.inner.delete_all(collection).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.record();
            self.inner.ping().await
        }
    }

    /// A store whose every operation fails as if the backend were down
    pub struct UnavailableStore;

    #[async_trait]
    impl DocumentStore for UnavailableStore {
        async fn list(
            &self,
            _: Collection,
            _: &Filter,
            _: &Order,
        ) -> Result<Vec<Document>, StoreError> {
            Err(down())
        }

        async fn find_one(
            &self,
            _: Collection,
            _: &Filter,
        ) -> Result<Option<Document>, StoreError> {
            Err(down())
        }

        async fn insert(&self, _: Collection, _: Fields) -> Result<ObjectId, StoreError> {
            Err(down())
        }

        async fn update_fields(
            &self,
            _: Collection,
            _: &ObjectId,
            _: Fields,
        ) -> Result<bool, StoreError> {
            Err(down())
        }

        async fn delete(&self, _: Collection, _: &ObjectId) -> Result<bool, StoreError> {
            Err(down())
        }

        async fn delete_all(&self, _: Collection) -> Result<u64, StoreError> {
            Err(down())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(down())
        }
    }

    fn down() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }
}
