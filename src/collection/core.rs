use crate::config::QueryConfig;
use crate::errors::DbError;
use crate::schema::Schema;
use crate::store::{MemoryStore, RecordStore};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// A named record set with a fixed schema. Reads share the store lock; mutations
/// take it exclusively for filter and mutation together.
pub struct Collection {
    name: String,
    schema: Arc<Schema>,
    store: RwLock<Box<dyn RecordStore>>,
    config: QueryConfig,
}

impl Collection {
    /// An empty in-memory collection with default query bounds.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_store(name, schema, Box::new(MemoryStore::new()), QueryConfig::default())
    }

    #[must_use]
    pub fn with_store(
        name: impl Into<String>,
        schema: Schema,
        store: Box<dyn RecordStore>,
        config: QueryConfig,
    ) -> Self {
        Self { name: name.into(), schema: Arc::new(schema), store: RwLock::new(store), config }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// # Errors
    /// Returns the store's error.
    pub fn len(&self) -> Result<usize, DbError> {
        self.store.read().len()
    }

    /// # Errors
    /// Returns the store's error.
    pub fn is_empty(&self) -> Result<bool, DbError> {
        self.store.read().is_empty()
    }

    pub(crate) fn read_store(&self) -> RwLockReadGuard<'_, Box<dyn RecordStore>> {
        self.store.read()
    }

    pub(crate) fn write_store(&self) -> RwLockWriteGuard<'_, Box<dyn RecordStore>> {
        self.store.write()
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
