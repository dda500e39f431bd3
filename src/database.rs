use crate::collection::Collection;
use crate::config::QueryConfig;
use crate::errors::DbError;
use crate::schema::Schema;
use crate::store::{MemoryStore, RecordStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named collections sharing one query configuration.
#[derive(Debug, Default)]
pub struct Database {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    config: QueryConfig,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        Self { collections: RwLock::new(HashMap::new()), config }
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Creates an in-memory collection.
    ///
    /// # Errors
    /// Returns `CollectionAlreadyExists` if the name is taken.
    pub fn define(&self, name: &str, schema: Schema) -> Result<Arc<Collection>, DbError> {
        self.define_with_store(name, schema, Box::new(MemoryStore::new()))
    }

    /// # Errors
    /// Returns `CollectionAlreadyExists` if the name is taken.
    pub fn define_with_store(
        &self,
        name: &str,
        schema: Schema,
        store: Box<dyn RecordStore>,
    ) -> Result<Arc<Collection>, DbError> {
        let mut cols = self.collections.write();
        if cols.contains_key(name) {
            return Err(DbError::CollectionAlreadyExists(name.to_owned()));
        }
        let col = Arc::new(Collection::with_store(name, schema, store, self.config.clone()));
        cols.insert(name.to_owned(), col.clone());
        log::info!("defined collection {name}");
        Ok(col)
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// # Errors
    /// Returns `NoSuchCollection` if the name is unknown.
    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.collection(name).ok_or_else(|| DbError::NoSuchCollection(name.to_owned()))
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        let dropped = self.collections.write().remove(name).is_some();
        if dropped {
            log::info!("dropped collection {name}");
        }
        dropped
    }

    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldType};

    fn schema() -> Schema {
        Schema::new(vec![FieldDef::new("name", FieldType::String)]).unwrap()
    }

    #[test]
    fn define_lookup_drop() {
        let db = Database::new();
        db.define("users", schema()).unwrap();
        db.define("posts", schema()).unwrap();
        assert!(matches!(db.define("users", schema()), Err(DbError::CollectionAlreadyExists(_))));
        assert_eq!(db.collection_names(), vec!["posts".to_owned(), "users".to_owned()]);
        assert_eq!(db.get_collection("users").unwrap().name(), "users");
        assert!(db.drop_collection("users"));
        assert!(!db.drop_collection("users"));
        assert!(matches!(db.get_collection("users"), Err(DbError::NoSuchCollection(_))));
    }

    #[test]
    fn collections_inherit_the_config() {
        let db = Database::with_config(QueryConfig { max_limit: 3, ..QueryConfig::default() });
        let c = db.define("t", schema()).unwrap();
        assert_eq!(c.config().max_limit, 3);
    }
}
