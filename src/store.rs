//! Record storage seam. Durability lives behind this trait; the query core only
//! scans, looks up, inserts, removes, and patches.

use crate::errors::DbError;
use crate::record::Record;
use crate::types::RecordId;
use bson::Document as BsonDocument;
use std::collections::BTreeMap;

pub type RecordIter<'a> = Box<dyn Iterator<Item = &'a Record> + 'a>;

pub trait RecordStore: Send + Sync {
    /// Every record in a stable order (insertion order for [`MemoryStore`]).
    fn scan(&self) -> Result<RecordIter<'_>, DbError>;
    fn get(&self, id: RecordId) -> Result<Option<&Record>, DbError>;
    /// Stores `data` under a freshly assigned identifier.
    fn insert(&mut self, data: BsonDocument) -> Result<Record, DbError>;
    fn remove(&mut self, id: RecordId) -> Result<Option<Record>, DbError>;
    /// Merges `patch` into the record. `None` if the record does not exist,
    /// otherwise whether any field changed.
    fn update_fields(&mut self, id: RecordId, patch: &BsonDocument)
    -> Result<Option<bool>, DbError>;
    fn len(&self) -> Result<usize, DbError>;

    fn is_empty(&self) -> Result<bool, DbError> {
        Ok(self.len()? == 0)
    }
}

/// In-memory store keyed by identifier; iteration order equals insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, Record>,
    next_id: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn scan(&self) -> Result<RecordIter<'_>, DbError> {
        Ok(Box::new(self.records.values()))
    }

    fn get(&self, id: RecordId) -> Result<Option<&Record>, DbError> {
        Ok(self.records.get(&id))
    }

    fn insert(&mut self, data: BsonDocument) -> Result<Record, DbError> {
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| DbError::Store("record identifier space exhausted".into()))?;
        let record = Record::new(RecordId(self.next_id), data);
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn remove(&mut self, id: RecordId) -> Result<Option<Record>, DbError> {
        Ok(self.records.remove(&id))
    }

    fn update_fields(
        &mut self,
        id: RecordId,
        patch: &BsonDocument,
    ) -> Result<Option<bool>, DbError> {
        Ok(self.records.get_mut(&id).map(|r| r.merge(patch)))
    }

    fn len(&self) -> Result<usize, DbError> {
        Ok(self.records.len())
    }
}
