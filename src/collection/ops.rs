use super::core::Collection;
use crate::errors::DbError;
use crate::query::{self, DeleteReport, Filter, Query, UpdateReport, telemetry};
use crate::record::Record;
use crate::types::{ID_FIELD, RecordId};
use bson::Document as BsonDocument;

impl Collection {
    /// Stores a new record and returns it with its assigned identifier.
    ///
    /// # Errors
    /// Returns `InvalidRecord` if `data` carries an `id` key or a declared field holds a
    /// value its type does not accept (nested values included), or the store's error.
    pub fn create(&self, data: BsonDocument) -> Result<Record, DbError> {
        if data.contains_key(ID_FIELD) {
            return Err(DbError::InvalidRecord("identifiers are assigned by the store".into()));
        }
        if let Some((k, ty)) = self.schema().mistyped(&data) {
            return Err(DbError::InvalidRecord(format!("field `{k}` must hold a {ty:?} value")));
        }
        let record = self.write_store().insert(data)?;
        telemetry::log_audit("insert", self.name(), &record.id.to_string());
        log::debug!("created record {} in {}", record.id, self.name());
        Ok(record)
    }

    /// # Errors
    /// Returns `MalformedQuery` for an invalid query, or the store's error.
    pub fn find(&self, q: &Query) -> Result<Vec<BsonDocument>, DbError> {
        query::find_records(self, q)
    }

    /// Every record, in identifier order.
    ///
    /// # Errors
    /// Returns the store's error.
    pub fn all(&self) -> Result<Vec<BsonDocument>, DbError> {
        self.find(&Query::new())
    }

    /// Parses a JSON query against this collection's schema and runs it.
    ///
    /// # Errors
    /// Returns an error if the JSON is invalid or the query is malformed.
    pub fn find_json(&self, json: &str) -> Result<Vec<BsonDocument>, DbError> {
        let q = query::parse_query_json(json, self.schema())?;
        self.find(&q)
    }

    /// # Errors
    /// Returns `MalformedQuery` for an invalid query, or the store's error.
    pub fn find_one(&self, q: &Query) -> Result<Option<BsonDocument>, DbError> {
        query::find_one(self, q)
    }

    /// # Errors
    /// Returns the store's error.
    pub fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, DbError> {
        query::find_by_id(self, id)
    }

    /// # Errors
    /// Returns the store's error.
    pub fn exists(&self, id: RecordId) -> Result<bool, DbError> {
        query::exists(self, id)
    }

    /// # Errors
    /// Returns `MalformedQuery` for an invalid filter, or the store's error.
    pub fn count(&self, filter: Option<&Filter>) -> Result<usize, DbError> {
        query::count_records(self, filter)
    }

    /// Removes every record matching `filter`; `None` empties the collection.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for an invalid filter, or the store's error.
    pub fn destroy_all(&self, filter: Option<&Filter>) -> Result<DeleteReport, DbError> {
        query::delete_many(self, filter)
    }

    /// # Errors
    /// Returns `MalformedQuery` for an invalid filter or patch, or the store's error.
    pub fn update(
        &self,
        filter: Option<&Filter>,
        patch: &BsonDocument,
    ) -> Result<UpdateReport, DbError> {
        query::update_many(self, filter, patch)
    }

    /// Applies `patch` to every record.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for an invalid patch, or the store's error.
    pub fn update_all(&self, patch: &BsonDocument) -> Result<UpdateReport, DbError> {
        self.update(None, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortSpec;
    use crate::schema::{FieldDef, FieldType, Schema};
    use bson::doc;

    fn col() -> Collection {
        let schema = Schema::new(vec![
            FieldDef::new("name", FieldType::String).sortable(),
            FieldDef::new("order", FieldType::Number),
        ])
        .unwrap();
        let c = Collection::new("users", schema);
        for (name, order) in [("b", 2), ("a", 1), ("c", 3)] {
            c.create(doc! {"name": name, "order": order}).unwrap();
        }
        c
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let c = col();
        let r = c.create(doc! {"name": "d"}).unwrap();
        assert_eq!(r.id, RecordId(4));
        assert_eq!(c.len().unwrap(), 4);
    }

    #[test]
    fn create_rejects_identifier_and_nested_values() {
        let c = col();
        assert!(matches!(c.create(doc! {"id": 9}), Err(DbError::InvalidRecord(_))));
        assert!(matches!(c.create(doc! {"name": [1, 2]}), Err(DbError::InvalidRecord(_))));
        assert_eq!(c.len().unwrap(), 3);
    }

    #[test]
    fn create_rejects_values_of_the_wrong_type() {
        let c = col();
        assert!(matches!(c.create(doc! {"order": "three"}), Err(DbError::InvalidRecord(_))));
        assert!(matches!(c.create(doc! {"name": 3}), Err(DbError::InvalidRecord(_))));
        assert_eq!(c.count(Some(&Filter::eq("order", "three"))).unwrap(), 0);
        assert_eq!(c.len().unwrap(), 3);
        c.create(doc! {"name": "d", "order": 4.5, "note": [1]}).unwrap();
        c.create(doc! {"name": bson::Bson::Null}).unwrap();
    }

    #[test]
    fn find_sorts_and_find_one_takes_the_first() {
        let c = col();
        let out = c.find(&Query::new().order(SortSpec::asc("name"))).unwrap();
        let names: Vec<&str> = out.iter().map(|d| d.get_str("name").unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let first = c.find_one(&Query::new()).unwrap().unwrap();
        assert_eq!(first.get_str("name").unwrap(), "b");
    }

    #[test]
    fn update_then_destroy() {
        let c = col();
        let rep = c.update(Some(&Filter::gt("order", 1)), &doc! {"order": 10}).unwrap();
        assert_eq!(rep, UpdateReport { matched: 2, modified: 2 });
        let rep = c.update_all(&doc! {"order": 10}).unwrap();
        assert_eq!(rep, UpdateReport { matched: 3, modified: 1 });
        assert_eq!(c.destroy_all(Some(&Filter::eq("name", "a"))).unwrap().deleted, 1);
        assert!(!c.exists(RecordId(2)).unwrap());
        assert_eq!(c.destroy_all(None).unwrap().deleted, 2);
        assert!(c.is_empty().unwrap());
    }
}
