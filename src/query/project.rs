use crate::record::Record;
use crate::schema::Schema;
use bson::Document as BsonDocument;
use std::collections::HashSet;

use super::types::{Fields, Projection};

impl Fields {
    /// Resolves the caller's shape into a projection mode. Any `true` entry selects
    /// inclusion mode and `false` entries are then ignored.
    #[must_use]
    pub fn normalize(&self) -> Projection {
        let include: Vec<&str> = match self {
            Self::Name(n) => vec![n.as_str()],
            Self::List(v) => v.iter().map(String::as_str).collect(),
            Self::Map(m) => m.iter().filter(|(_, on)| *on).map(|(k, _)| k.as_str()).collect(),
        };
        if !include.is_empty() {
            return Projection::Include(dedup(include));
        }
        let exclude: Vec<&str> = match self {
            Self::Map(m) => m.iter().filter(|(_, on)| !*on).map(|(k, _)| k.as_str()).collect(),
            Self::Name(_) | Self::List(_) => Vec::new(),
        };
        if exclude.is_empty() { Projection::All } else { Projection::Exclude(dedup(exclude)) }
    }
}

fn dedup(names: Vec<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(*n)).map(str::to_owned).collect()
}

impl Projection {
    #[must_use]
    pub fn apply(&self, record: &Record, schema: &Schema) -> BsonDocument {
        self.apply_document(&record.to_document(), schema)
    }

    /// Projects a flat document (identifier under `id`). Fields absent on the source
    /// contribute nothing.
    #[must_use]
    pub fn apply_document(&self, doc: &BsonDocument, schema: &Schema) -> BsonDocument {
        match self {
            Self::All => doc.clone(),
            Self::Include(fields) => pick(doc, fields.iter().map(String::as_str)),
            Self::Exclude(fields) => pick(
                doc,
                schema.declared_names().filter(|n| !fields.iter().any(|f| f.as_str() == *n)),
            ),
        }
    }
}

fn pick<'a>(doc: &BsonDocument, names: impl Iterator<Item = &'a str>) -> BsonDocument {
    let mut out = BsonDocument::new();
    for n in names {
        if let Some(v) = doc.get(n) {
            out.insert(n.to_owned(), v.clone());
        }
    }
    out
}
