//! Field declarations consumed read-only by the query core.

use crate::errors::DbError;
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Date,
    Boolean,
}

impl FieldType {
    /// Whether a stored value of this shape can be compared under this type. Null
    /// stands for an absent value and is accepted everywhere.
    #[must_use]
    pub const fn accepts(self, v: &Bson) -> bool {
        matches!(
            (self, v),
            (_, Bson::Null)
                | (Self::Number, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
                | (Self::String, Bson::String(_))
                | (Self::Date, Bson::DateTime(_))
                | (Self::Boolean, Bson::Boolean(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub index: bool,
    #[serde(default)]
    pub sort: bool,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty, index: false, sort: false }
    }

    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.index = true;
        self
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sort = true;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SchemaSerde {
    #[serde(default)]
    fields: Vec<FieldDef>,
}

/// Ordered field declarations. The identifier pseudo-field `id` is implicit and
/// always resolves to [`FieldType::Number`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SchemaSerde")]
pub struct Schema {
    fields: Vec<FieldDef>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl TryFrom<SchemaSerde> for Schema {
    type Error = DbError;
    fn try_from(s: SchemaSerde) -> Result<Self, Self::Error> {
        Self::new(s.fields)
    }
}

impl Schema {
    /// # Errors
    /// Returns `InvalidSchema` on duplicate names, empty names, or a declared `id`.
    pub fn new(fields: Vec<FieldDef>) -> Result<Self, DbError> {
        let mut by_name = HashMap::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            if f.name.is_empty() {
                return Err(DbError::InvalidSchema("empty field name".into()));
            }
            if f.name == ID_FIELD {
                return Err(DbError::InvalidSchema(format!(
                    "`{ID_FIELD}` is reserved for the record identifier"
                )));
            }
            if by_name.insert(f.name.clone(), i).is_some() {
                return Err(DbError::InvalidSchema(format!("duplicate field `{}`", f.name)));
            }
        }
        Ok(Self { fields, by_name })
    }

    /// # Errors
    /// Returns an error if the TOML cannot be parsed or declares an invalid schema.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(s)?)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        if name == ID_FIELD {
            return Some(FieldType::Number);
        }
        self.field(name).map(|f| f.ty)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.field_type(name).is_some()
    }

    /// First declared field in `data` whose value its type does not accept.
    #[must_use]
    pub fn mistyped<'a>(&self, data: &'a BsonDocument) -> Option<(&'a str, FieldType)> {
        data.iter().find_map(|(k, v)| {
            self.field(k).filter(|f| !f.ty.accepts(v)).map(|f| (k.as_str(), f.ty))
        })
    }

    /// Every name the projector treats as declared: `id` first, then fields in
    /// declaration order.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(ID_FIELD).chain(self.fields.iter().map(|f| f.name.as_str()))
    }
}
