use crate::errors::DbError;
use crate::record::Record;
use crate::schema::{FieldType, Schema};
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{CmpOp, Fields, Filter, Order, Page, Query, SortSpec};

// Serde-facing structures for the JSON query shape
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuerySerde {
    #[serde(default, rename = "where")]
    filter: Option<Value>,
    #[serde(default)]
    order: Option<OrderSerde>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    skip: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    fields: Option<FieldsSerde>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderSerde {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldsSerde {
    One(String),
    Many(Vec<String>),
    Map(Map<String, Value>),
}

impl TryFrom<FieldsSerde> for Fields {
    type Error = DbError;
    fn try_from(fs: FieldsSerde) -> Result<Self, Self::Error> {
        Ok(match fs {
            FieldsSerde::One(n) => Self::Name(n),
            FieldsSerde::Many(v) => Self::List(v),
            FieldsSerde::Map(m) => Self::Map(
                m.into_iter()
                    .map(|(k, v)| match v {
                        Value::Bool(b) => Ok((k, b)),
                        other => Err(DbError::malformed(format!(
                            "fields entry `{k}` must be a boolean, got {other}"
                        ))),
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// # Errors
/// Returns `MalformedQuery` if the text is not a query object, carries unknown keys, or
/// any part of it has the wrong shape.
pub fn parse_query_json(json: &str, schema: &Schema) -> Result<Query, DbError> {
    let v: Value = serde_json::from_str(json)?;
    parse_query(v, schema)
}

/// # Errors
/// See [`parse_query_json`].
pub fn parse_query(v: Value, schema: &Schema) -> Result<Query, DbError> {
    let qs: QuerySerde = serde_json::from_value(v).map_err(|e| DbError::malformed(e.to_string()))?;
    let filter = match qs.filter {
        None | Some(Value::Null) => None,
        Some(w) => Some(parse_where(&w, schema)?),
    };
    let sort = match qs.order {
        None => Vec::new(),
        Some(OrderSerde::One(s)) => parse_order(&s)?,
        Some(OrderSerde::Many(v)) => {
            let mut out = Vec::new();
            for s in &v {
                out.extend(parse_order(s)?);
            }
            out
        }
    };
    Ok(Query {
        filter,
        sort,
        page: Page { skip: qs.skip, offset: qs.offset, limit: qs.limit },
        fields: qs.fields.map(Fields::try_from).transpose()?,
    })
}

/// `"name"`, `"name DESC"` or `"role ASC, order desc"`.
///
/// # Errors
/// Returns `MalformedQuery` for empty entries or an unknown direction.
pub fn parse_order(s: &str) -> Result<Vec<SortSpec>, DbError> {
    s.split(',')
        .map(|part| {
            let mut it = part.split_whitespace();
            let field = it
                .next()
                .ok_or_else(|| DbError::malformed(format!("empty order entry in `{s}`")))?;
            let order = match it.next() {
                None => Order::Asc,
                Some(d) if d.eq_ignore_ascii_case("asc") => Order::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => Order::Desc,
                Some(d) => return Err(DbError::malformed(format!("unknown order direction `{d}`"))),
            };
            if it.next().is_some() {
                return Err(DbError::malformed(format!("cannot parse order entry `{}`", part.trim())));
            }
            Ok(SortSpec { field: field.to_owned(), order })
        })
        .collect()
}

/// # Errors
/// Returns an error if the text is not valid JSON or not a where clause.
pub fn parse_where_json(json: &str, schema: &Schema) -> Result<Filter, DbError> {
    let v: Value = serde_json::from_str(json)?;
    parse_where(&v, schema)
}

/// Several keys in one object are and-ed; `{}` matches everything.
///
/// # Errors
/// Returns `MalformedQuery` for unknown fields or operators, non-list `and`/`or`
/// values, and array or object operands.
pub fn parse_where(v: &Value, schema: &Schema) -> Result<Filter, DbError> {
    let Value::Object(map) = v else {
        return Err(DbError::malformed(format!("where clause must be an object, got {v}")));
    };
    let mut clauses = Vec::with_capacity(map.len());
    for (key, val) in map {
        match key.as_str() {
            "and" => clauses.push(Filter::And(parse_clause_list(key, val, schema)?)),
            "or" => clauses.push(Filter::Or(parse_clause_list(key, val, schema)?)),
            field => parse_field_clause(field, val, schema, &mut clauses)?,
        }
    }
    if clauses.len() == 1 {
        return Ok(clauses.remove(0));
    }
    Ok(Filter::And(clauses))
}

fn parse_clause_list(key: &str, v: &Value, schema: &Schema) -> Result<Vec<Filter>, DbError> {
    let Value::Array(items) = v else {
        return Err(DbError::malformed(format!("`{key}` expects a list of where clauses")));
    };
    items.iter().map(|c| parse_where(c, schema)).collect()
}

fn parse_field_clause(
    field: &str,
    v: &Value,
    schema: &Schema,
    out: &mut Vec<Filter>,
) -> Result<(), DbError> {
    let ty = schema.field_type(field).ok_or_else(|| DbError::unknown_field(field))?;
    match v {
        Value::Object(ops) => {
            if ops.is_empty() {
                return Err(DbError::malformed(format!(
                    "No comparison operator provided for `{field}`"
                )));
            }
            for (k, operand) in ops {
                let op = CmpOp::from_keyword(k)
                    .ok_or_else(|| DbError::malformed(format!("unknown operator `{k}` on `{field}`")))?;
                out.push(Filter::Cmp { path: field.to_owned(), op, value: json_to_operand(operand, ty)? });
            }
        }
        scalar => out.push(Filter::Cmp {
            path: field.to_owned(),
            op: CmpOp::Eq,
            value: json_to_operand(scalar, ty)?,
        }),
    }
    Ok(())
}

/// Converts a JSON scalar into a comparison operand for a field of type `ty`.
/// Date fields accept date strings and epoch milliseconds.
///
/// # Errors
/// Returns `MalformedQuery` for arrays and objects.
pub fn json_to_operand(v: &Value, ty: FieldType) -> Result<Bson, DbError> {
    match v {
        Value::Array(_) | Value::Object(_) => {
            Err(DbError::malformed(format!("operand must be a scalar, got {v}")))
        }
        Value::String(s) if ty == FieldType::Date => {
            Ok(parse_date(s).map_or_else(|| Bson::String(s.clone()), date_to_bson))
        }
        Value::Number(n) if ty == FieldType::Date && n.is_i64() => {
            Ok(n.as_i64().map_or(Bson::Null, |ms| Bson::DateTime(bson::DateTime::from_millis(ms))))
        }
        other => Ok(json_to_bson(other)),
    }
}

/// RFC 3339, `YYYY-MM-DD` (UTC midnight) or `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC).
#[must_use]
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn date_to_bson(dt: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis()))
}

fn json_to_bson(v: &Value) -> Bson {
    match v {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32))
            .or_else(|| n.as_f64().map(Bson::Double))
            .unwrap_or(Bson::Null),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(m) => {
            Bson::Document(m.iter().map(|(k, v)| (k.clone(), json_to_bson(v))).collect())
        }
    }
}

/// # Errors
/// Returns an error if the text is not a JSON object.
pub fn parse_patch_json(json: &str, schema: &Schema) -> Result<BsonDocument, DbError> {
    let v: Value = serde_json::from_str(json)?;
    parse_patch(&v, schema)
}

/// Patch values are coerced like operands. Key rules are checked by
/// [`super::validate::validate_patch`] when the patch is applied.
///
/// # Errors
/// Returns `MalformedQuery` if `v` is not an object.
pub fn parse_patch(v: &Value, schema: &Schema) -> Result<BsonDocument, DbError> {
    let Value::Object(map) = v else {
        return Err(DbError::malformed(format!("update patch must be an object, got {v}")));
    };
    Ok(convert_object(map, schema))
}

/// Record data from a JSON object. An `id` key is ignored since the store assigns
/// identifiers.
///
/// # Errors
/// Returns `InvalidRecord` if `v` is not an object.
pub fn record_from_json(v: &Value, schema: &Schema) -> Result<BsonDocument, DbError> {
    let Value::Object(map) = v else {
        return Err(DbError::InvalidRecord(format!("record must be a JSON object, got {v}")));
    };
    let mut doc = convert_object(map, schema);
    doc.remove(ID_FIELD);
    Ok(doc)
}

fn convert_object(map: &Map<String, Value>, schema: &Schema) -> BsonDocument {
    map.iter()
        .map(|(k, v)| {
            let b = match (schema.field_type(k), v) {
                (Some(FieldType::Date), Value::String(s)) => {
                    parse_date(s).map_or_else(|| Bson::String(s.clone()), date_to_bson)
                }
                (Some(FieldType::Date), Value::Number(n)) if n.is_i64() => n
                    .as_i64()
                    .map_or(Bson::Null, |ms| Bson::DateTime(bson::DateTime::from_millis(ms))),
                _ => json_to_bson(v),
            };
            (k.clone(), b)
        })
        .collect()
}

/// JSON rendering for output; dates become RFC 3339 strings.
#[must_use]
pub fn bson_to_json(v: &Bson) -> Value {
    match v {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::DateTime(dt) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map_or(Value::Null, |d| Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true))),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(d) => document_to_json(d),
        other => Value::String(other.to_string()),
    }
}

#[must_use]
pub fn document_to_json(doc: &BsonDocument) -> Value {
    Value::Object(doc.iter().map(|(k, v)| (k.clone(), bson_to_json(v))).collect())
}

#[must_use]
pub fn record_to_json(record: &Record) -> Value {
    document_to_json(&record.to_document())
}
