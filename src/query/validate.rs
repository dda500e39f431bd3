use crate::config::QueryConfig;
use crate::errors::DbError;
use crate::schema::Schema;
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument};

use super::types::{Filter, Page, Query};

/// Checks a query against the schema and guard rails before it runs.
///
/// # Errors
/// Returns `MalformedQuery` for unknown fields, an empty `or`, non-scalar operands,
/// `limit: 0`, or a query beyond the configured bounds.
pub fn validate_query(q: &Query, schema: &Schema, cfg: &QueryConfig) -> Result<(), DbError> {
    if let Some(f) = &q.filter {
        validate_filter(f, schema, cfg)?;
    }
    if q.sort.len() > cfg.max_sort_fields {
        return Err(DbError::malformed(format!(
            "{} order keys exceed the maximum of {}",
            q.sort.len(),
            cfg.max_sort_fields
        )));
    }
    for s in &q.sort {
        let def = schema.field(&s.field);
        if def.is_none() && s.field != ID_FIELD {
            return Err(DbError::unknown_field(&s.field));
        }
        if def.is_some_and(|d| !d.sort) {
            log::debug!("ordering by `{}`, which is not flagged sortable", s.field);
        }
    }
    validate_page(&q.page)?;
    if let Some(fields) = &q.fields {
        if fields.len() > cfg.max_projection_fields {
            return Err(DbError::malformed(format!(
                "{} projection entries exceed the maximum of {}",
                fields.len(),
                cfg.max_projection_fields
            )));
        }
        if let Some(unknown) = fields.names().find(|n| !schema.contains(n)) {
            return Err(DbError::unknown_field(unknown));
        }
    }
    Ok(())
}

/// # Errors
/// Returns `MalformedQuery` for unknown fields, an empty `or`, non-scalar operands, or
/// nesting beyond `max_filter_depth`.
pub fn validate_filter(f: &Filter, schema: &Schema, cfg: &QueryConfig) -> Result<(), DbError> {
    let depth = f.depth();
    if depth > cfg.max_filter_depth {
        return Err(DbError::malformed(format!(
            "where clause depth {depth} exceeds the maximum of {}",
            cfg.max_filter_depth
        )));
    }
    check_filter(f, schema)
}

fn check_filter(f: &Filter, schema: &Schema) -> Result<(), DbError> {
    match f {
        Filter::Cmp { path, op, value } => {
            if !schema.contains(path) {
                return Err(DbError::unknown_field(path));
            }
            if matches!(value, Bson::Array(_) | Bson::Document(_)) {
                return Err(DbError::malformed(format!(
                    "`{path}` {} expects a scalar operand",
                    op.keyword()
                )));
            }
            Ok(())
        }
        Filter::And(fs) => fs.iter().try_for_each(|c| check_filter(c, schema)),
        Filter::Or(fs) => {
            if fs.is_empty() {
                return Err(DbError::malformed("`or` requires at least one clause"));
            }
            fs.iter().try_for_each(|c| check_filter(c, schema))
        }
    }
}

fn validate_page(page: &Page) -> Result<(), DbError> {
    if page.limit == Some(0) {
        return Err(DbError::malformed("limit must be a positive integer"));
    }
    if let (Some(skip), Some(offset)) = (page.skip, page.offset)
        && skip != offset
    {
        log::info!("both skip ({skip}) and offset ({offset}) given; using skip");
    }
    Ok(())
}

/// Clamps an explicit limit to `max_limit`.
#[must_use]
pub fn effective_page(page: Page, cfg: &QueryConfig) -> Page {
    match page.limit {
        Some(l) if l > cfg.max_limit => {
            log::warn!("limit {l} clamped to {}", cfg.max_limit);
            Page { limit: Some(cfg.max_limit), ..page }
        }
        _ => page,
    }
}

/// # Errors
/// Returns `MalformedQuery` if the patch is empty, names an undeclared field, targets
/// the identifier, or carries a value its field's type does not accept.
pub fn validate_patch(patch: &BsonDocument, schema: &Schema) -> Result<(), DbError> {
    if patch.is_empty() {
        return Err(DbError::malformed("update patch is empty"));
    }
    for k in patch.keys() {
        if k == ID_FIELD {
            return Err(DbError::malformed("the record identifier cannot be updated"));
        }
        if schema.field(k).is_none() {
            return Err(DbError::unknown_field(k));
        }
    }
    if let Some((k, ty)) = schema.mistyped(patch) {
        return Err(DbError::malformed(format!("patch value for `{k}` is not a {ty:?}")));
    }
    Ok(())
}
