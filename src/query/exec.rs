use crate::collection::Collection;
use crate::errors::DbError;
use crate::record::Record;
use crate::types::RecordId;
use crate::utils::devlog::bench_line;
use crate::utils::num::{elapsed_ms, usize_to_u64};
use bson::Document as BsonDocument;
use std::time::Instant;

use super::eval::{compare_records, matches};
use super::page::paginate;
use super::telemetry::{self, QueryEvent};
use super::types::{DeleteReport, Filter, Page, Projection, Query, UpdateReport};
use super::validate::{effective_page, validate_filter, validate_patch, validate_query};

fn log_read(col: &Collection, op: &str, filter: Option<&Filter>, start: Instant, n: usize) {
    let duration_ms = elapsed_ms(start);
    telemetry::log_query(&QueryEvent {
        collection: col.name(),
        op,
        filter_dbg: &format!("{filter:?}"),
        duration_ms,
        result_count: n,
        slow_query_ms: col.config().slow_query_ms,
    });
    crate::dev6!(
        "{}",
        bench_line(op, col.name(), &[("duration_ms", duration_ms), ("result_count", usize_to_u64(n))])
    );
}

/// Filter, stable sort, paginate, project. The read lock is held for the whole scan.
///
/// # Errors
/// Returns `MalformedQuery` if validation fails, or the store's error.
pub fn find_records(col: &Collection, q: &Query) -> Result<Vec<BsonDocument>, DbError> {
    let start = Instant::now();
    let schema = col.schema();
    validate_query(q, schema, col.config())?;
    let page = effective_page(q.page, col.config());
    let projection = q.fields.as_ref().map_or(Projection::All, |f| f.normalize());

    let out: Vec<BsonDocument> = {
        let store = col.read_store();
        let mut hits: Vec<&Record> =
            store.scan()?.filter(|r| matches(r, q.filter.as_ref(), schema)).collect();
        if !q.sort.is_empty() {
            // sort_by is stable: ties keep scan order
            hits.sort_by(|a, b| compare_records(a, b, &q.sort, schema));
        }
        paginate(hits, &page).into_iter().map(|r| projection.apply(r, schema)).collect()
    };
    log_read(col, "find", q.filter.as_ref(), start, out.len());
    Ok(out)
}

/// First result of `q` with the limit forced to one.
///
/// # Errors
/// See [`find_records`].
pub fn find_one(col: &Collection, q: &Query) -> Result<Option<BsonDocument>, DbError> {
    let q = Query { page: Page { limit: Some(1), ..q.page }, ..q.clone() };
    Ok(find_records(col, &q)?.into_iter().next())
}

/// # Errors
/// Returns the store's error.
pub fn find_by_id(col: &Collection, id: RecordId) -> Result<Option<Record>, DbError> {
    let start = Instant::now();
    let found = col.read_store().get(id)?.cloned();
    log_read(col, "find_by_id", None, start, usize::from(found.is_some()));
    Ok(found)
}

/// # Errors
/// Returns the store's error.
pub fn exists(col: &Collection, id: RecordId) -> Result<bool, DbError> {
    Ok(find_by_id(col, id)?.is_some())
}

/// # Errors
/// Returns `MalformedQuery` for an invalid filter, or the store's error.
pub fn count_records(col: &Collection, filter: Option<&Filter>) -> Result<usize, DbError> {
    let start = Instant::now();
    let schema = col.schema();
    if let Some(f) = filter {
        validate_filter(f, schema, col.config())?;
    }
    let store = col.read_store();
    let n = match filter {
        None => store.len()?,
        Some(_) => store.scan()?.filter(|r| matches(r, filter, schema)).count(),
    };
    drop(store);
    log_read(col, "count", filter, start, n);
    Ok(n)
}

/// Removes every match. Ids are collected under the write lock before any removal, so
/// the filter sees one snapshot.
///
/// # Errors
/// Returns `MalformedQuery` for an invalid filter, or the store's error.
pub fn delete_many(col: &Collection, filter: Option<&Filter>) -> Result<DeleteReport, DbError> {
    let start = Instant::now();
    let schema = col.schema();
    if let Some(f) = filter {
        validate_filter(f, schema, col.config())?;
    }
    let mut deleted = 0u64;
    {
        let mut store = col.write_store();
        let ids: Vec<RecordId> =
            store.scan()?.filter(|r| matches(r, filter, schema)).map(|r| r.id).collect();
        for id in ids {
            if store.remove(id)?.is_some() {
                deleted += 1;
                telemetry::log_audit("delete", col.name(), &id.to_string());
            }
        }
    }
    telemetry::record_deleted(deleted);
    crate::dev6!(
        "{}",
        bench_line("delete", col.name(), &[("duration_ms", elapsed_ms(start)), ("deleted", deleted)])
    );
    Ok(DeleteReport { deleted })
}

/// Merges `patch` into every match; `modified` counts records whose values changed.
///
/// # Errors
/// Returns `MalformedQuery` for an invalid filter or patch, or the store's error.
pub fn update_many(
    col: &Collection,
    filter: Option<&Filter>,
    patch: &BsonDocument,
) -> Result<UpdateReport, DbError> {
    let start = Instant::now();
    let schema = col.schema();
    if let Some(f) = filter {
        validate_filter(f, schema, col.config())?;
    }
    validate_patch(patch, schema)?;
    let mut report = UpdateReport::default();
    {
        let mut store = col.write_store();
        let ids: Vec<RecordId> =
            store.scan()?.filter(|r| matches(r, filter, schema)).map(|r| r.id).collect();
        for id in ids {
            if let Some(changed) = store.update_fields(id, patch)? {
                report.matched += 1;
                if changed {
                    report.modified += 1;
                    telemetry::log_audit("update", col.name(), &id.to_string());
                }
            }
        }
    }
    telemetry::record_updated(report.modified);
    crate::dev6!(
        "{}",
        bench_line(
            "update",
            col.name(),
            &[
                ("duration_ms", elapsed_ms(start)),
                ("matched", report.matched),
                ("modified", report.modified)
            ]
        )
    );
    Ok(report)
}
