use crate::collection::Collection;
use crate::errors::DbError;
use crate::query::{self, Query};
use crate::types::RecordId;
use std::io::{BufRead, Write};

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// NDJSON records, `{"count":n}` / `{"exists":b}` for scalars.
    Json,
    /// Bare scalars; records still print as JSON lines.
    Plain,
}

/// Loads NDJSON records into `col`, skipping blank lines. Returns how many were stored.
///
/// # Errors
/// Returns an error naming the line number for unreadable or invalid records.
pub fn load_ndjson(col: &Collection, reader: impl BufRead) -> Result<usize, DbError> {
    let mut n = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let v: serde_json::Value = serde_json::from_str(&line)
            .map_err(|e| DbError::InvalidRecord(format!("line {}: {e}", i + 1)))?;
        let data = query::record_from_json(&v, col.schema())?;
        col.create(data)?;
        n += 1;
    }
    log::info!("loaded {n} records into {}", col.name());
    Ok(n)
}

/// # Errors
/// Returns parse, query or output errors.
pub fn run(col: &Collection, cmd: Command, out: &mut dyn Write) -> Result<(), DbError> {
    run_with_format(col, cmd, OutputMode::Json, out)
}

/// # Errors
/// Returns parse, query or output errors.
pub fn run_with_format(
    col: &Collection,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), DbError> {
    match cmd {
        Command::Find { query_json } => {
            for d in col.find(&parse_query_arg(col, query_json.as_deref())?)? {
                writeln!(out, "{}", query::document_to_json(&d))?;
            }
        }
        Command::FindOne { query_json } => {
            if let Some(d) = col.find_one(&parse_query_arg(col, query_json.as_deref())?)? {
                writeln!(out, "{}", query::document_to_json(&d))?;
            }
        }
        Command::FindById { id } => {
            if let Some(r) = col.find_by_id(RecordId(id))? {
                writeln!(out, "{}", query::record_to_json(&r))?;
            }
        }
        Command::Count { where_json } => {
            let filter = where_json
                .as_deref()
                .map(|w| query::parse_where_json(w, col.schema()))
                .transpose()?;
            let n = col.count(filter.as_ref())?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({ "count": n }))?,
                OutputMode::Plain => writeln!(out, "{n}")?,
            }
        }
        Command::Exists { id } => {
            let b = col.exists(RecordId(id))?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({ "exists": b }))?,
                OutputMode::Plain => writeln!(out, "{b}")?,
            }
        }
    }
    Ok(())
}

fn parse_query_arg(col: &Collection, json: Option<&str>) -> Result<Query, DbError> {
    json.map_or_else(|| Ok(Query::new()), |j| query::parse_query_json(j, col.schema()))
}
