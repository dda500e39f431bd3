pub mod cli;
pub mod collection;
pub mod config;
pub mod database;
pub mod errors;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;
pub mod types;
pub mod utils;

pub use collection::Collection;
pub use config::QueryConfig;
pub use database::Database;
pub use errors::DbError;
pub use query::{Fields, Filter, Order, Query, SortSpec};
pub use record::Record;
pub use schema::{FieldDef, FieldType, Schema};
pub use store::{MemoryStore, RecordStore};
pub use types::RecordId;

/// Initializes logging from `RECORDLITE_LOG_*` environment variables.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be created, or a logger
/// is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    utils::logger::configure_from_env()
}
