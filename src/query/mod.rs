// Telemetry is a submodule of query
pub mod telemetry;

// Submodules for separation of concerns
mod compare;
mod eval;
mod exec;
mod page;
mod parse;
mod project;
mod types;
mod validate;

pub use compare::{Comparison, compare, satisfies, sort_cmp};
pub use eval::{compare_records, eval_filter, matches};
pub use exec::{
    count_records, delete_many, exists, find_by_id, find_one, find_records, update_many,
};
pub use page::paginate;
pub use parse::{
    bson_to_json, document_to_json, json_to_operand, parse_date, parse_order, parse_patch,
    parse_patch_json, parse_query, parse_query_json, parse_where, parse_where_json,
    record_from_json, record_to_json,
};
pub use types::{
    CmpOp, DeleteReport, Fields, Filter, Order, Page, Projection, Query, SortSpec, UpdateReport,
};
pub use validate::{effective_page, validate_filter, validate_patch, validate_query};
