/// Programmatic CLI commands; the binary maps its clap subcommands onto these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Query JSON as accepted by `parse_query_json`; `None` returns every record.
    Find { query_json: Option<String> },
    FindOne { query_json: Option<String> },
    FindById { id: u64 },
    /// Bare where clause JSON; `None` counts everything.
    Count { where_json: Option<String> },
    Exists { id: u64 },
}
