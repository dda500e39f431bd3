use bson::Bson;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// Where-clause tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Cmp { path: String, op: CmpOp, value: Bson },
    /// Empty list matches everything.
    And(Vec<Filter>),
    /// Must be non-empty; validation rejects `Or(vec![])`.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn cmp(path: impl Into<String>, op: CmpOp, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op, value: value.into() }
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Eq, value)
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Gt, value)
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Gte, value)
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Lt, value)
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Lte, value)
    }

    /// Nesting depth; a leaf is 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Cmp { .. } => 1,
            Self::And(fs) | Self::Or(fs) => 1 + fs.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}

/// Skip/offset and limit. `skip` and `offset` are synonyms; `skip` wins when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub skip: Option<usize>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Page {
    #[must_use]
    pub fn start(&self) -> usize {
        self.skip.or(self.offset).unwrap_or(0)
    }
}

/// Projection as written by the caller, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    Name(String),
    List(Vec<String>),
    Map(Vec<(String, bool)>),
}

impl Fields {
    /// All field names mentioned, in order.
    pub fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Name(n) => Box::new(std::iter::once(n.as_str())),
            Self::List(v) => Box::new(v.iter().map(String::as_str)),
            Self::Map(m) => Box::new(m.iter().map(|(k, _)| k.as_str())),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Name(_) => 1,
            Self::List(v) => v.len(),
            Self::Map(m) => m.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolved projection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

/// A complete query description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub sort: Vec<SortSpec>,
    pub page: Page,
    pub fields: Option<Fields>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn order(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
        self
    }

    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.page.limit = Some(n);
        self
    }

    #[must_use]
    pub const fn skip(mut self, n: usize) -> Self {
        self.page.skip = Some(n);
        self
    }

    #[must_use]
    pub const fn offset(mut self, n: usize) -> Self {
        self.page.offset = Some(n);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields);
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: u64,
}
