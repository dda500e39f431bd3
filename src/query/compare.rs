//! Type-aware value comparison shared by filtering and sorting.

use crate::schema::FieldType;
use bson::Bson;
use std::cmp::Ordering;

use super::types::CmpOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
    /// No ordering relation holds: a null side, a type mismatch, or NaN.
    Incomparable,
}

impl From<Ordering> for Comparison {
    fn from(o: Ordering) -> Self {
        match o {
            Ordering::Less => Self::Less,
            Ordering::Equal => Self::Equal,
            Ordering::Greater => Self::Greater,
        }
    }
}

impl Comparison {
    #[must_use]
    pub const fn ordering(self) -> Option<Ordering> {
        match self {
            Self::Less => Some(Ordering::Less),
            Self::Equal => Some(Ordering::Equal),
            Self::Greater => Some(Ordering::Greater),
            Self::Incomparable => None,
        }
    }
}

enum Num {
    Int(i64),
    Float(f64),
}

#[allow(clippy::cast_precision_loss)]
impl Num {
    fn of(v: &Bson) -> Option<Self> {
        match v {
            Bson::Int32(i) => Some(Self::Int(i64::from(*i))),
            Bson::Int64(i) => Some(Self::Int(*i)),
            Bson::Double(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Float(b)) => int_float_cmp(*a, *b),
            (Self::Float(a), Self::Int(b)) => int_float_cmp(*b, *a).map(Ordering::reverse),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
        }
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other).unwrap_or_else(|| self.as_f64().total_cmp(&other.as_f64()))
    }

    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
        }
    }
}

/// Exact `i <=> f` with no rounding of `i`: `f` is split at its integral part, which
/// fits an `i64` once out-of-range values are handled.
#[allow(clippy::cast_possible_truncation)]
fn int_float_cmp(i: i64, f: f64) -> Option<Ordering> {
    // 2^63, exactly representable
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= BOUND {
        return Some(Ordering::Less);
    }
    if f < -BOUND {
        return Some(Ordering::Greater);
    }
    let t = f.trunc();
    match i.cmp(&(t as i64)) {
        Ordering::Equal => t.partial_cmp(&f),
        o => Some(o),
    }
}

const fn present(v: Option<&Bson>) -> Option<&Bson> {
    match v {
        None | Some(Bson::Null) => None,
        Some(v) => Some(v),
    }
}

/// Compares a stored value against an operand under the field's declared type.
/// Either side null, or either side not of the declared type, is `Incomparable`.
#[must_use]
pub fn compare(stored: Option<&Bson>, operand: &Bson, ty: FieldType) -> Comparison {
    let (Some(a), Some(b)) = (present(stored), present(Some(operand))) else {
        return Comparison::Incomparable;
    };
    let ord = match ty {
        FieldType::Number => match (Num::of(a), Num::of(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => None,
        },
        FieldType::String => match (a, b) {
            (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
            _ => None,
        },
        FieldType::Date => match (a, b) {
            (Bson::DateTime(x), Bson::DateTime(y)) => {
                Some(x.timestamp_millis().cmp(&y.timestamp_millis()))
            }
            _ => None,
        },
        FieldType::Boolean => match (a, b) {
            (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
            _ => None,
        },
    };
    ord.map_or(Comparison::Incomparable, Comparison::from)
}

/// Whether `stored <op> operand` holds. Equality against null holds exactly when the
/// stored value is null or absent; relational operators never hold against null.
#[must_use]
pub fn satisfies(op: CmpOp, stored: Option<&Bson>, operand: &Bson, ty: FieldType) -> bool {
    if op == CmpOp::Eq && matches!(operand, Bson::Null) {
        return present(stored).is_none();
    }
    let c = compare(stored, operand, ty);
    match op {
        CmpOp::Eq => c == Comparison::Equal,
        CmpOp::Gt => c == Comparison::Greater,
        CmpOp::Gte => matches!(c, Comparison::Greater | Comparison::Equal),
        CmpOp::Lt => c == Comparison::Less,
        CmpOp::Lte => matches!(c, Comparison::Less | Comparison::Equal),
    }
}

/// Total order used by the sort engine. Absent/null values sort first; values of the
/// declared type order as in [`compare`]; anything else falls back to a type rank so
/// the order stays total.
#[must_use]
pub fn sort_cmp(a: Option<&Bson>, b: Option<&Bson>, ty: FieldType) -> Ordering {
    match (present(a), present(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            if let Some(o) = compare(Some(x), y, ty).ordering() {
                return o;
            }
            match (Num::of(x), Num::of(y)) {
                (Some(p), Some(q)) if ty == FieldType::Number => p.total_cmp(&q),
                _ => type_rank(x).cmp(&type_rank(y)),
            }
        }
    }
}

const fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null => 0,
        Bson::Boolean(_) => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 2,
        Bson::Decimal128(_) => 3,
        Bson::String(_) => 4,
        Bson::DateTime(_) => 5,
        Bson::Array(_) => 6,
        Bson::Document(_) => 7,
        _ => 8,
    }
}
