use crate::record::Record;
use crate::schema::Schema;
use std::cmp::Ordering;

use super::compare::{satisfies, sort_cmp};
use super::types::{Filter, Order, SortSpec};

/// Evaluates a where-clause against one record. A leaf on an undeclared field never
/// matches; callers validate queries before evaluation.
#[must_use]
pub fn eval_filter(record: &Record, filter: &Filter, schema: &Schema) -> bool {
    match filter {
        Filter::And(fs) => fs.iter().all(|f| eval_filter(record, f, schema)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(record, f, schema)),
        Filter::Cmp { path, op, value } => schema
            .field_type(path)
            .is_some_and(|ty| satisfies(*op, record.field(path).as_deref(), value, ty)),
    }
}

/// `None` matches every record.
#[must_use]
pub fn matches(record: &Record, filter: Option<&Filter>, schema: &Schema) -> bool {
    filter.is_none_or(|f| eval_filter(record, f, schema))
}

/// Lexicographic comparison over the sort keys, primary key first.
#[must_use]
pub fn compare_records(a: &Record, b: &Record, sort: &[SortSpec], schema: &Schema) -> Ordering {
    for s in sort {
        let Some(ty) = schema.field_type(&s.field) else {
            continue;
        };
        let ord = sort_cmp(a.field(&s.field).as_deref(), b.field(&s.field).as_deref(), ty);
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldType};
    use crate::types::RecordId;
    use bson::{Bson, doc};

    fn schema() -> Schema {
        Schema::new(vec![
            FieldDef::new("name", FieldType::String),
            FieldDef::new("role", FieldType::String),
            FieldDef::new("order", FieldType::Number),
        ])
        .unwrap()
    }

    fn rec(id: u64, data: bson::Document) -> Record {
        Record::new(RecordId(id), data)
    }

    #[test]
    fn and_or_combinators() {
        let s = schema();
        let r = rec(1, doc! {"name": "John Lennon", "role": "lead"});
        let john = Filter::eq("name", "John Lennon");
        let member = Filter::eq("role", "member");
        assert!(eval_filter(&r, &Filter::And(vec![john.clone(), Filter::eq("role", "lead")]), &s));
        assert!(!eval_filter(&r, &Filter::And(vec![john.clone(), member.clone()]), &s));
        assert!(eval_filter(&r, &Filter::Or(vec![member.clone(), john]), &s));
        assert!(!eval_filter(&r, &Filter::Or(vec![member, Filter::eq("name", "XYZ")]), &s));
        assert!(eval_filter(&r, &Filter::And(vec![]), &s));
    }

    #[test]
    fn id_is_a_first_class_leaf() {
        let s = schema();
        let r = rec(4, doc! {"name": "Pete Best"});
        assert!(eval_filter(&r, &Filter::eq("id", 4_i64), &s));
        assert!(eval_filter(&r, &Filter::eq("id", 4_i32), &s));
        assert!(!eval_filter(&r, &Filter::eq("id", 5_i64), &s));
        assert!(eval_filter(&r, &Filter::gt("id", 3_i64), &s));
    }

    #[test]
    fn missing_field_behaves_as_null() {
        let s = schema();
        let r = rec(1, doc! {"name": "Pete Best"});
        assert!(!eval_filter(&r, &Filter::gt("order", Bson::Null), &s));
        assert!(!eval_filter(&r, &Filter::lt("order", 100), &s));
        assert!(eval_filter(&r, &Filter::eq("order", Bson::Null), &s));
    }

    #[test]
    fn undeclared_field_never_matches() {
        let s = schema();
        let r = rec(1, doc! {"extra": 1});
        assert!(!eval_filter(&r, &Filter::eq("extra", 1), &s));
    }

    #[test]
    fn compare_records_breaks_ties_with_later_keys() {
        let s = schema();
        let a = rec(1, doc! {"role": "lead", "order": 2});
        let b = rec(2, doc! {"role": "lead", "order": 1});
        let c = rec(3, doc! {"order": 3});
        let keys = vec![SortSpec::asc("role"), SortSpec::desc("order")];
        assert_eq!(compare_records(&a, &b, &keys, &s), Ordering::Less);
        // missing role sorts first ascending
        assert_eq!(compare_records(&c, &a, &keys, &s), Ordering::Less);
        assert_eq!(compare_records(&a, &a, &keys, &s), Ordering::Equal);
    }
}
