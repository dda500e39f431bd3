use bson::{Bson, Document as BsonDocument, doc};
use proptest::prelude::*;
use recordlite::query::{CmpOp, Projection, compare_records, eval_filter};
use recordlite::{
    Collection, FieldDef, FieldType, Fields, Filter, Query, Record, RecordId, Schema, SortSpec,
};

fn schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("a", FieldType::Number),
        FieldDef::new("b", FieldType::String),
        FieldDef::new("flag", FieldType::Boolean),
        FieldDef::new("tag", FieldType::String),
    ])
    .unwrap()
}

fn data_strategy() -> impl Strategy<Value = BsonDocument> {
    (
        proptest::option::of(0i32..5),
        proptest::option::of(prop_oneof![Just("x"), Just("y"), Just("z")]),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(a, b, flag)| {
            let mut d = BsonDocument::new();
            if let Some(a) = a {
                d.insert("a", a);
            }
            if let Some(b) = b {
                d.insert("b", b);
            }
            if let Some(f) = flag {
                d.insert("flag", f);
            }
            d
        })
}

fn op_strategy() -> impl Strategy<Value = CmpOp> {
    prop_oneof![Just(CmpOp::Eq), Just(CmpOp::Gt), Just(CmpOp::Gte), Just(CmpOp::Lt), Just(CmpOp::Lte)]
}

fn leaf_strategy() -> impl Strategy<Value = Filter> {
    let operand = prop_oneof![
        (0i32..5).prop_map(Bson::Int32),
        prop_oneof![Just("x"), Just("y"), Just("z")].prop_map(|s| Bson::String(s.into())),
        any::<bool>().prop_map(Bson::Boolean),
        Just(Bson::Null),
    ];
    (prop_oneof![Just("a"), Just("b"), Just("flag"), Just("id")], op_strategy(), operand)
        .prop_map(|(path, op, value)| Filter::Cmp { path: path.into(), op, value })
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    leaf_strategy().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..3).prop_map(Filter::And),
            proptest::collection::vec(inner, 1..3).prop_map(Filter::Or),
        ]
    })
}

fn records(data: &[BsonDocument]) -> Vec<Record> {
    data.iter().enumerate().map(|(i, d)| Record::new(RecordId(i as u64 + 1), d.clone())).collect()
}

fn collection(data: &[BsonDocument]) -> Collection {
    let col = Collection::new("prop", schema());
    for d in data {
        col.create(d.clone()).unwrap();
    }
    col
}

fn ids(docs: &[BsonDocument]) -> Vec<i64> {
    docs.iter().map(|d| d.get_i64("id").unwrap()).collect()
}

proptest! {
    #[test]
    fn prop_and_or_follow_their_children(
        data in data_strategy(),
        w1 in filter_strategy(),
        w2 in filter_strategy(),
    ) {
        let s = schema();
        let r = Record::new(RecordId(1), data);
        let m1 = eval_filter(&r, &w1, &s);
        let m2 = eval_filter(&r, &w2, &s);
        prop_assert_eq!(eval_filter(&r, &Filter::And(vec![w1.clone(), w2.clone()]), &s), m1 && m2);
        prop_assert_eq!(eval_filter(&r, &Filter::Or(vec![w1, w2]), &s), m1 || m2);
    }

    #[test]
    fn prop_absent_never_satisfies_gt(x in prop_oneof![
        (0i32..5).prop_map(Bson::Int32),
        Just(Bson::Null),
        Just(Bson::String("x".into())),
    ]) {
        let s = schema();
        let r = Record::new(RecordId(1), doc! {"b": "y"});
        prop_assert!(!eval_filter(&r, &Filter::gt("a", x.clone()), &s));
        prop_assert!(!eval_filter(&r, &Filter::gte("a", x), &s));
    }

    #[test]
    fn prop_sort_is_idempotent_and_stable(data in proptest::collection::vec(data_strategy(), 0..30)) {
        let s = schema();
        let keys = vec![SortSpec::asc("b"), SortSpec::desc("a")];
        let mut once = records(&data);
        once.sort_by(|x, y| compare_records(x, y, &keys, &s));
        let mut twice = once.clone();
        twice.sort_by(|x, y| compare_records(x, y, &keys, &s));
        prop_assert_eq!(&once, &twice);
        for w in once.windows(2) {
            if compare_records(&w[0], &w[1], &keys, &s) == std::cmp::Ordering::Equal {
                prop_assert!(w[0].id < w[1].id);
            }
        }
    }

    #[test]
    fn prop_count_equals_find_len(
        data in proptest::collection::vec(data_strategy(), 0..30),
        w in filter_strategy(),
    ) {
        let col = collection(&data);
        let found = col.find(&Query::new().filter(w.clone())).unwrap();
        prop_assert_eq!(col.count(Some(&w)).unwrap(), found.len());
    }

    #[test]
    fn prop_projection_is_a_fixed_point(
        data in data_strategy(),
        names in proptest::collection::vec(prop_oneof![Just("id"), Just("a"), Just("b"), Just("flag")], 0..4),
        include in any::<bool>(),
    ) {
        let s = schema();
        let r = Record::new(RecordId(3), data);
        let fields = Fields::Map(names.iter().map(|n| ((*n).to_owned(), include)).collect());
        let p: Projection = fields.normalize();
        let once = p.apply(&r, &s);
        prop_assert_eq!(p.apply_document(&once, &s), once);
    }

    #[test]
    fn prop_destroy_all_leaves_no_matches(
        data in proptest::collection::vec(data_strategy(), 0..30),
        w in filter_strategy(),
    ) {
        let col = collection(&data);
        let before = col.count(None).unwrap();
        let matched = col.count(Some(&w)).unwrap();
        let rep = col.destroy_all(Some(&w)).unwrap();
        prop_assert_eq!(rep.deleted as usize, matched);
        prop_assert!(col.find(&Query::new().filter(w)).unwrap().is_empty());
        prop_assert_eq!(col.count(None).unwrap(), before - matched);
    }

    #[test]
    fn prop_update_marks_exactly_the_matches(
        data in proptest::collection::vec(data_strategy(), 0..30),
        w in filter_strategy(),
    ) {
        let col = collection(&data);
        let matched = ids(&col.find(&Query::new().filter(w.clone())).unwrap());
        let rep = col.update(Some(&w), &doc! {"tag": "patched"}).unwrap();
        prop_assert_eq!(rep.matched as usize, matched.len());
        let tagged = ids(&col.find(&Query::new().filter(Filter::eq("tag", "patched"))).unwrap());
        prop_assert_eq!(tagged, matched);
    }
}
