use recordlite::cli::{Command, OutputMode, load_ndjson, run, run_with_format};
use recordlite::{Collection, DbError, Schema};
use std::io::Write;

const SCHEMA: &str = r#"
[[fields]]
name = "name"
type = "string"
sort = true

[[fields]]
name = "order"
type = "number"

[[fields]]
name = "birthday"
type = "date"
"#;

const DATA: &str = r#"{"name": "John Lennon", "order": 2, "birthday": "1980-12-08"}
{"name": "Paul McCartney", "order": 1, "birthday": "1942-06-18"}

{"id": 99, "name": "Pete Best", "order": 4}
"#;

fn loaded() -> Collection {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("users.toml");
    std::fs::write(&schema_path, SCHEMA).unwrap();
    let data_path = dir.path().join("users.ndjson");
    let mut f = std::fs::File::create(&data_path).unwrap();
    f.write_all(DATA.as_bytes()).unwrap();
    drop(f);

    let schema = Schema::from_toml_str(&std::fs::read_to_string(&schema_path).unwrap()).unwrap();
    let col = Collection::new("users", schema);
    let reader = std::io::BufReader::new(std::fs::File::open(&data_path).unwrap());
    assert_eq!(load_ndjson(&col, reader).unwrap(), 3);
    col
}

fn output(col: &Collection, cmd: Command) -> Vec<serde_json::Value> {
    let mut buf = Vec::new();
    run(col, cmd, &mut buf).unwrap();
    String::from_utf8(buf)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn find_prints_ndjson_in_query_order() {
    let col = loaded();
    let out = output(
        &col,
        Command::Find { query_json: Some(r#"{"order": "order DESC", "fields": ["name"]}"#.into()) },
    );
    let names: Vec<&str> = out.iter().map(|v| v["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Pete Best", "John Lennon", "Paul McCartney"]);
    assert!(out.iter().all(|v| v.get("id").is_none()));
}

#[test]
fn loaded_ids_are_store_assigned_and_dates_render_as_text() {
    let col = loaded();
    let out = output(&col, Command::FindById { id: 1 });
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["id"], 1);
    assert_eq!(out[0]["birthday"], "1980-12-08T00:00:00.000Z");
    assert!(output(&col, Command::FindById { id: 99 }).is_empty());
}

#[test]
fn find_one_count_and_exists() {
    let col = loaded();
    let first = output(&col, Command::FindOne { query_json: Some(r#"{"order": "order"}"#.into()) });
    assert_eq!(first[0]["name"], "Paul McCartney");
    let n = output(&col, Command::Count { where_json: Some(r#"{"order": {"gte": 2}}"#.into()) });
    assert_eq!(n[0]["count"], 2);
    let all = output(&col, Command::Count { where_json: None });
    assert_eq!(all[0]["count"], 3);
    assert_eq!(output(&col, Command::Exists { id: 3 })[0]["exists"], true);
}

#[test]
fn plain_mode_prints_bare_scalars() {
    let col = loaded();
    let mut buf = Vec::new();
    run_with_format(&col, Command::Exists { id: 7 }, OutputMode::Plain, &mut buf).unwrap();
    run_with_format(&col, Command::Count { where_json: None }, OutputMode::Plain, &mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "false\n3\n");
}

#[test]
fn bad_inputs_surface_as_errors() {
    let col = loaded();
    let mut sink = Vec::new();
    let err = run(&col, Command::Find { query_json: Some(r#"{"where": {"nope": 1}}"#.into()) }, &mut sink);
    assert!(matches!(err, Err(DbError::MalformedQuery(_))));
    let err = load_ndjson(&col, std::io::Cursor::new("{\"name\": \"x\"}\nnot json\n"));
    assert!(matches!(err, Err(DbError::InvalidRecord(ref m)) if m.starts_with("line 2")));
}
