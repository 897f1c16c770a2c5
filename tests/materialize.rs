use fixture_recon::{
    EngineError,
    data::Value,
    fixture::{Fixture, FixtureRecord},
    materialize::{MaterializeContext, MaterializeOptions, materialize},
    rows::RowSet,
    schema::{ColumnDescriptor, ColumnType},
    target::ColumnDefaults,
    variables::Variables,
};

fn people() -> RowSet {
    RowSet::new(vec![
        ColumnDescriptor::typed(1, "id", ColumnType::Integer),
        ColumnDescriptor::typed(2, "name", ColumnType::Text),
    ])
}

fn record(id: &str, name: &str) -> FixtureRecord {
    FixtureRecord::new().with("id", id).with("name", name)
}

fn run(fixture: &Fixture, options: MaterializeOptions) -> Result<RowSet, EngineError> {
    let defaults = ColumnDefaults::new();
    let variables = Variables::new();
    let context = MaterializeContext {
        defaults: &defaults,
        variables: &variables,
    };
    materialize(people(), fixture, options, &context)
}

#[test]
fn distinct_collapses_identical_records() {
    let fixture = Fixture::new(vec![record("1", "Alice"), record("1", "Alice")]);

    let distinct = run(&fixture, MaterializeOptions::default().distinct(true)).unwrap();
    assert_eq!(distinct.len(), 1);

    let all = run(&fixture, MaterializeOptions::default().distinct(false)).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn distinct_keeps_first_occurrence_in_fixture_order() {
    let fixture = Fixture::new(vec![
        record("1", "Alice"),
        record("1", "Alice"),
        record("2", "Bob"),
    ]);
    let rows = run(&fixture, MaterializeOptions::default().distinct(true)).unwrap();
    assert_eq!(
        rows.rows(),
        &[
            vec![Some(Value::Integer(1)), Some(Value::Text("Alice".into()))],
            vec![Some(Value::Integer(2)), Some(Value::Text("Bob".into()))],
        ]
    );
}

#[test]
fn empty_records_follow_include_empty_rows() {
    let fixture = Fixture::new(vec![record("", ""), record("3", "Carol")]);

    let without = run(&fixture, MaterializeOptions::default()).unwrap();
    assert_eq!(without.len(), 1);
    assert_eq!(without.record_strings(0).unwrap(), vec!["3", "Carol"]);

    let with = run(&fixture, MaterializeOptions::default().include_empty_rows(true)).unwrap();
    assert_eq!(with.len(), 2);
    assert_eq!(with.rows()[0], vec![None, None]);
}

#[test]
fn strict_mode_names_unknown_field_before_any_row() {
    let fixture = Fixture::new(vec![
        FixtureRecord::new().with("id", "not-a-number").with("nickname", "Al"),
    ]);
    let err = run(
        &fixture,
        MaterializeOptions::default().limit_to_defined_columns(true),
    )
    .unwrap_err();
    match err {
        EngineError::SchemaMismatch { field } => assert_eq!(field, "nickname"),
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn lenient_mode_ignores_unknown_fields() {
    let fixture = Fixture::new(vec![
        FixtureRecord::new().with("id", "4").with("nickname", "Al"),
    ]);
    let rows = run(&fixture, MaterializeOptions::default()).unwrap();
    assert_eq!(rows.rows()[0], vec![Some(Value::Integer(4)), None]);
}

#[test]
fn field_names_match_columns_case_insensitively() {
    let fixture = Fixture::new(vec![FixtureRecord::new().with("ID", "9").with("Name", "Zed")]);
    let rows = run(
        &fixture,
        MaterializeOptions::default().limit_to_defined_columns(true),
    )
    .unwrap();
    assert_eq!(rows.record_strings(0).unwrap(), vec!["9", "Zed"]);
}

#[test]
fn defaults_and_variables_fill_cells() {
    let defaults = ColumnDefaults::new().with("name", "$who");
    let mut variables = Variables::new();
    variables.set("who", "Default Person");
    let context = MaterializeContext {
        defaults: &defaults,
        variables: &variables,
    };
    let fixture = Fixture::new(vec![FixtureRecord::new().with("id", "1")]);
    let rows = materialize(people(), &fixture, MaterializeOptions::default(), &context).unwrap();
    assert_eq!(rows.record_strings(0).unwrap(), vec!["1", "Default Person"]);
}

#[test]
fn unresolved_variable_is_a_resolution_error() {
    let fixture = Fixture::new(vec![record("$missing", "x")]);
    let err = run(&fixture, MaterializeOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::ValueResolution { ref column, .. } if column == "id"));
}
