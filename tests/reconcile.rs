use fixture_recon::{
    data::Value,
    hash::{ReconciliationIndex, reconcile},
    rows::RowSet,
    schema::{ColumnDescriptor, ColumnType},
};

fn orders(rows: Vec<(i32, &str, &str)>) -> RowSet {
    RowSet::with_rows(
        vec![
            ColumnDescriptor::typed(1, "order_id", ColumnType::Integer),
            ColumnDescriptor::typed(2, "customer", ColumnType::Text),
            ColumnDescriptor::typed(3, "loaded_at", ColumnType::Timestamp),
        ],
        rows.into_iter()
            .map(|(id, customer, loaded)| {
                let loaded = fixture_recon::data::parse_timestamp(loaded).ok().map(Value::Timestamp);
                vec![
                    Some(Value::Integer(id)),
                    Some(Value::Text(customer.to_string())),
                    loaded,
                ]
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn rows_equal_on_key_columns_share_a_hash_in_scan_order() {
    let rows = orders(vec![
        (1, "acme", "2024-01-01 10:00:00"),
        (2, "globex", "2024-01-01 10:00:00"),
        (1, "acme", "2024-06-30 23:59:59"),
    ]);
    let index = ReconciliationIndex::build(&rows, &["ORDER_ID", "customer"]).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.row_count(), 3);

    let duplicates: Vec<_> = index.duplicates().collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].1, &[1, 3]);
}

#[test]
fn volatile_columns_do_not_affect_matching() {
    let expected = orders(vec![(1, "acme", ""), (2, "globex", "")]);
    let actual = orders(vec![
        (2, "globex", "2024-03-03 03:03:03"),
        (1, "acme", "2024-04-04 04:04:04"),
    ]);
    let keys = ["order_id", "customer"];
    let report = reconcile(
        &ReconciliationIndex::build(&expected, &keys).unwrap(),
        &ReconciliationIndex::build(&actual, &keys).unwrap(),
    );
    assert!(report.is_match());
    assert_eq!(report.matched.len(), 2);
    assert!(!report.has_duplicates());
}

#[test]
fn including_volatile_column_breaks_the_match() {
    let expected = orders(vec![(1, "acme", "2024-01-01 00:00:00")]);
    let actual = orders(vec![(1, "acme", "2024-01-01 00:00:01")]);
    let keys = ["order_id", "customer", "loaded_at"];
    let report = reconcile(
        &ReconciliationIndex::build(&expected, &keys).unwrap(),
        &ReconciliationIndex::build(&actual, &keys).unwrap(),
    );
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.unexpected.len(), 1);
    assert_eq!(report.missing[0].rows, vec![1]);
}

#[test]
fn null_and_empty_text_hash_identically() {
    let columns = vec![ColumnDescriptor::typed(1, "note", ColumnType::Text)];
    let rows = RowSet::with_rows(
        columns,
        vec![vec![None], vec![Some(Value::Text(String::new()))]],
    )
    .unwrap();
    let index = ReconciliationIndex::build(&rows, &["note"]).unwrap();
    assert_eq!(index.len(), 1);
    let (_, numbers) = index.iter().next().unwrap();
    assert_eq!(numbers, &[1, 2]);
}

#[test]
fn unknown_key_fields_hash_every_row_alike() {
    let rows = orders(vec![(1, "a", ""), (2, "b", "")]);
    let index = ReconciliationIndex::build(&rows, &["nope"]).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.duplicates().count(), 1);
}
