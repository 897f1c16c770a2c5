use chrono::{NaiveDate, NaiveTime};
use fixture_recon::{
    EngineError,
    data::{Value, decode, encode},
    schema::{ColumnDescriptor, ColumnType},
    variables::Variables,
};
use proptest::prelude::*;

fn column(ty: ColumnType) -> ColumnDescriptor {
    ColumnDescriptor::typed(1, "field", ty)
}

fn round_trip(raw: &str, ty: ColumnType) -> String {
    let col = column(ty);
    let cell = encode(raw, &col, &Variables::new()).expect("encode");
    decode(&cell, &col).expect("decode")
}

#[test]
fn canonical_strings_round_trip_for_every_type() {
    let cases = [
        ("12.5", ColumnType::Decimal),
        ("-3", ColumnType::Decimal),
        ("hello world", ColumnType::Text),
        ("ABC", ColumnType::FixedText),
        ("-9223372036854775808", ColumnType::BigInteger),
        ("2147483647", ColumnType::Integer),
        ("2024-02-29", ColumnType::Date),
        ("23:59:58", ColumnType::Time),
        ("2024-01-01 08:30:00", ColumnType::Timestamp),
        ("true", ColumnType::Boolean),
        ("false", ColumnType::Boolean),
    ];
    for (raw, ty) in cases {
        assert_eq!(round_trip(raw, ty), raw, "round trip of {raw:?} as {ty}");
        assert_eq!(round_trip("", ty), "", "empty round trip as {ty}");
    }
}

#[test]
fn date_only_timestamp_decodes_at_midnight() {
    assert_eq!(round_trip("2024-01-01", ColumnType::Timestamp), "2024-01-01 00:00:00");
}

#[test]
fn encode_produces_native_values() {
    let vars = Variables::new();
    assert_eq!(
        encode("2024-05-06", &column(ColumnType::Date), &vars).unwrap(),
        Some(Value::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()))
    );
    assert_eq!(
        encode("07:08:09", &column(ColumnType::Time), &vars).unwrap(),
        Some(Value::Time(NaiveTime::from_hms_opt(7, 8, 9).unwrap()))
    );
    assert_eq!(
        encode("1.25", &column(ColumnType::Decimal), &vars).unwrap(),
        Some(Value::Decimal(1.25))
    );
}

#[test]
fn malformed_dates_are_conversion_errors() {
    let vars = Variables::new();
    for (raw, ty) in [
        ("2024-13-01", ColumnType::Date),
        ("06/05/2024", ColumnType::Date),
        ("not a time", ColumnType::Time),
        ("yesterday", ColumnType::Timestamp),
        ("1,5", ColumnType::Decimal),
    ] {
        let err = encode(raw, &column(ty), &vars).unwrap_err();
        assert!(
            matches!(err, EngineError::ValueConversion { .. }),
            "{raw:?} as {ty} gave {err:?}"
        );
    }
}

proptest! {
    #[test]
    fn integers_round_trip(value in any::<i32>()) {
        let raw = value.to_string();
        prop_assert_eq!(round_trip(&raw, ColumnType::Integer), raw);
    }

    #[test]
    fn big_integers_round_trip(value in any::<i64>()) {
        let raw = value.to_string();
        prop_assert_eq!(round_trip(&raw, ColumnType::BigInteger), raw);
    }

    #[test]
    fn finite_decimals_round_trip(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let raw = value.to_string();
        prop_assert_eq!(round_trip(&raw, ColumnType::Decimal), raw);
    }

    #[test]
    fn text_round_trips_unchanged(raw in "[^$\\x00][^\\x00]{0,30}") {
        prop_assert_eq!(round_trip(&raw, ColumnType::Text), raw);
    }

    #[test]
    fn dates_round_trip(days in 0i64..200_000) {
        let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Duration::days(days);
        let raw = date.format("%Y-%m-%d").to_string();
        prop_assert_eq!(round_trip(&raw, ColumnType::Date), raw);
    }

    #[test]
    fn timestamps_round_trip(secs in 0i64..4_000_000_000) {
        let ts = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
            + chrono::Duration::seconds(secs);
        let raw = ts.format("%Y-%m-%d %H:%M:%S").to_string();
        prop_assert_eq!(round_trip(&raw, ColumnType::Timestamp), raw);
    }
}
