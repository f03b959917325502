//! Tests for the sparse row codec
//!
//! These tests verify:
//! - Rows with any subset of columns round-trip (empty and full included)
//! - `size_in_bytes` equals the bytes the encoder consumes
//! - Signed and unsigned integers share bits but decode per column flag
//! - Rows are checked against the column list before they are stored
//! - Corrupt masks and strings are reported, not trusted

use deltadb::bitstream::{BitReader, BitWriter};
use deltadb::row::{decode_row, encode_row, MAX_STRING_LEN};
use deltadb::schema::{Column, ColumnKind, MAX_COLUMNS};
use deltadb::{DeltaError, Row, Value};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn column(name: &str, kind: ColumnKind) -> Column {
    Column::new(name, kind).unwrap()
}

/// One column of every kind, plus unsigned variants of the integers
fn all_kinds() -> Vec<Column> {
    vec![
        column("i8", ColumnKind::Int8),
        column("i16", ColumnKind::Int16),
        column("i32", ColumnKind::Int32),
        column("i64", ColumnKind::Int64),
        column("u8", ColumnKind::Int8).unsigned(),
        column("u16", ColumnKind::Int16).unsigned(),
        column("u32", ColumnKind::Int32).unsigned(),
        column("u64", ColumnKind::Int64).unsigned(),
        column("flag", ColumnKind::Bool),
        column("f32", ColumnKind::Float32),
        column("f64", ColumnKind::Float64),
        column("text", ColumnKind::String),
        column("blob", ColumnKind::Bytes),
    ]
}

/// Encode `row` into an exactly-sized buffer and decode it back
fn round_trip(columns: &[Column], row: &Row) -> (Row, usize) {
    let mut writer = BitWriter::with_capacity(row.size_in_bytes());
    encode_row(&mut writer, row).unwrap();
    let bits = writer.position();

    let bytes = writer.into_bytes();
    let mut reader = BitReader::over(&bytes);
    let decoded = decode_row(columns, &mut reader).unwrap();
    assert_eq!(reader.position(), bits);
    (decoded, bits)
}

fn arb_value(column: &Column) -> BoxedStrategy<Value> {
    match (column.kind(), column.is_unsigned()) {
        (ColumnKind::Int8, false) => any::<i8>().prop_map(Value::Int8).boxed(),
        (ColumnKind::Int16, false) => any::<i16>().prop_map(Value::Int16).boxed(),
        (ColumnKind::Int32, false) => any::<i32>().prop_map(Value::Int32).boxed(),
        (ColumnKind::Int64, false) => any::<i64>().prop_map(Value::Int64).boxed(),
        (ColumnKind::Int8, true) => any::<u8>().prop_map(Value::UInt8).boxed(),
        (ColumnKind::Int16, true) => any::<u16>().prop_map(Value::UInt16).boxed(),
        (ColumnKind::Int32, true) => any::<u32>().prop_map(Value::UInt32).boxed(),
        (ColumnKind::Int64, true) => any::<u64>().prop_map(Value::UInt64).boxed(),
        (ColumnKind::Bool, _) => any::<bool>().prop_map(Value::Bool).boxed(),
        (ColumnKind::Float32, _) => any::<f32>()
            .prop_filter("NaN never compares equal", |f| !f.is_nan())
            .prop_map(Value::Float32)
            .boxed(),
        (ColumnKind::Float64, _) => any::<f64>()
            .prop_filter("NaN never compares equal", |f| !f.is_nan())
            .prop_map(Value::Float64)
            .boxed(),
        (ColumnKind::String, _) => "[^\\x00]{0,64}"
            .prop_filter("fits the string field", |s| s.len() <= MAX_STRING_LEN)
            .prop_map(Value::String)
            .boxed(),
        (ColumnKind::Bytes, _) => prop::collection::vec(any::<u8>(), 0..300)
            .prop_map(Value::Bytes)
            .boxed(),
    }
}

/// A row over `columns` with each column independently present or absent
fn arb_row(columns: Vec<Column>) -> impl Strategy<Value = Row> {
    let cells: Vec<_> = columns
        .iter()
        .map(|c| prop::option::of(arb_value(c)))
        .collect();

    cells.prop_map(|cells| {
        let mut row = Row::new();
        for (index, cell) in cells.into_iter().enumerate() {
            if let Some(value) = cell {
                row.set(index, value).unwrap();
            }
        }
        row
    })
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_empty_row_is_just_the_mask() {
    let columns = all_kinds();
    let row = Row::new();

    let (decoded, bits) = round_trip(&columns, &row);
    assert_eq!(bits, 64);
    assert_eq!(decoded, row);
    assert!(decoded.cells(columns.len()).all(|c| c.is_none()));
}

#[test]
fn test_full_row_every_kind() {
    let columns = all_kinds();
    let row = Row::new()
        .with(0, -8i8)
        .unwrap()
        .with(1, -1600i16)
        .unwrap()
        .with(2, i32::MIN)
        .unwrap()
        .with(3, i64::MIN + 1)
        .unwrap()
        .with(4, 200u8)
        .unwrap()
        .with(5, 60000u16)
        .unwrap()
        .with(6, u32::MAX)
        .unwrap()
        .with(7, u64::MAX - 1)
        .unwrap()
        .with(8, true)
        .unwrap()
        .with(9, 1.5f32)
        .unwrap()
        .with(10, -2.25f64)
        .unwrap()
        .with(11, "héllo")
        .unwrap()
        .with(12, vec![0u8, 1, 2, 255])
        .unwrap();

    let (decoded, bits) = round_trip(&columns, &row);
    assert_eq!(decoded, row);
    assert_eq!(bits, row.size_in_bytes() * 8);
}

#[test]
fn test_id_label_scenario() {
    let columns = vec![
        column("id", ColumnKind::Int32),
        column("label", ColumnKind::String),
    ];
    let first = Row::new().with(0, -7i32).unwrap();
    let second = Row::new().with(0, 42i32).unwrap().with(1, "ok").unwrap();

    let size = first.size_in_bytes() + second.size_in_bytes();
    assert_eq!(size, (8 + 4) + (8 + 4 + 3));

    let mut writer = BitWriter::with_capacity(size);
    encode_row(&mut writer, &first).unwrap();
    encode_row(&mut writer, &second).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = BitReader::over(&bytes);
    let a = decode_row(&columns, &mut reader).unwrap();
    let b = decode_row(&columns, &mut reader).unwrap();
    assert!(reader.is_exhausted());

    assert_eq!(a.get(0), Some(&Value::Int32(-7)));
    assert_eq!(a.get(1), None);
    assert_eq!(b.get(0), Some(&Value::Int32(42)));
    assert_eq!(b.get(1), Some(&Value::String("ok".to_string())));
}

#[test]
fn test_signedness_follows_column() {
    let signed = vec![column("n", ColumnKind::Int16)];
    let unsigned = vec![column("n", ColumnKind::Int16).unsigned()];

    let row = Row::new().with(0, -1i16).unwrap();
    let mut writer = BitWriter::with_capacity(row.size_in_bytes());
    encode_row(&mut writer, &row).unwrap();
    let bytes = writer.into_bytes();

    let as_signed = decode_row(&signed, &mut BitReader::over(&bytes)).unwrap();
    let as_unsigned = decode_row(&unsigned, &mut BitReader::over(&bytes)).unwrap();
    assert_eq!(as_signed.get(0), Some(&Value::Int16(-1)));
    assert_eq!(as_unsigned.get(0), Some(&Value::UInt16(u16::MAX)));
}

#[test]
fn test_bool_occupies_a_byte() {
    let row = Row::new().with(0, true).unwrap();
    assert_eq!(row.size_in_bytes(), 8 + 1);
}

#[test]
fn test_max_length_values() {
    let columns = vec![
        column("text", ColumnKind::String),
        column("blob", ColumnKind::Bytes),
    ];
    let row = Row::new()
        .with(0, "s".repeat(MAX_STRING_LEN))
        .unwrap()
        .with(1, vec![7u8; u16::MAX as usize])
        .unwrap();

    let (decoded, _) = round_trip(&columns, &row);
    assert_eq!(decoded, row);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_value_limits() {
    let mut row = Row::new();
    assert!(matches!(
        row.set(0, "s".repeat(MAX_STRING_LEN + 1)),
        Err(DeltaError::InvalidValue(_))
    ));
    assert!(matches!(row.set(0, "a\0b"), Err(DeltaError::InvalidValue(_))));
    assert!(matches!(
        row.set(0, vec![0u8; u16::MAX as usize + 1]),
        Err(DeltaError::InvalidValue(_))
    ));
    assert!(matches!(
        row.set(MAX_COLUMNS, 1i8),
        Err(DeltaError::SchemaMismatch(_))
    ));
    assert!(row.is_empty());
}

#[test]
fn test_check_columns() {
    let columns = vec![
        column("id", ColumnKind::Int32).unsigned(),
        column("label", ColumnKind::String),
    ];

    let good = Row::new().with(0, 1u32).unwrap().with(1, "x").unwrap();
    assert!(good.check_columns(&columns).is_ok());

    let wrong_kind = Row::new().with(1, 5i32).unwrap();
    assert!(matches!(
        wrong_kind.check_columns(&columns),
        Err(DeltaError::SchemaMismatch(_))
    ));

    let wrong_sign = Row::new().with(0, 1i32).unwrap();
    assert!(matches!(
        wrong_sign.check_columns(&columns),
        Err(DeltaError::SchemaMismatch(_))
    ));

    let out_of_range = Row::new().with(2, true).unwrap();
    assert!(matches!(
        out_of_range.check_columns(&columns),
        Err(DeltaError::SchemaMismatch(_))
    ));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_mask_beyond_schema_is_corruption() {
    let columns = vec![column("only", ColumnKind::Int8)];
    let row = Row::new().with(0, 1i8).unwrap().with(3, 1i8).unwrap();

    let mut writer = BitWriter::with_capacity(row.size_in_bytes());
    encode_row(&mut writer, &row).unwrap();
    let bytes = writer.into_bytes();

    let result = decode_row(&columns, &mut BitReader::over(&bytes));
    assert!(matches!(result, Err(DeltaError::Corruption(_))));
}

#[test]
fn test_unterminated_string_is_corruption() {
    let columns = vec![column("text", ColumnKind::String)];

    let mut writer = BitWriter::with_capacity(8 + 300);
    writer.write_u64(1).unwrap();
    writer.write_bytes(&[b'z'; 300]).unwrap();
    let bytes = writer.into_bytes();

    let result = decode_row(&columns, &mut BitReader::over(&bytes));
    assert!(matches!(result, Err(DeltaError::Corruption(_))));
}

#[test]
fn test_truncated_row() {
    let columns = vec![column("n", ColumnKind::Int64)];
    let row = Row::new().with(0, 9i64).unwrap();

    let mut writer = BitWriter::with_capacity(row.size_in_bytes());
    encode_row(&mut writer, &row).unwrap();
    let bytes = writer.into_bytes();

    let result = decode_row(&columns, &mut BitReader::over(&bytes[..12]));
    assert!(matches!(result, Err(DeltaError::BufferBounds(_))));
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_row_round_trip(row in arb_row(all_kinds())) {
        let columns = all_kinds();
        let (decoded, bits) = round_trip(&columns, &row);

        prop_assert_eq!(bits, row.size_in_bytes() * 8);
        prop_assert_eq!(decoded, row);
    }

    #[test]
    fn prop_wide_schema_round_trip(
        row in arb_row(
            (0..MAX_COLUMNS)
                .map(|i| column(&format!("c{}", i), ColumnKind::Int16))
                .collect()
        )
    ) {
        let columns: Vec<Column> = (0..MAX_COLUMNS)
            .map(|i| column(&format!("c{}", i), ColumnKind::Int16))
            .collect();
        let (decoded, _) = round_trip(&columns, &row);
        prop_assert_eq!(decoded.mask(), row.mask());
        prop_assert_eq!(decoded, row);
    }
}
