use chrono::{FixedOffset, NaiveDate};
use formula_column_builder::{
    BuilderError, BuilderOptions, ColumnSchema, MemorySink, Table, TableBuilder, Value, ValueType,
};
use pretty_assertions::assert_eq;

fn row(i: i64) -> Vec<Value> {
    vec![Value::Integer(i), Value::Float(i as f64)]
}

fn int_float_builder(options: BuilderOptions) -> TableBuilder {
    TableBuilder::new(vec![ValueType::Integer, ValueType::Float], None, options).unwrap()
}

fn all_types() -> Vec<ValueType> {
    vec![
        ValueType::Integer,
        ValueType::Float,
        ValueType::String,
        ValueType::NumericVector,
        ValueType::HeterogeneousList,
        ValueType::Dictionary,
        ValueType::DateTime,
    ]
}

fn all_type_rows() -> Vec<Vec<Value>> {
    let naive = NaiveDate::from_ymd_opt(2013, 5, 7)
        .unwrap()
        .and_hms_opt(10, 4, 10)
        .unwrap();
    let zoned = NaiveDate::from_ymd_opt(1902, 10, 21)
        .unwrap()
        .and_hms_opt(10, 34, 10)
        .unwrap();
    let gmt = FixedOffset::east_opt(0).unwrap();

    (1..=10i64)
        .map(|i| {
            let datetime = if i % 2 == 1 {
                Value::datetime(naive)
            } else {
                Value::datetime_with_offset(zoned, gmt)
            };
            vec![
                Value::Integer(i),
                Value::Float(i as f64),
                Value::from(i.to_string()),
                Value::Vector(vec![i as f64, (i + 1) as f64]),
                Value::List(vec![Value::Integer(i), Value::from(i.to_string()), Value::Float(i as f64)]),
                Value::Dict(vec![
                    (Value::from(i.to_string()), Value::Integer(i)),
                    (Value::Integer(i), Value::Float(i as f64)),
                ]),
                datetime,
            ]
        })
        .collect()
}

fn assert_table_rows(table: &Table, expected: &[Vec<Value>]) {
    assert_eq!(table.row_count(), expected.len());
    for (idx, expected_row) in expected.iter().enumerate() {
        assert_eq!(table.row(idx).as_ref(), Some(expected_row), "row {idx}");
    }
}

#[test]
fn all_column_types_by_row_and_in_bulk() {
    let rows = all_type_rows();

    let builder = TableBuilder::new(all_types(), None, BuilderOptions::default()).unwrap();
    for r in &rows {
        builder.append(r.clone(), 0).unwrap();
    }
    let table = builder.close(&mut MemorySink).unwrap();
    assert_eq!(table.column_types(), all_types());
    assert_eq!(
        table.column_names(),
        ["X1", "X2", "X3", "X4", "X5", "X6", "X7"].map(String::from)
    );
    assert_table_rows(&table, &rows);

    let builder = TableBuilder::new(all_types(), None, BuilderOptions::default()).unwrap();
    let report = builder.append_multiple(rows.clone(), 0).unwrap();
    assert!(report.is_clean());
    let bulk = builder.close(&mut MemorySink).unwrap();
    assert_eq!(bulk, table);
}

#[test]
fn history_returns_recent_rows() {
    let builder = int_float_builder(BuilderOptions::new(1, 10));
    builder.append_multiple((0..8).map(row), 0).unwrap();

    assert_eq!(builder.read_history(3).unwrap(), vec![row(5), row(6), row(7)]);
    assert_eq!(builder.read_history(20).unwrap(), (0..8).map(row).collect::<Vec<_>>());
    assert_eq!(builder.recent_history().unwrap(), (0..8).map(row).collect::<Vec<_>>());

    builder.append_multiple((0..5).map(row), 0).unwrap();
    assert_eq!(
        builder.read_history(10).unwrap(),
        [3, 4, 5, 6, 7, 0, 1, 2, 3, 4].map(row).to_vec()
    );

    builder.append(row(50), 0).unwrap();
    assert_eq!(
        builder.read_history(10).unwrap(),
        [4, 5, 6, 7, 0, 1, 2, 3, 4, 50].map(row).to_vec()
    );
    assert!(builder.read_history(0).unwrap().is_empty());

    let table = builder.close(&mut MemorySink).unwrap();
    let expected: Vec<Vec<Value>> = (0..8).chain(0..5).chain([50]).map(row).collect();
    assert_table_rows(&table, &expected);
}

#[test]
fn segments_concatenate_in_index_order() {
    let builder = TableBuilder::new(vec![ValueType::Integer], None, BuilderOptions::new(4, 10))
        .unwrap();
    builder.append_multiple((20..30i64).map(|i| [i]), 2).unwrap();
    builder.append_multiple((10..20i64).map(|i| [i]), 1).unwrap();
    builder.append_multiple((30..40i64).map(|i| [i]), 3).unwrap();
    builder.append_multiple((0..10i64).map(|i| [i]), 0).unwrap();
    assert_eq!(builder.segment_lengths(), vec![10, 10, 10, 10]);

    let table = builder.close(&mut MemorySink).unwrap();
    let column = table.column("X1").unwrap();
    assert_eq!(
        column.values(),
        (0..40).map(Value::Integer).collect::<Vec<_>>().as_slice()
    );
}

#[test]
fn default_names_and_explicit_names() {
    let builder = int_float_builder(BuilderOptions::default());
    assert_eq!(builder.column_names(), vec!["X1", "X2"]);
    let table = builder.close(&mut MemorySink).unwrap();
    assert_eq!(table.column_names(), ["X1", "X2"].map(String::from));

    let builder = TableBuilder::new(
        vec![ValueType::Integer, ValueType::String],
        Some(vec!["id".to_string(), "name".to_string()]),
        BuilderOptions::default(),
    )
    .unwrap();
    assert_eq!(
        builder.schema(),
        &[
            ColumnSchema {
                name: "id".to_string(),
                column_type: ValueType::Integer,
            },
            ColumnSchema {
                name: "name".to_string(),
                column_type: ValueType::String,
            },
        ]
    );
}

#[test]
fn schema_errors() {
    let err = TableBuilder::new(
        vec![ValueType::Integer, ValueType::Float],
        Some(vec!["only".to_string()]),
        BuilderOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        BuilderError::Schema("got 1 column names for 2 column types".to_string())
    );

    let err = TableBuilder::new(Vec::new(), None, BuilderOptions::default()).unwrap_err();
    assert_eq!(err, BuilderError::Schema("column types must be defined".to_string()));
}

#[test]
fn row_arity_mismatch_stores_nothing() {
    let builder = int_float_builder(BuilderOptions::default());
    builder.append(row(1), 0).unwrap();
    assert_eq!(
        builder.append(vec![Value::Integer(2)], 0).unwrap_err(),
        BuilderError::RowArityMismatch {
            expected: 2,
            actual: 1,
        }
    );
    builder.append(row(3), 0).unwrap();

    let table = builder.close(&mut MemorySink).unwrap();
    assert_table_rows(&table, &[row(1), row(3)]);
}

#[test]
fn integers_fit_float_columns() {
    let builder = int_float_builder(BuilderOptions::default());
    builder
        .append(vec![Value::Integer(1), Value::Integer(2)], 0)
        .unwrap();
    assert_eq!(
        builder.get_type().unwrap(),
        vec![ValueType::Integer, ValueType::Float]
    );
    let table = builder.close(&mut MemorySink).unwrap();
    assert_table_rows(&table, &[vec![Value::Integer(1), Value::Float(2.0)]]);
}

#[test]
fn bulk_rows_report_rejections_per_row() {
    let builder = int_float_builder(BuilderOptions::default());
    let report = builder
        .append_multiple(
            vec![
                row(0),
                vec![Value::Integer(1)],
                vec![Value::string("x"), Value::Float(2.0)],
                row(3),
            ],
            0,
        )
        .unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected(), 2);
    assert_eq!(report.rejections[0].position, 1);
    assert_eq!(
        report.rejections[0].error,
        BuilderError::RowArityMismatch {
            expected: 2,
            actual: 1,
        }
    );
    assert_eq!(report.rejections[1].position, 2);
    assert_eq!(
        report.rejections[1].error,
        BuilderError::TypeMismatch {
            column: Some("X1".to_string()),
            current: ValueType::Integer,
            incoming: ValueType::String,
        }
    );
    assert_eq!(report.rejections[1].value, vec![Value::string("x"), Value::Float(2.0)]);

    assert_eq!(builder.read_history(10).unwrap(), vec![row(0), row(3)]);
    assert_eq!(builder.stats().accepted, 2);
    assert_eq!(builder.stats().rejected, 2);
}

#[test]
fn inferred_columns_widen_per_column() {
    let builder = TableBuilder::new(
        vec![ValueType::Unknown, ValueType::String],
        None,
        BuilderOptions::default(),
    )
    .unwrap();
    builder
        .append(vec![Value::Integer(1), Value::string("a")], 0)
        .unwrap();
    builder
        .append(vec![Value::Float(1.5), Value::string("b")], 0)
        .unwrap();
    assert_eq!(
        builder.get_type().unwrap(),
        vec![ValueType::Float, ValueType::String]
    );

    let table = builder.close(&mut MemorySink).unwrap();
    assert_table_rows(
        &table,
        &[
            vec![Value::Float(1.0), Value::string("a")],
            vec![Value::Float(1.5), Value::string("b")],
        ],
    );
}

#[test]
fn close_twice_fails() {
    let builder = int_float_builder(BuilderOptions::default());
    builder.append(row(1), 0).unwrap();
    let table = builder.close(&mut MemorySink).unwrap();
    assert_eq!(
        builder.close(&mut MemorySink).unwrap_err(),
        BuilderError::AlreadyClosed
    );
    assert_eq!(builder.append(row(2), 0).unwrap_err(), BuilderError::AlreadyClosed);
    assert_eq!(builder.get_type().unwrap_err(), BuilderError::AlreadyClosed);
    assert_table_rows(&table, &[row(1)]);
}

#[test]
fn invalid_segment_for_rows() {
    let builder = int_float_builder(BuilderOptions::new(2, 10));
    assert_eq!(
        builder.append(row(1), 2).unwrap_err(),
        BuilderError::InvalidSegment {
            segment: 2,
            segment_count: 2,
        }
    );
    assert!(builder.is_empty());
}

#[test]
fn missing_schema_type_is_inferred() {
    let builder = TableBuilder::new(
        vec![ValueType::Missing, ValueType::Integer],
        None,
        BuilderOptions::default(),
    )
    .unwrap();
    builder
        .append(vec![Value::Missing, Value::Integer(1)], 0)
        .unwrap();
    builder
        .append(vec![Value::string("a"), Value::Integer(2)], 0)
        .unwrap();
    assert_eq!(
        builder.get_type().unwrap(),
        vec![ValueType::String, ValueType::Integer]
    );

    let table = builder.close(&mut MemorySink).unwrap();
    assert_table_rows(
        &table,
        &[
            vec![Value::Missing, Value::Integer(1)],
            vec![Value::string("a"), Value::Integer(2)],
        ],
    );
}

#[test]
fn single_values_append_to_one_column_tables() {
    let builder = TableBuilder::new(vec![ValueType::Float], None, BuilderOptions::default())
        .unwrap();
    builder.append_value(1i64, 0).unwrap();
    builder.append_value(2.5f64, 0).unwrap();
    assert!(builder.append_value("x", 0).unwrap_err().is_type_mismatch());
    assert_eq!(builder.stats().rejected, 1);

    let table = builder.close(&mut MemorySink).unwrap();
    assert_table_rows(&table, &[vec![Value::Float(1.0)], vec![Value::Float(2.5)]]);

    let builder = int_float_builder(BuilderOptions::default());
    assert_eq!(
        builder.append_value(1i64, 0).unwrap_err(),
        BuilderError::RowArityMismatch {
            expected: 2,
            actual: 1,
        }
    );
    assert!(builder.is_empty());
}
