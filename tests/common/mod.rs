//! Common test utilities for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use tessera::{
    predicate::{row_key, Cell, CellType, ColumnRef, ComparisonOp, Predicate},
    BufferOption, ColumnSpec, KnowsRowCountTable, MemoryTable, Row, RowBuffer, RowIterator,
    TableFilter, TableLayout, TableRef,
};

/// Installs a test subscriber honouring `RUST_LOG`, once per binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `[int, string, long, double, boolean]` with names prefixed by `prefix`.
pub fn mixed_layout(prefix: &str) -> TableLayout {
    TableLayout::new([
        ColumnSpec::new(format!("{prefix}int"), CellType::Int32),
        ColumnSpec::new(format!("{prefix}string"), CellType::Utf8),
        ColumnSpec::new(format!("{prefix}long"), CellType::Int64),
        ColumnSpec::new(format!("{prefix}double"), CellType::Float64),
        ColumnSpec::new(format!("{prefix}boolean"), CellType::Boolean),
    ])
    .expect("unique column names")
}

/// Row `i` of the mixed layout: int = long = i, boolean = i is odd.
///
/// Every seventh row misses its string cell.
pub fn mixed_row(i: i32) -> Row {
    let string = if i % 7 == 6 {
        Cell::Missing
    } else {
        Cell::from(format!("s{i}"))
    };
    Row::new(
        i.to_string(),
        vec![
            Cell::Int32(i),
            string,
            Cell::Int64(i64::from(i)),
            Cell::Float64(f64::from(i) / 2.0),
            Cell::Boolean(i % 2 == 1),
        ],
    )
}

/// Mixed-layout rows `range`, held in memory.
pub fn mixed_memory(prefix: &str, range: std::ops::Range<i32>) -> TableRef {
    Arc::new(MemoryTable::new(mixed_layout(prefix), range.map(mixed_row)).expect("valid rows"))
}

/// Mixed-layout rows `range`, encoded into a row buffer.
pub fn mixed_buffer(prefix: &str, range: std::ops::Range<i32>) -> TableRef {
    Arc::new(
        RowBuffer::from_rows(mixed_layout(prefix), range.map(mixed_row), BufferOption::default())
            .expect("valid rows"),
    )
}

/// Layout of `width` columns named `{prefix}{i}`, cycling through int,
/// long and string.
pub fn wide_layout(prefix: &str, first: usize, width: usize) -> TableLayout {
    TableLayout::new((first..first + width).map(|i| {
        let cell_type = match i % 3 {
            0 => CellType::Int32,
            1 => CellType::Int64,
            _ => CellType::Utf8,
        };
        ColumnSpec::new(format!("{prefix}{i}"), cell_type)
    }))
    .expect("unique column names")
}

/// Cell at row `row`, global column `column` of a wide table.
pub fn wide_cell(row: usize, column: usize) -> Cell {
    let value = (row * 100 + column) as i32;
    match column % 3 {
        0 => Cell::Int32(value),
        1 => Cell::Int64(i64::from(value)),
        _ => Cell::from(format!("r{row}c{column}")),
    }
}

/// Wide table holding global columns `first..first + width` for `rows`
/// rows.
pub fn wide_table(prefix: &str, first: usize, width: usize, rows: usize) -> TableRef {
    let layout = wide_layout(prefix, first, width);
    let rows = (0..rows).map(|row| {
        Row::new(
            row.to_string(),
            (first..first + width).map(|column| wide_cell(row, column)).collect(),
        )
    });
    Arc::new(MemoryTable::new(layout, rows).expect("valid rows"))
}

/// Drains `iter`, closing it afterwards.
pub fn drain(mut iter: Box<dyn RowIterator>) -> Vec<Row> {
    let mut rows = Vec::new();
    while iter.has_next().expect("has_next") {
        rows.push(iter.next().expect("next"));
    }
    iter.close();
    rows
}

/// Rows `table` yields for `filter`.
pub fn filtered(table: &dyn KnowsRowCountTable, filter: &TableFilter) -> Vec<Row> {
    drain(table.iter_with_filter(filter).expect("open filtered iterator"))
}

/// Keys of `rows`, in order.
pub fn keys(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| row.key().to_string()).collect()
}

/// Asserts that both tables yield the same keys and cells for `filter`.
pub fn assert_same_rows(actual: &dyn KnowsRowCountTable, expected: &dyn KnowsRowCountTable, filter: &TableFilter) {
    let actual = filtered(actual, filter);
    let expected = filtered(expected, filter);
    assert_eq!(keys(&actual), keys(&expected), "row keys differ for {filter}");
    assert_eq!(actual, expected, "cells differ for {filter}");
}

const OPS: [ComparisonOp; 6] = [
    ComparisonOp::Equal,
    ComparisonOp::NotEqual,
    ComparisonOp::LessThan,
    ComparisonOp::LessThanOrEqual,
    ComparisonOp::GreaterThan,
    ComparisonOp::GreaterThanOrEqual,
];

/// Random leaf over column `index` of `layout`, with literals drawn from
/// the value ranges of the test tables holding about `rows` rows.
pub fn random_leaf(rng: &mut fastrand::Rng, layout: &TableLayout, index: usize, rows: i32) -> Predicate {
    let cell_type = layout.cell_type(index).expect("index inside layout");
    let column = ColumnRef::indexed(index, cell_type);
    if rng.u8(0..10) == 0 {
        return Predicate::missing(column);
    }
    let bound = rows.max(1) * 100;
    let literal = match cell_type {
        CellType::Int32 => Cell::Int32(rng.i32(0..bound)),
        CellType::Int64 => Cell::Int64(i64::from(rng.i32(0..bound))),
        CellType::Float64 => Cell::Float64(f64::from(rng.i32(0..bound)) / 2.0),
        CellType::Utf8 => Cell::from(format!("s{}", rng.i32(0..rows.max(1)))),
        CellType::Boolean => Cell::Boolean(rng.bool()),
    };
    let op = if cell_type.is_orderable() {
        OPS[rng.usize(..OPS.len())]
    } else {
        OPS[rng.usize(..2)]
    };
    Predicate::compare(column, op, literal).expect("literal typed like the column")
}

/// Random predicate tree of at most `depth` levels over `layout`.
pub fn random_predicate(rng: &mut fastrand::Rng, layout: &TableLayout, rows: i32, depth: u32) -> Predicate {
    if depth == 0 || rng.u8(0..3) == 0 {
        if rng.u8(0..12) == 0 {
            return row_key().greater_than(rng.i32(0..rows.max(1)).to_string());
        }
        let index = rng.usize(..layout.width());
        return random_leaf(rng, layout, index, rows);
    }
    match rng.u8(0..3) {
        0 => !random_predicate(rng, layout, rows, depth - 1),
        1 => random_predicate(rng, layout, rows, depth - 1)
            .and(random_predicate(rng, layout, rows, depth - 1)),
        _ => random_predicate(rng, layout, rows, depth - 1)
            .or(random_predicate(rng, layout, rows, depth - 1)),
    }
}

/// Random filter over a table of `layout` holding `rows` rows.
pub fn random_filter(rng: &mut fastrand::Rng, layout: &TableLayout, rows: i32) -> TableFilter {
    let mut builder = TableFilter::builder();
    if rng.bool() {
        let columns: Vec<usize> = (0..layout.width()).filter(|_| rng.bool()).collect();
        builder = builder
            .with_materialize_columns(layout, columns)
            .expect("columns inside layout");
    }
    match rng.u8(0..4) {
        0 => {}
        1 => builder = builder.with_from_row_index(rng.u64(0..rows as u64 + 5)),
        2 => builder = builder.with_to_row_index(rng.u64(0..rows as u64 + 5)),
        _ => {
            let from = rng.u64(0..rows as u64 + 5);
            let to = from + rng.u64(0..rows as u64 + 5);
            builder = builder.with_row_range(from, to).expect("from <= to");
        }
    }
    if rng.u8(0..4) != 0 {
        let predicate = random_predicate(rng, layout, rows, 3);
        builder = builder
            .with_filter_predicate(layout, predicate)
            .expect("predicate fits layout");
    }
    builder.build().expect("valid filter")
}
