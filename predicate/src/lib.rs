#![deny(missing_docs)]
//! Tessera predicate facade crate.
//!
//! Predicates are immutable trees over positional columns of a row layout.
//! They are built from typed column handles, walked through
//! [`PredicateVisitor`], rewritten for another layout with [`IndexMapper`],
//! and evaluated against any [`CellSource`].

mod core;

pub use core::{
    bool_col, double_col, int_col, long_col, not, row_key, string_col, Cell, CellSource, CellType,
    Column, ColumnRef, ColumnValue, ComparisonOp, CustomFn, Evaluator, IndexMap, IndexMapper,
    IndexedColumn, OrderedValue, Predicate, PredicateBuilder, PredicateError, PredicateLeaf,
    PredicateNode, PredicateVisitor, RowKey,
};
