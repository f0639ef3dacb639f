#![deny(missing_docs)]
//! Core predicate structures shared by every tessera table.

mod builder;
mod column;
mod error;
mod eval;
mod node;
mod remap;
mod value;
mod visitor;

pub use builder::PredicateBuilder;
pub use column::{
    bool_col, double_col, int_col, long_col, row_key, string_col, Column, ColumnRef,
    ColumnValue, IndexedColumn, OrderedValue,
};
pub use error::PredicateError;
pub use eval::{CellSource, Evaluator};
pub use node::{not, ComparisonOp, CustomFn, Predicate, PredicateLeaf, PredicateNode};
pub use remap::{IndexMap, IndexMapper};
pub use value::{Cell, CellType, RowKey};
pub use visitor::PredicateVisitor;
