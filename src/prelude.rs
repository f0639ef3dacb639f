//! Convenience re-exports for common tessera usage.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! let filter = TableFilter::builder()
//!     .with_row_range(13, 17)?
//!     .with_filter_predicate(table.layout(), int_col(0).greater_or_equal(10))?
//!     .build()?;
//! let rows = table.iter_with_filter(&filter)?.rows();
//! ```

pub use tessera_predicate::{
    bool_col, double_col, int_col, long_col, not, row_key, string_col, Cell, CellType,
    Predicate, PredicateBuilder, RowKey,
};

pub use crate::{
    ColumnSpec, KnowsRowCountTable, Row, RowIterator, TableError, TableExt, TableFilter,
    TableLayout, TableRef,
};
