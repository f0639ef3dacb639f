#![deny(missing_docs)]
//! Row tables with filter pushdown through composition.
//!
//! A [`TableFilter`] restricts rows by range and predicate and columns by
//! position. Every table implements [`KnowsRowCountTable`]; composed tables
//! (rearranged, concatenated, joined) translate the filter for their
//! delegates, and physical tables apply it while reading.

mod observability;

pub mod filter;

/// Error type shared by all tables.
pub mod error;

pub mod layout;

/// Options for physical stores.
pub mod option;

pub mod buffer;

pub mod stream;

pub mod table;

pub mod prelude;

/// Predicate construction, remapping and evaluation.
pub use tessera_predicate as predicate;

pub use crate::{
    buffer::{RowBuffer, RowBufferWriter},
    error::TableError,
    filter::{RowRange, TableFilter, TableFilterBuilder},
    layout::{ColumnSpec, Row, TableLayout},
    option::BufferOption,
    stream::{BoxRowIterator, RowIterator, Rows},
    table::{
        CellFactory, ConcatenatedTable, FilteredTable, JoinedTable, KnowsRowCountTable,
        MemoryTable, RearrangedTable, TableExt, TableRef, ViewColumn,
    },
};
