//! Tables that know their exact row count, physical and composed.

mod concatenate;
mod joined;
mod memory;
mod rearrange;

use std::{fmt, sync::Arc};

pub use concatenate::ConcatenatedTable;
pub use joined::JoinedTable;
pub use memory::MemoryTable;
pub use rearrange::{CellFactory, RearrangedTable, ViewColumn};

use crate::{
    error::TableError,
    filter::TableFilter,
    layout::TableLayout,
    stream::{projection::FilterSource, BoxRowIterator, RowCursor},
};

/// Shared handle to a table.
pub type TableRef = Arc<dyn KnowsRowCountTable>;

/// Capability of every table that knows how many rows it holds.
///
/// Tables are immutable once built; any number of iterators may be open over
/// the same table at once.
pub trait KnowsRowCountTable: Send + Sync {
    /// Column layout of the table.
    fn layout(&self) -> &TableLayout;

    /// Exact number of rows.
    fn row_count(&self) -> u64;

    /// Iterates every row with every column.
    fn iter(&self) -> Result<BoxRowIterator, TableError>;

    /// Iterates the rows and columns `filter` keeps, in table order.
    ///
    /// The default implementation reads full rows through
    /// [`iter`](Self::iter) and filters them in memory. Tables able to skip
    /// rows or columns natively override it.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidColumn`] when `filter` names a position past the
    /// layout, or any error raised while opening the rows.
    fn iter_with_filter(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
        let width = self.layout().width();
        filter.check_width(width)?;
        if filter.is_unrestricted() {
            return self.iter();
        }
        filter_in_memory(self.iter()?, width, filter)
    }
}

/// Applies `filter` to full rows of a `width`-column table read from `input`.
pub(crate) fn filter_in_memory(
    input: BoxRowIterator,
    width: usize,
    filter: &TableFilter,
) -> Result<BoxRowIterator, TableError> {
    let source = FilterSource::new(
        input,
        (0..width).collect(),
        0,
        filter.row_range(),
        filter.predicate().cloned(),
        &filter.output_columns(width),
    )?;
    Ok(RowCursor::boxed(source))
}

/// A table together with a filter; iterators are created on demand.
#[derive(Clone)]
pub struct FilteredTable {
    table: TableRef,
    filter: TableFilter,
}

impl FilteredTable {
    /// Pairs `table` with `filter`.
    pub fn new(table: TableRef, filter: TableFilter) -> Self {
        Self { table, filter }
    }

    /// Underlying table.
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Filter applied on every iteration.
    pub fn filter(&self) -> &TableFilter {
        &self.filter
    }

    /// Opens a fresh filtered iterator.
    ///
    /// # Errors
    ///
    /// See [`KnowsRowCountTable::iter_with_filter`].
    pub fn iter(&self) -> Result<BoxRowIterator, TableError> {
        self.table.iter_with_filter(&self.filter)
    }
}

impl fmt::Debug for FilteredTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredTable")
            .field("layout", self.table.layout())
            .field("row_count", &self.table.row_count())
            .field("filter", &self.filter)
            .finish()
    }
}

/// Convenience methods on [`TableRef`].
pub trait TableExt {
    /// Defers filtering: returns a view whose iterators apply `filter`.
    fn filter(&self, filter: TableFilter) -> FilteredTable;
}

impl TableExt for TableRef {
    fn filter(&self, filter: TableFilter) -> FilteredTable {
        FilteredTable::new(Arc::clone(self), filter)
    }
}
