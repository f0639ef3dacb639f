use std::{collections::HashSet, sync::Arc};

use crate::{
    error::TableError,
    layout::{Row, TableLayout},
    stream::{BoxRowIterator, RowCursor, RowSource},
    table::KnowsRowCountTable,
};

/// Rows held in memory.
///
/// Has no native pushdown: filtered iteration goes through the in-memory
/// path of [`KnowsRowCountTable::iter_with_filter`].
#[derive(Clone, Debug)]
pub struct MemoryTable {
    layout: TableLayout,
    rows: Arc<[Row]>,
}

impl MemoryTable {
    /// Creates a table from `rows`, checked against `layout`.
    ///
    /// # Errors
    ///
    /// [`TableError::SchemaMismatch`] for a row that does not fit `layout`,
    /// [`TableError::DuplicateRowKey`] for a repeated key.
    pub fn new<I>(layout: TableLayout, rows: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Row>,
    {
        let rows: Arc<[Row]> = rows.into_iter().collect();
        let mut keys = HashSet::with_capacity(rows.len());
        for row in rows.iter() {
            layout.check_row(row)?;
            if !keys.insert(row.key()) {
                return Err(TableError::DuplicateRowKey(row.key().clone()));
            }
        }
        Ok(Self { layout, rows })
    }

    /// Stored rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl KnowsRowCountTable for MemoryTable {
    fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn iter(&self) -> Result<BoxRowIterator, TableError> {
        Ok(RowCursor::boxed(MemorySource {
            rows: Arc::clone(&self.rows),
            next: 0,
        }))
    }
}

struct MemorySource {
    rows: Arc<[Row]>,
    next: usize,
}

impl RowSource for MemorySource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        let row = self.rows.get(self.next).cloned();
        self.next += 1;
        Ok(row)
    }
}
