use std::{fmt, sync::Arc};

use crate::{
    error::TableError,
    filter::TableFilter,
    layout::TableLayout,
    observability::{log_debug, log_trace},
    stream::{chain::ChainSource, BoxRowIterator, EmptySource, RowCursor},
    table::{KnowsRowCountTable, TableRef},
};

/// Delegates sharing one layout, stacked vertically in order.
///
/// Row `i` of the concatenation is row `i - start` of the delegate whose
/// rows start at `start`.
pub struct ConcatenatedTable {
    layout: TableLayout,
    delegates: Arc<[TableRef]>,
    starts: Arc<[u64]>,
    row_count: u64,
}

impl ConcatenatedTable {
    /// Stacks `delegates` in order.
    ///
    /// # Errors
    ///
    /// [`TableError::LayoutMismatch`] when there are no delegates, or when a
    /// delegate's layout differs from the first one's.
    pub fn new(delegates: Vec<TableRef>) -> Result<Self, TableError> {
        let Some(first) = delegates.first() else {
            return Err(TableError::LayoutMismatch(
                "concatenation needs at least one table".to_string(),
            ));
        };
        let layout = first.layout().clone();
        let mut starts = Vec::with_capacity(delegates.len());
        let mut row_count = 0u64;
        for (i, delegate) in delegates.iter().enumerate() {
            if delegate.layout() != &layout {
                return Err(TableError::LayoutMismatch(format!(
                    "table {i} has layout {}, expected {layout}",
                    delegate.layout()
                )));
            }
            starts.push(row_count);
            row_count += delegate.row_count();
        }
        Ok(Self {
            layout,
            delegates: delegates.into(),
            starts: starts.into(),
            row_count,
        })
    }

    /// Stacked tables in order.
    pub fn delegates(&self) -> &[TableRef] {
        &self.delegates
    }

    /// Filter for every delegate the requested rows reach, with the range
    /// shifted to the delegate's own row numbers.
    fn plan(&self, filter: &TableFilter) -> Vec<(TableRef, TableFilter)> {
        let range = filter.row_range();
        let columns = filter.materialized_columns().map(<[usize]>::to_vec);
        let mut plan = Vec::with_capacity(self.delegates.len());
        for (i, (delegate, start)) in self.delegates.iter().zip(self.starts.iter()).enumerate() {
            let count = delegate.row_count();
            let local = match range {
                Some(range) => match range.local(*start, count) {
                    Some(local) => Some(local),
                    None => {
                        log_trace!(
                            component = "concatenated",
                            event = "delegate_skipped",
                            delegate = i,
                            start = *start,
                            rows = count,
                        );
                        continue;
                    }
                },
                None if count == 0 => continue,
                None => None,
            };
            let delegate_filter =
                TableFilter::from_parts(columns.clone(), local, filter.predicate().cloned());
            plan.push((Arc::clone(delegate), delegate_filter));
        }
        plan
    }
}

impl KnowsRowCountTable for ConcatenatedTable {
    fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn iter(&self) -> Result<BoxRowIterator, TableError> {
        self.iter_with_filter(&TableFilter::all())
    }

    fn iter_with_filter(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
        filter.check_width(self.layout.width())?;
        let plan = self.plan(filter);
        log_debug!(
            component = "concatenated",
            event = "filter_split",
            delegates = self.delegates.len(),
            reached = plan.len(),
            filter = %filter,
        );
        if plan.is_empty() {
            return Ok(RowCursor::boxed(EmptySource));
        }
        Ok(RowCursor::boxed(ChainSource::new(plan)))
    }
}

impl fmt::Debug for ConcatenatedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcatenatedTable")
            .field("layout", &self.layout)
            .field("starts", &self.starts)
            .field("row_count", &self.row_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tessera_predicate::{int_col, Cell, CellType};

    use super::*;
    use crate::{
        layout::{ColumnSpec, Row},
        stream::RowIterator,
        table::MemoryTable,
    };

    fn layout() -> TableLayout {
        TableLayout::new([ColumnSpec::new("v", CellType::Int32)]).unwrap()
    }

    /// Memory table recording every filter it receives.
    struct Recording {
        inner: MemoryTable,
        seen: Mutex<Vec<TableFilter>>,
    }

    impl KnowsRowCountTable for Recording {
        fn layout(&self) -> &TableLayout {
            self.inner.layout()
        }

        fn row_count(&self) -> u64 {
            self.inner.row_count()
        }

        fn iter(&self) -> Result<BoxRowIterator, TableError> {
            self.inner.iter()
        }

        fn iter_with_filter(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
            self.seen.lock().unwrap().push(filter.clone());
            self.inner.iter_with_filter(filter)
        }
    }

    fn part(from: i32, to: i32) -> Arc<Recording> {
        let rows = (from..to).map(|i| Row::new(i.to_string(), vec![Cell::Int32(i)]));
        Arc::new(Recording {
            inner: MemoryTable::new(layout(), rows).unwrap(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn keys(mut iter: BoxRowIterator) -> Vec<String> {
        let mut keys = Vec::new();
        while iter.has_next().unwrap() {
            keys.push(iter.next().unwrap().key().to_string());
        }
        keys
    }

    #[test]
    fn layouts_must_match() {
        let other = TableLayout::new([ColumnSpec::new("w", CellType::Int32)]).unwrap();
        let mismatched: TableRef = Arc::new(MemoryTable::new(other, Vec::new()).unwrap());
        let err = ConcatenatedTable::new(vec![part(0, 2) as TableRef, mismatched]).expect_err("v vs w");
        assert!(matches!(err, TableError::LayoutMismatch(_)));
        assert!(ConcatenatedTable::new(Vec::new()).is_err());
    }

    #[test]
    fn range_is_split_and_shifted() {
        let parts = [part(0, 5), part(5, 5), part(5, 12), part(12, 20)];
        let table = ConcatenatedTable::new(
            parts.iter().map(|p| Arc::clone(p) as TableRef).collect(),
        )
        .unwrap();
        assert_eq!(table.row_count(), 20);

        let filter = TableFilter::filter_range_of_rows(3, 8).unwrap();
        assert_eq!(
            keys(table.iter_with_filter(&filter).unwrap()),
            ["3", "4", "5", "6", "7", "8"]
        );
        let forwarded = |i: usize| parts[i].seen.lock().unwrap().clone();
        assert_eq!(forwarded(0)[0].row_range().map(|r| (r.from(), r.to())), Some((3, 4)));
        assert!(forwarded(1).is_empty());
        assert_eq!(forwarded(2)[0].row_range().map(|r| (r.from(), r.to())), Some((0, 3)));
        assert!(forwarded(3).is_empty());
    }

    #[test]
    fn predicate_is_forwarded_verbatim() {
        let parts = [part(0, 10), part(10, 20)];
        let table = ConcatenatedTable::new(
            parts.iter().map(|p| Arc::clone(p) as TableRef).collect(),
        )
        .unwrap();
        let predicate = int_col(0).custom(|v| v % 4 == 1);
        let filter = TableFilter::filter_rows(table.layout(), predicate.clone()).unwrap();
        assert_eq!(
            keys(table.iter_with_filter(&filter).unwrap()),
            ["1", "5", "9", "13", "17"]
        );
        for part in &parts {
            let seen = part.seen.lock().unwrap();
            assert_eq!(seen[0].predicate(), Some(&predicate));
            assert_eq!(seen[0].row_range(), None);
        }
    }

    #[test]
    fn delegates_open_lazily() {
        let parts = [part(0, 3), part(3, 6)];
        let table = ConcatenatedTable::new(
            parts.iter().map(|p| Arc::clone(p) as TableRef).collect(),
        )
        .unwrap();
        let mut iter = table.iter().unwrap();
        for _ in 0..3 {
            iter.next().unwrap();
        }
        assert_eq!(parts[1].seen.lock().unwrap().len(), 0);
        iter.next().unwrap();
        assert_eq!(parts[1].seen.lock().unwrap().len(), 1);
    }
}
