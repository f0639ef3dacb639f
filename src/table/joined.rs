use std::fmt;

use crate::{
    error::TableError,
    filter::TableFilter,
    layout::TableLayout,
    observability::{log_debug, log_warn},
    stream::{
        merge::MergeSource,
        projection::FilterSource,
        BoxRowIterator, RowCursor,
    },
    table::{KnowsRowCountTable, TableRef},
};

/// Two row-aligned tables zipped side by side.
///
/// Positions `0..left_width` address the left table, the rest the right
/// one. Row `i` pairs the two rows at position `i`, whose keys must match.
pub struct JoinedTable {
    left: TableRef,
    right: TableRef,
    layout: TableLayout,
}

impl JoinedTable {
    /// Joins `left` and `right`.
    ///
    /// # Errors
    ///
    /// [`TableError::InconsistentJoin`] when the row counts differ, and
    /// [`TableError::DuplicateColumn`] when both sides name a column alike.
    pub fn new(left: TableRef, right: TableRef) -> Result<Self, TableError> {
        if left.row_count() != right.row_count() {
            return Err(TableError::InconsistentJoin(format!(
                "left table has {} rows, right table has {}",
                left.row_count(),
                right.row_count()
            )));
        }
        let layout = left.layout().join(right.layout())?;
        Ok(Self {
            left,
            right,
            layout,
        })
    }

    /// Left table.
    pub fn left(&self) -> &TableRef {
        &self.left
    }

    /// Right table.
    pub fn right(&self) -> &TableRef {
        &self.right
    }

    fn left_width(&self) -> usize {
        self.left.layout().width()
    }

    fn split(&self, columns: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let left_width = self.left_width();
        let (left, right): (Vec<usize>, Vec<usize>) =
            columns.iter().partition(|&&column| column < left_width);
        (left, right.into_iter().map(|column| column - left_width).collect())
    }

    /// Opens both sides; the left iterator is closed when the right one
    /// fails to open.
    fn open_both(
        &self,
        left: &TableFilter,
        right: &TableFilter,
    ) -> Result<(BoxRowIterator, BoxRowIterator), TableError> {
        let mut left_iter = self.left.iter_with_filter(left)?;
        match self.right.iter_with_filter(right) {
            Ok(right_iter) => Ok((left_iter, right_iter)),
            Err(err) => {
                left_iter.close();
                log_warn!(
                    component = "joined",
                    event = "right_open_failed",
                    error = %err,
                );
                Err(err)
            }
        }
    }
}

impl KnowsRowCountTable for JoinedTable {
    fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn row_count(&self) -> u64 {
        self.left.row_count()
    }

    fn iter(&self) -> Result<BoxRowIterator, TableError> {
        self.iter_with_filter(&TableFilter::all())
    }

    fn iter_with_filter(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
        let width = self.layout.width();
        filter.check_width(width)?;
        let output = filter.output_columns(width);
        let required = filter.required_columns(width);
        let range = filter.row_range();
        let (left_columns, right_columns) = self.split(&required);
        log_debug!(
            component = "joined",
            event = "filter_split",
            left_columns = left_columns.len(),
            right_columns = right_columns.len(),
            residual_predicate = filter.predicate().is_some(),
            filter = %filter,
        );

        // every side is read in lockstep, even with no cells requested,
        // so each position checks its key pair
        let left_filter = TableFilter::from_parts(Some(left_columns), range, None);
        let right_filter = TableFilter::from_parts(Some(right_columns), range, None);
        let (left, right) = self.open_both(&left_filter, &right_filter)?;
        let merged = RowCursor::boxed(MergeSource::new(left, right));
        if filter.predicate().is_none() && required == output {
            return Ok(merged);
        }
        let source = FilterSource::new(
            merged,
            required,
            0,
            None,
            filter.predicate().cloned(),
            &output,
        )?;
        Ok(RowCursor::boxed(source))
    }
}

impl fmt::Debug for JoinedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinedTable")
            .field("layout", &self.layout)
            .field("row_count", &self.left.row_count())
            .finish()
    }
}
