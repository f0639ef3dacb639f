use std::{collections::HashSet, fmt, sync::Arc};

use tessera_predicate::{Cell, IndexMap};

use crate::{
    error::TableError,
    filter::TableFilter,
    layout::{ColumnSpec, Row, TableLayout},
    observability::log_debug,
    stream::{
        append::AppendSource,
        projection::{FilterSource, ProjectSource, Projection},
        BoxRowIterator, RowCursor,
    },
    table::{KnowsRowCountTable, TableRef},
};

/// Computes appended columns from the full delegate row.
///
/// Computed cells are opaque to the engine: a filter that reads or returns
/// them cannot be pushed past the rearranged table.
pub trait CellFactory: Send + Sync {
    /// Columns produced, in order.
    fn columns(&self) -> &[ColumnSpec];

    /// Cells for `row`, one per entry of [`columns`](Self::columns).
    ///
    /// # Errors
    ///
    /// Any error the computation raises; it aborts the iteration.
    fn cells(&self, row: &Row) -> Result<Vec<Cell>, TableError>;
}

/// Source of one column of a [`RearrangedTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewColumn {
    /// Column of the delegate at the given position. Pushdown-eligible.
    Delegate(usize),
    /// Column of the [`CellFactory`] at the given position. Computed.
    Appended(usize),
}

impl ViewColumn {
    /// Returns true for computed columns.
    pub fn is_computed(&self) -> bool {
        matches!(self, ViewColumn::Appended(_))
    }
}

/// View over a delegate with permuted, removed and appended columns.
///
/// Row count and row order are those of the delegate.
pub struct RearrangedTable {
    delegate: TableRef,
    columns: Arc<[ViewColumn]>,
    factory: Option<Arc<dyn CellFactory>>,
    layout: TableLayout,
}

impl RearrangedTable {
    /// Creates a view whose column `i` is `columns[i]`.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidColumn`] when a delegate column does not exist,
    /// is used twice, or an appended column is missing from `factory`;
    /// [`TableError::DuplicateColumn`] when the resulting names collide.
    pub fn new(
        delegate: TableRef,
        columns: Vec<ViewColumn>,
        factory: Option<Arc<dyn CellFactory>>,
    ) -> Result<Self, TableError> {
        let delegate_layout = delegate.layout();
        let mut seen = HashSet::with_capacity(columns.len());
        let mut specs = Vec::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if !seen.insert(*column) {
                return Err(TableError::invalid_column(
                    position,
                    format!("{column:?} appears twice"),
                ));
            }
            let spec = match *column {
                ViewColumn::Delegate(index) => delegate_layout.column(index),
                ViewColumn::Appended(index) => factory
                    .as_ref()
                    .and_then(|factory| factory.columns().get(index)),
            };
            let spec = spec.ok_or_else(|| {
                TableError::invalid_column(position, format!("{column:?} does not exist"))
            })?;
            specs.push(spec.clone());
        }
        Ok(Self {
            layout: TableLayout::new(specs)?,
            delegate,
            columns: columns.into(),
            factory,
        })
    }

    /// View keeping the delegate columns at `indices`, in that order.
    ///
    /// # Errors
    ///
    /// See [`RearrangedTable::new`].
    pub fn select(delegate: TableRef, indices: &[usize]) -> Result<Self, TableError> {
        let columns = indices.iter().copied().map(ViewColumn::Delegate).collect();
        Self::new(delegate, columns, None)
    }

    /// View holding every delegate column followed by the factory columns.
    ///
    /// # Errors
    ///
    /// See [`RearrangedTable::new`].
    pub fn append(delegate: TableRef, factory: Arc<dyn CellFactory>) -> Result<Self, TableError> {
        let columns = (0..delegate.layout().width())
            .map(ViewColumn::Delegate)
            .chain((0..factory.columns().len()).map(ViewColumn::Appended))
            .collect();
        Self::new(delegate, columns, Some(factory))
    }

    /// Source of every view column.
    pub fn view_columns(&self) -> &[ViewColumn] {
        &self.columns
    }

    /// Maps view positions to delegate positions; computed columns have no
    /// target.
    fn delegate_map(&self) -> IndexMap {
        IndexMap::new(
            self.columns
                .iter()
                .map(|column| match column {
                    ViewColumn::Delegate(index) => Some(*index),
                    ViewColumn::Appended(_) => None,
                })
                .collect(),
        )
    }

    fn needs_computed(&self, filter: &TableFilter) -> Option<usize> {
        filter
            .required_columns(self.layout.width())
            .into_iter()
            .find(|&column| self.columns[column].is_computed())
    }

    fn iter_pushed_down(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
        let map = self.delegate_map();
        let output = filter.output_columns(self.layout.width());
        let mut targets = output
            .iter()
            .map(|&column| map.get(column))
            .collect::<Result<Vec<_>, _>>()?;
        let predicate = filter
            .predicate()
            .map(|predicate| predicate.remap(&map))
            .transpose()?;
        log_debug!(
            component = "rearranged",
            event = "filter_pushdown",
            pushed = true,
            predicate = predicate.is_some(),
        );

        // delegate rows come back in ascending delegate order; output cell
        // `i` sits at the rank of `targets[i]`
        let mut ranked: Vec<usize> = (0..targets.len()).collect();
        ranked.sort_unstable_by_key(|&position| targets[position]);
        let mut slots = vec![0; targets.len()];
        for (rank, &position) in ranked.iter().enumerate() {
            slots[position] = rank;
        }
        targets.sort_unstable();
        let projection = Projection::reorder(slots, targets.len());
        let delegate_filter = TableFilter::from_parts(Some(targets), filter.row_range(), predicate);
        let input = self.delegate.iter_with_filter(&delegate_filter)?;
        Ok(match projection {
            Projection::Identity => input,
            projection => RowCursor::boxed(ProjectSource::new(input, projection)),
        })
    }

    fn iter_computed(
        &self,
        filter: &TableFilter,
        computed: usize,
    ) -> Result<BoxRowIterator, TableError> {
        log_debug!(
            component = "rearranged",
            event = "filter_pushdown",
            pushed = false,
            computed_column = computed,
            predicate = filter.predicate().is_some(),
        );
        let width = self.layout.width();
        let delegate_filter = TableFilter::from_parts(None, filter.row_range(), None);
        let input = self.delegate.iter_with_filter(&delegate_filter)?;
        let appended = RowCursor::boxed(AppendSource::new(
            input,
            Arc::clone(&self.columns),
            self.factory.clone(),
        ));
        if filter.predicate().is_none() && filter.materialized_columns().is_none() {
            return Ok(appended);
        }
        let source = FilterSource::new(
            appended,
            (0..width).collect(),
            0,
            None,
            filter.predicate().cloned(),
            &filter.output_columns(width),
        )?;
        Ok(RowCursor::boxed(source))
    }
}

impl KnowsRowCountTable for RearrangedTable {
    fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn row_count(&self) -> u64 {
        self.delegate.row_count()
    }

    fn iter(&self) -> Result<BoxRowIterator, TableError> {
        self.iter_with_filter(&TableFilter::all())
    }

    fn iter_with_filter(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
        filter.check_width(self.layout.width())?;
        match self.needs_computed(filter) {
            Some(computed) => self.iter_computed(filter, computed),
            None => self.iter_pushed_down(filter),
        }
    }
}

impl fmt::Debug for RearrangedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RearrangedTable")
            .field("layout", &self.layout)
            .field("columns", &self.columns)
            .finish()
    }
}
