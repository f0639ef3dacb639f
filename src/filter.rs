//! Filter requests handed to [`KnowsRowCountTable::iter_with_filter`].
//!
//! [`KnowsRowCountTable::iter_with_filter`]: crate::table::KnowsRowCountTable::iter_with_filter

use std::{collections::BTreeSet, fmt, sync::Arc};

use tessera_predicate::{ColumnRef, Predicate, PredicateLeaf, PredicateVisitor};

use crate::{error::TableError, layout::TableLayout};

/// Inclusive row range `[from, to]`.
///
/// `to` may exceed the row count of the table it is applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowRange {
    from: u64,
    to: u64,
}

impl RowRange {
    /// Creates the range `[from, to]`.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidRange`] when `from > to`.
    pub fn new(from: u64, to: u64) -> Result<Self, TableError> {
        if from > to {
            return Err(TableError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// First row of the range.
    pub fn from(&self) -> u64 {
        self.from
    }

    /// Last row of the range.
    pub fn to(&self) -> u64 {
        self.to
    }

    /// Returns true when row `index` lies inside the range.
    pub fn contains(&self, index: u64) -> bool {
        self.from <= index && index <= self.to
    }

    /// Intersection of this range with the `len` rows starting at `start`,
    /// expressed relative to `start`.
    ///
    /// Returns `None` when the two do not overlap.
    pub fn local(&self, start: u64, len: u64) -> Option<RowRange> {
        if len == 0 {
            return None;
        }
        let end = start.saturating_add(len - 1);
        let from = self.from.max(start);
        let to = self.to.min(end);
        (from <= to).then(|| RowRange {
            from: from - start,
            to: to - start,
        })
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Immutable filter request: optional column subset, optional row range and
/// optional predicate.
///
/// The *output* columns are those a yielded row exposes: the materialized
/// subset, or every column of the table. The *required* columns add the
/// columns the predicate reads; readers must decode all of them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableFilter {
    materialize_columns: Option<Arc<[usize]>>,
    from_row_index: Option<u64>,
    to_row_index: Option<u64>,
    predicate: Option<Predicate>,
}

impl TableFilter {
    /// Starts an empty builder.
    pub fn builder() -> TableFilterBuilder {
        TableFilterBuilder::default()
    }

    /// Filter that keeps every row and column.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter keeping the rows of `layout` matching `predicate`.
    ///
    /// # Errors
    ///
    /// See [`TableFilterBuilder::with_filter_predicate`].
    pub fn filter_rows(layout: &TableLayout, predicate: Predicate) -> Result<Self, TableError> {
        Self::builder()
            .with_filter_predicate(layout, predicate)?
            .build()
    }

    /// Filter keeping only the columns at `indices`.
    ///
    /// # Errors
    ///
    /// See [`TableFilterBuilder::with_materialize_columns`].
    pub fn materialize_columns<I>(layout: &TableLayout, indices: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = usize>,
    {
        Self::builder()
            .with_materialize_columns(layout, indices)?
            .build()
    }

    /// Filter keeping rows `from..=to`.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidRange`] when `from > to`.
    pub fn filter_range_of_rows(from: u64, to: u64) -> Result<Self, TableError> {
        Self::builder().with_row_range(from, to)?.build()
    }

    pub(crate) fn from_parts(
        materialize_columns: Option<Vec<usize>>,
        range: Option<RowRange>,
        predicate: Option<Predicate>,
    ) -> Self {
        Self {
            materialize_columns: materialize_columns.map(Arc::from),
            from_row_index: range.map(|range| range.from),
            to_row_index: range.map(|range| range.to),
            predicate,
        }
    }

    /// Materialized column subset, sorted ascending. `None` means all.
    pub fn materialized_columns(&self) -> Option<&[usize]> {
        self.materialize_columns.as_deref()
    }

    /// First row requested, if restricted.
    pub fn from_row_index(&self) -> Option<u64> {
        self.from_row_index
    }

    /// Last row requested, if restricted.
    pub fn to_row_index(&self) -> Option<u64> {
        self.to_row_index
    }

    /// Requested row range, `None` when neither bound is set.
    pub fn row_range(&self) -> Option<RowRange> {
        if self.from_row_index.is_none() && self.to_row_index.is_none() {
            return None;
        }
        Some(RowRange {
            from: self.from_row_index.unwrap_or(0),
            to: self.to_row_index.unwrap_or(u64::MAX),
        })
    }

    /// Row predicate, if any.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Returns true when the filter keeps every row and column.
    pub fn is_unrestricted(&self) -> bool {
        self.materialize_columns.is_none() && self.row_range().is_none() && self.predicate.is_none()
    }

    /// Columns every yielded row exposes, for a table of `width` columns.
    pub fn output_columns(&self, width: usize) -> Vec<usize> {
        match &self.materialize_columns {
            Some(columns) => columns.to_vec(),
            None => (0..width).collect(),
        }
    }

    /// Output columns plus those the predicate reads, sorted.
    pub fn required_columns(&self, width: usize) -> Vec<usize> {
        let mut required: BTreeSet<usize> = self.output_columns(width).into_iter().collect();
        if let Some(predicate) = &self.predicate {
            required.extend(predicate.columns());
        }
        required.into_iter().collect()
    }

    /// Checks that every position the filter names exists in a table of
    /// `width` columns.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidColumn`] for the first position past `width`.
    pub fn check_width(&self, width: usize) -> Result<(), TableError> {
        let materialized = self.materialize_columns.iter().flat_map(|c| c.iter().copied());
        let predicate = self.predicate.iter().flat_map(Predicate::columns);
        match materialized.chain(predicate).find(|&index| index >= width) {
            Some(index) => Err(TableError::invalid_column(
                index,
                format!("table has {width} columns"),
            )),
            None => Ok(()),
        }
    }
}

impl fmt::Display for TableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(columns) = &self.materialize_columns {
            parts.push(format!("columns={columns:?}"));
        }
        if let Some(range) = self.row_range() {
            parts.push(format!("rows={range}"));
        }
        if let Some(predicate) = &self.predicate {
            parts.push(format!("where {predicate}"));
        }
        if parts.is_empty() {
            return f.write_str("all");
        }
        f.write_str(&parts.join(" "))
    }
}

/// Accumulating builder for [`TableFilter`].
///
/// [`build`](Self::build) copies the current state; the builder may keep
/// changing without affecting filters already built.
#[derive(Clone, Debug, Default)]
pub struct TableFilterBuilder {
    materialize_columns: Option<BTreeSet<usize>>,
    from_row_index: Option<u64>,
    to_row_index: Option<u64>,
    predicate: Option<Predicate>,
}

impl TableFilterBuilder {
    /// Restricts the output to the columns at `indices`.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidColumn`] when an index is not a position of
    /// `layout`.
    pub fn with_materialize_columns<I>(
        mut self,
        layout: &TableLayout,
        indices: I,
    ) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut columns = BTreeSet::new();
        for index in indices {
            if index >= layout.width() {
                return Err(TableError::invalid_column(
                    index,
                    format!("layout has {} columns", layout.width()),
                ));
            }
            columns.insert(index);
        }
        self.materialize_columns = Some(columns);
        Ok(self)
    }

    /// Skips rows before `from`.
    pub fn with_from_row_index(self, from: u64) -> Self {
        Self {
            from_row_index: Some(from),
            ..self
        }
    }

    /// Stops after row `to`.
    pub fn with_to_row_index(self, to: u64) -> Self {
        Self {
            to_row_index: Some(to),
            ..self
        }
    }

    /// Keeps rows `from..=to`.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidRange`] when `from > to`.
    pub fn with_row_range(self, from: u64, to: u64) -> Result<Self, TableError> {
        RowRange::new(from, to)?;
        Ok(self.with_from_row_index(from).with_to_row_index(to))
    }

    /// Keeps rows matching `predicate`.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidColumn`] when a leaf addresses a position past
    /// `layout`, or declares a type other than the column's.
    pub fn with_filter_predicate(
        mut self,
        layout: &TableLayout,
        predicate: Predicate,
    ) -> Result<Self, TableError> {
        predicate.accept(&mut LayoutCheck { layout })?;
        self.predicate = Some(predicate);
        Ok(self)
    }

    /// Freezes the current state into a [`TableFilter`].
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidRange`] when the row bounds cross.
    pub fn build(&self) -> Result<TableFilter, TableError> {
        if let (Some(from), Some(to)) = (self.from_row_index, self.to_row_index) {
            RowRange::new(from, to)?;
        }
        Ok(TableFilter {
            materialize_columns: self
                .materialize_columns
                .as_ref()
                .map(|columns| columns.iter().copied().collect()),
            from_row_index: self.from_row_index,
            to_row_index: self.to_row_index,
            predicate: self.predicate.clone(),
        })
    }
}

/// Validates predicate leaves against a layout.
struct LayoutCheck<'a> {
    layout: &'a TableLayout,
}

impl PredicateVisitor for LayoutCheck<'_> {
    type Value = ();
    type Error = TableError;

    fn visit_leaf(&mut self, _original: &Predicate, leaf: &PredicateLeaf) -> Result<(), TableError> {
        let ColumnRef::Indexed(column) = leaf.column() else {
            return Ok(());
        };
        let index = column.index();
        match self.layout.cell_type(index) {
            None => Err(TableError::invalid_column(
                index,
                format!("layout has {} columns", self.layout.width()),
            )),
            Some(declared) if declared != column.cell_type() => Err(TableError::invalid_column(
                index,
                format!(
                    "predicate expects {}, column holds {declared}",
                    column.cell_type()
                ),
            )),
            Some(_) => Ok(()),
        }
    }

    fn visit_not(&mut self, _original: &Predicate, child: &Predicate) -> Result<(), TableError> {
        child.accept(self)
    }

    fn visit_and(
        &mut self,
        _original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<(), TableError> {
        left.accept(self)?;
        right.accept(self)
    }

    fn visit_or(
        &mut self,
        _original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<(), TableError> {
        left.accept(self)?;
        right.accept(self)
    }
}
