//! Column layouts and the rows stored under them.

use std::{collections::HashSet, fmt, sync::Arc};

use tessera_predicate::{Cell, CellSource, CellType, RowKey};

use crate::error::TableError;

/// Name and value type of one column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    name: Arc<str>,
    cell_type: CellType,
}

impl ColumnSpec {
    /// Creates a column named `name` holding `cell_type` values.
    pub fn new(name: impl Into<Arc<str>>, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            cell_type,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.cell_type)
    }
}

/// Ordered, immutable sequence of columns.
///
/// Positions are the addressing scheme of filters and predicates. A layout
/// never renumbers its columns; rearranging produces a new layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableLayout {
    columns: Arc<[ColumnSpec]>,
}

impl TableLayout {
    /// Creates a layout from `columns` in order.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateColumn`] when two columns share a name.
    pub fn new<I>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = ColumnSpec>,
    {
        let columns: Arc<[ColumnSpec]> = columns.into_iter().collect();
        let mut names = HashSet::with_capacity(columns.len());
        for column in columns.iter() {
            if !names.insert(column.name()) {
                return Err(TableError::DuplicateColumn(column.name().to_string()));
            }
        }
        Ok(Self { columns })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Every column in positional order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Column at `index`.
    pub fn column(&self, index: usize) -> Option<&ColumnSpec> {
        self.columns.get(index)
    }

    /// Declared type of the column at `index`.
    pub fn cell_type(&self, index: usize) -> Option<CellType> {
        self.column(index).map(ColumnSpec::cell_type)
    }

    /// Position of the column named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    /// Layout holding the columns of `self` followed by those of `other`.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateColumn`] when a name appears on both sides.
    pub fn join(&self, other: &TableLayout) -> Result<Self, TableError> {
        Self::new(self.columns.iter().chain(other.columns.iter()).cloned())
    }

    /// Layout holding the columns at `indices`, in that order.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidColumn`] for a position past the layout, and
    /// [`TableError::DuplicateColumn`] when a position repeats.
    pub fn select(&self, indices: &[usize]) -> Result<Self, TableError> {
        let columns = indices
            .iter()
            .map(|&index| {
                self.column(index).cloned().ok_or_else(|| {
                    TableError::invalid_column(index, format!("layout has {} columns", self.width()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns)
    }

    /// Checks that `row` carries one cell per column, each fitting the
    /// declared type.
    ///
    /// # Errors
    ///
    /// [`TableError::SchemaMismatch`] describing the first disagreement.
    pub fn check_row(&self, row: &Row) -> Result<(), TableError> {
        if row.width() != self.width() {
            return Err(TableError::SchemaMismatch {
                key: row.key().clone(),
                reason: format!("{} cells for {} columns", row.width(), self.width()),
            });
        }
        for (index, (cell, column)) in row.cells().iter().zip(self.columns.iter()).enumerate() {
            if !cell.fits(column.cell_type()) {
                return Err(TableError::cell_type_mismatch(
                    row.key(),
                    index,
                    column.cell_type(),
                    cell.cell_type(),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}")?;
        }
        f.write_str("]")
    }
}

/// Row key plus an ordered sequence of cells.
///
/// Rows yielded by a filtered iterator hold exactly the filter's output
/// columns, in ascending layout order.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    key: RowKey,
    cells: Vec<Cell>,
}

impl Row {
    /// Creates a row.
    pub fn new(key: impl Into<RowKey>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    /// Row key.
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// Cells in order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `index` within this row.
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Number of cells.
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Splits the row into key and cells.
    pub fn into_parts(self) -> (RowKey, Vec<Cell>) {
        (self.key, self.cells)
    }
}

impl CellSource for Row {
    fn key(&self) -> &RowKey {
        &self.key
    }

    fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}
