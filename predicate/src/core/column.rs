use std::{fmt, marker::PhantomData, sync::Arc};

use super::{Cell, CellType, ComparisonOp, CustomFn, Predicate, PredicateError, PredicateLeaf};

/// Column reference bound to a concrete position in a table layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexedColumn {
    index: usize,
    cell_type: CellType,
}

impl IndexedColumn {
    /// Creates a reference to the column at `index` holding `cell_type` values.
    #[must_use]
    pub const fn new(index: usize, cell_type: CellType) -> Self {
        Self { index, cell_type }
    }

    /// Position of the column in its layout.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Value type the predicate expects to find at this position.
    #[must_use]
    pub const fn cell_type(&self) -> CellType {
        self.cell_type
    }

    #[must_use]
    pub(crate) const fn with_index(self, index: usize) -> Self {
        Self { index, ..self }
    }
}

/// Reference identifying the column a predicate leaf reads.
///
/// The row key is not tied to any layout position, so it survives every
/// column rearrangement unchanged. Indexed references are rewritten by
/// [`IndexMapper`](super::IndexMapper).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// The row key, read as a `Utf8` value.
    RowKey,
    /// A positional cell.
    Indexed(IndexedColumn),
}

impl ColumnRef {
    /// Creates an indexed reference.
    #[must_use]
    pub const fn indexed(index: usize, cell_type: CellType) -> Self {
        Self::Indexed(IndexedColumn::new(index, cell_type))
    }

    /// Value type produced by the referenced column.
    #[must_use]
    pub const fn cell_type(&self) -> CellType {
        match self {
            ColumnRef::RowKey => CellType::Utf8,
            ColumnRef::Indexed(column) => column.cell_type(),
        }
    }

    /// Layout position, `None` for the row key.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            ColumnRef::RowKey => None,
            ColumnRef::Indexed(column) => Some(column.index()),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::RowKey => f.write_str("<key>"),
            ColumnRef::Indexed(column) => write!(f, "#{}", column.index()),
        }
    }
}

/// Native Rust type that a column stores.
pub trait ColumnValue: Sized + Send + Sync + 'static {
    /// Declared cell type for columns of this value.
    const CELL_TYPE: CellType;

    /// Wraps the value into a cell.
    fn into_cell(self) -> Cell;

    /// Extracts the value, `None` when the cell carries another type.
    fn from_cell(cell: &Cell) -> Option<Self>;
}

/// Marker for values with a total order; gates the ordering comparisons.
pub trait OrderedValue: ColumnValue {}

macro_rules! column_value {
    ($native:ty, $cell_type:ident, $variant:ident) => {
        impl ColumnValue for $native {
            const CELL_TYPE: CellType = CellType::$cell_type;

            fn into_cell(self) -> Cell {
                Cell::$variant(self)
            }

            fn from_cell(cell: &Cell) -> Option<Self> {
                match cell {
                    Cell::$variant(value) => Some(*value),
                    _ => None,
                }
            }
        }
    };
}

column_value!(i32, Int32, Int32);
column_value!(i64, Int64, Int64);
column_value!(f64, Float64, Float64);
column_value!(bool, Boolean, Boolean);

impl ColumnValue for String {
    const CELL_TYPE: CellType = CellType::Utf8;

    fn into_cell(self) -> Cell {
        Cell::from(self)
    }

    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Utf8(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl OrderedValue for i32 {}
impl OrderedValue for i64 {}
impl OrderedValue for f64 {}
impl OrderedValue for String {}

/// Typed handle used to declare predicates over a column.
pub struct Column<T> {
    column: ColumnRef,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.column).finish()
    }
}

impl<T: ColumnValue> Column<T> {
    /// Typed handle for the column at `index`.
    #[must_use]
    pub const fn at(index: usize) -> Self {
        Self {
            column: ColumnRef::indexed(index, T::CELL_TYPE),
            _value: PhantomData,
        }
    }

    /// Untyped reference behind this handle.
    #[must_use]
    pub const fn column_ref(&self) -> ColumnRef {
        self.column
    }

    fn compare(self, op: ComparisonOp, value: T) -> Predicate {
        Predicate::from_leaf(PredicateLeaf::Compare {
            column: self.column,
            op,
            literal: value.into_cell(),
        })
    }

    /// Matches rows whose cell equals `value`.
    #[must_use]
    pub fn equal(self, value: impl Into<T>) -> Predicate {
        self.compare(ComparisonOp::Equal, value.into())
    }

    /// Matches rows whose cell is present and differs from `value`.
    #[must_use]
    pub fn not_equal(self, value: impl Into<T>) -> Predicate {
        self.compare(ComparisonOp::NotEqual, value.into())
    }

    /// Matches rows whose cell is missing.
    #[must_use]
    pub fn missing(self) -> Predicate {
        Predicate::from_leaf(PredicateLeaf::Missing {
            column: self.column,
        })
    }

    /// Matches rows for which `func` returns true on the cell value.
    ///
    /// Missing cells never match and `func` is not called for them. A cell of
    /// another runtime type fails evaluation with
    /// [`PredicateError::TypeMismatch`].
    #[must_use]
    pub fn custom<F>(self, func: F) -> Predicate
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let column = self.column;
        let func: CustomFn = Arc::new(move |cell: &Cell| match T::from_cell(cell) {
            Some(value) => Ok(func(&value)),
            None => Err(PredicateError::TypeMismatch {
                column: column.to_string(),
                expected: T::CELL_TYPE,
                actual: cell.cell_type().unwrap_or(T::CELL_TYPE),
            }),
        });
        Predicate::from_leaf(PredicateLeaf::Custom { column, func })
    }
}

impl<T: OrderedValue> Column<T> {
    /// Matches rows whose cell is `< value`.
    #[must_use]
    pub fn lesser_than(self, value: impl Into<T>) -> Predicate {
        self.compare(ComparisonOp::LessThan, value.into())
    }

    /// Matches rows whose cell is `<= value`.
    #[must_use]
    pub fn lesser_or_equal(self, value: impl Into<T>) -> Predicate {
        self.compare(ComparisonOp::LessThanOrEqual, value.into())
    }

    /// Matches rows whose cell is `> value`.
    #[must_use]
    pub fn greater_than(self, value: impl Into<T>) -> Predicate {
        self.compare(ComparisonOp::GreaterThan, value.into())
    }

    /// Matches rows whose cell is `>= value`.
    #[must_use]
    pub fn greater_or_equal(self, value: impl Into<T>) -> Predicate {
        self.compare(ComparisonOp::GreaterThanOrEqual, value.into())
    }
}

/// `Int32` column at `index`.
#[must_use]
pub const fn int_col(index: usize) -> Column<i32> {
    Column::at(index)
}

/// `Int64` column at `index`.
#[must_use]
pub const fn long_col(index: usize) -> Column<i64> {
    Column::at(index)
}

/// `Float64` column at `index`.
#[must_use]
pub const fn double_col(index: usize) -> Column<f64> {
    Column::at(index)
}

/// `Utf8` column at `index`.
#[must_use]
pub const fn string_col(index: usize) -> Column<String> {
    Column::at(index)
}

/// `Boolean` column at `index`.
#[must_use]
pub const fn bool_col(index: usize) -> Column<bool> {
    Column::at(index)
}

/// The row key, compared as a string.
#[must_use]
pub const fn row_key() -> Column<String> {
    Column {
        column: ColumnRef::RowKey,
        _value: PhantomData,
    }
}
