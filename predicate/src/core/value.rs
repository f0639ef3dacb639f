use std::{cmp::Ordering, fmt, sync::Arc};

/// Declared value type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Boolean.
    Boolean,
}

impl CellType {
    /// Returns true when values of this type carry a total order.
    #[must_use]
    pub fn is_orderable(self) -> bool {
        !matches!(self, CellType::Boolean)
    }

    /// Returns a textual representation of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CellType::Int32 => "int32",
            CellType::Int64 => "int64",
            CellType::Float64 => "float64",
            CellType::Utf8 => "utf8",
            CellType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a row, unique within a table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Arc<str>);

impl RowKey {
    /// Creates a row key from any string-like value.
    #[must_use]
    pub fn new<K>(key: K) -> Self
    where
        K: Into<Arc<str>>,
    {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn to_cell(&self) -> Cell {
        Cell::Utf8(Arc::clone(&self.0))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A single typed value inside a row, or a missing value.
#[derive(Clone, Debug)]
pub enum Cell {
    /// Missing value; valid for every column type.
    Missing,
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Utf8(Arc<str>),
    /// Boolean.
    Boolean(bool),
}

impl Cell {
    /// Returns true for the missing value.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Runtime type of the cell, `None` for a missing value.
    #[must_use]
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            Cell::Missing => None,
            Cell::Int32(_) => Some(CellType::Int32),
            Cell::Int64(_) => Some(CellType::Int64),
            Cell::Float64(_) => Some(CellType::Float64),
            Cell::Utf8(_) => Some(CellType::Utf8),
            Cell::Boolean(_) => Some(CellType::Boolean),
        }
    }

    /// Returns true when this cell may be stored in a column of `cell_type`.
    #[must_use]
    pub fn fits(&self, cell_type: CellType) -> bool {
        self.cell_type().map_or(true, |actual| actual == cell_type)
    }

    /// Compares two present cells.
    ///
    /// Returns `None` when either side is missing or the runtime types are not
    /// comparable. 32- and 64-bit integers widen to 64 bits.
    #[must_use]
    pub fn compare(&self, other: &Cell) -> Option<Ordering> {
        use Cell::*;
        match (self, other) {
            (Missing, _) | (_, Missing) => None,
            (Int32(lhs), Int32(rhs)) => Some(lhs.cmp(rhs)),
            (Int64(lhs), Int64(rhs)) => Some(lhs.cmp(rhs)),
            (Int32(lhs), Int64(rhs)) => Some(i64::from(*lhs).cmp(rhs)),
            (Int64(lhs), Int32(rhs)) => Some(lhs.cmp(&i64::from(*rhs))),
            (Float64(lhs), Float64(rhs)) => Some(lhs.total_cmp(rhs)),
            (Utf8(lhs), Utf8(rhs)) => Some(lhs.cmp(rhs)),
            (Boolean(lhs), Boolean(rhs)) => Some(lhs.cmp(rhs)),
            _ => None,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Missing, Cell::Missing) => true,
            (Cell::Int32(_), Cell::Int64(_)) | (Cell::Int64(_), Cell::Int32(_)) => false,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => f.write_str("?"),
            Cell::Int32(value) => write!(f, "{value}"),
            Cell::Int64(value) => write!(f, "{value}"),
            Cell::Float64(value) => write!(f, "{value}"),
            Cell::Utf8(value) => write!(f, "{value:?}"),
            Cell::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Int32(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int64(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float64(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Boolean(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Utf8(Arc::from(value))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Utf8(Arc::from(value))
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}
