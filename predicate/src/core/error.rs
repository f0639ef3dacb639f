use thiserror::Error;

use super::CellType;

/// Errors raised while building, remapping or evaluating predicates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// The predicate cannot be expressed over the given column.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),
    /// An index map is shorter than a referenced column position.
    #[error("column index {index} out of range for index map of length {len}")]
    IndexOutOfRange {
        /// Referenced column position.
        index: usize,
        /// Length of the index map.
        len: usize,
    },
    /// An index map has no target position for a referenced column.
    #[error("column index {0} has no target in index map")]
    UnmappedColumn(usize),
    /// A cell did not carry the type a predicate expected.
    #[error("type mismatch for column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Textual form of the referenced column.
        column: String,
        /// Type declared by the predicate.
        expected: CellType,
        /// Runtime type of the cell.
        actual: CellType,
    },
    /// The evaluated row does not expose a referenced column.
    #[error("column index {0} is not available in the evaluated row")]
    UnavailableColumn(usize),
}
