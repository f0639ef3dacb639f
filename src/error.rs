use tessera_predicate::{CellType, PredicateError, RowKey};
use thiserror::Error;

/// Errors raised by table construction, filter construction and iteration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A column position does not exist in the layout it is applied to.
    #[error("invalid column {index}: {reason}")]
    InvalidColumn {
        /// Offending position.
        index: usize,
        /// Why the position was rejected.
        reason: String,
    },
    /// A row range with `from > to`.
    #[error("invalid row range [{from}, {to}]")]
    InvalidRange {
        /// First requested row.
        from: u64,
        /// Last requested row.
        to: u64,
    },
    /// `next` was called on an iterator without remaining rows.
    #[error("row iterator exhausted")]
    Exhausted,
    /// Joined delegates disagree at the same positional offset.
    #[error("inconsistent join: {0}")]
    InconsistentJoin(String),
    /// Delegates that must share a layout do not.
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),
    /// A layout names the same column twice.
    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),
    /// A row does not fit the layout of the table receiving it.
    #[error("row {key} does not fit layout: {reason}")]
    SchemaMismatch {
        /// Key of the rejected row.
        key: RowKey,
        /// Why the row was rejected.
        reason: String,
    },
    /// A row key was added twice to the same table.
    #[error("duplicate row key {0}")]
    DuplicateRowKey(RowKey),
    /// A stored row frame failed validation.
    #[error("corrupt row buffer: {0}")]
    Corrupt(&'static str),
    /// Predicate construction, remapping or evaluation failed.
    #[error("predicate error: {0}")]
    Predicate(#[from] PredicateError),
}

impl TableError {
    pub(crate) fn invalid_column(index: usize, reason: impl Into<String>) -> Self {
        TableError::InvalidColumn {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn cell_type_mismatch(
        key: &RowKey,
        index: usize,
        expected: CellType,
        actual: Option<CellType>,
    ) -> Self {
        TableError::SchemaMismatch {
            key: key.clone(),
            reason: format!(
                "cell {index} holds {}, column type is {expected}",
                actual.map_or("missing", CellType::as_str)
            ),
        }
    }
}
