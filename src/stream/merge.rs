use crate::{
    error::TableError,
    layout::Row,
    stream::{pull_from, BoxRowIterator, RowSource},
};

/// Zips the rows of two row-aligned iterators, left cells first.
///
/// Both sides advance one row per pull; the keys of every pair must match.
pub(crate) struct MergeSource {
    left: BoxRowIterator,
    right: BoxRowIterator,
}

impl MergeSource {
    pub(crate) fn new(left: BoxRowIterator, right: BoxRowIterator) -> Self {
        Self { left, right }
    }
}

fn merge(left: Row, right: Row) -> Row {
    let (key, mut cells) = left.into_parts();
    let (_, right) = right.into_parts();
    cells.extend(right);
    Row::new(key, cells)
}

impl RowSource for MergeSource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        match (pull_from(&mut self.left)?, pull_from(&mut self.right)?) {
            (None, None) => Ok(None),
            (Some(left), Some(right)) if left.key() == right.key() => Ok(Some(merge(left, right))),
            (Some(left), Some(right)) => Err(TableError::InconsistentJoin(format!(
                "left row {} faces right row {}",
                left.key(),
                right.key()
            ))),
            (Some(row), None) | (None, Some(row)) => Err(TableError::InconsistentJoin(format!(
                "row {} has no counterpart in the other table",
                row.key()
            ))),
        }
    }

    fn release(&mut self) {
        self.left.close();
        self.right.close();
    }
}

#[cfg(test)]
mod tests {
    use tessera_predicate::Cell;

    use super::*;
    use crate::stream::{RowCursor, RowIterator};

    struct Listed {
        rows: std::vec::IntoIter<Row>,
    }

    impl RowSource for Listed {
        fn pull(&mut self) -> Result<Option<Row>, TableError> {
            Ok(self.rows.next())
        }
    }

    fn listed(keys: &[&str], value: i32) -> BoxRowIterator {
        let rows: Vec<Row> = keys
            .iter()
            .map(|key| Row::new(*key, vec![Cell::Int32(value)]))
            .collect();
        RowCursor::boxed(Listed {
            rows: rows.into_iter(),
        })
    }

    fn drain(source: MergeSource) -> Result<Vec<Row>, TableError> {
        RowCursor::new(source).rows().collect()
    }

    #[test]
    fn lockstep_concatenates_cells() {
        let rows = drain(MergeSource::new(
            listed(&["a", "b"], 1),
            listed(&["a", "b"], 2),
        ))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].key().as_str(), "b");
        assert_eq!(rows[1].cells(), &[Cell::Int32(1), Cell::Int32(2)]);
    }

    #[test]
    fn lockstep_key_mismatch_is_inconsistent() {
        let err = drain(MergeSource::new(
            listed(&["a", "b"], 1),
            listed(&["a", "c"], 2),
        ))
        .expect_err("b faces c");
        assert!(matches!(err, TableError::InconsistentJoin(_)));

        let err = drain(MergeSource::new(
            listed(&["a"], 1),
            listed(&["a", "b"], 2),
        ))
        .expect_err("right is longer");
        assert!(matches!(err, TableError::InconsistentJoin(_)));
    }

    #[test]
    fn swapped_keys_fail_at_their_position() {
        let rows: Vec<Result<Row, TableError>> = RowCursor::new(MergeSource::new(
            listed(&["a", "b", "c"], 1),
            listed(&["a", "c", "b"], 2),
        ))
        .rows()
        .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(TableError::InconsistentJoin(_))));
    }
}
