use std::borrow::Cow;

use super::{
    Cell, ColumnRef, Predicate, PredicateError, PredicateLeaf, PredicateVisitor, RowKey,
};

/// Read access to the cells of a row under evaluation.
///
/// Positions are those of the layout the predicate was built against; a
/// source may expose only a subset of them.
pub trait CellSource {
    /// Key of the row.
    fn key(&self) -> &RowKey;

    /// Cell at layout position `index`, `None` when the row does not expose it.
    fn cell(&self, index: usize) -> Option<&Cell>;
}

/// Evaluates a predicate against one row.
///
/// Leaves over missing cells evaluate to false (except missing-value tests),
/// and conjunctions and disjunctions short-circuit on their left side.
pub struct Evaluator<'a, S: ?Sized> {
    row: &'a S,
}

impl<'a, S> Evaluator<'a, S>
where
    S: CellSource + ?Sized,
{
    /// Creates an evaluator over `row`.
    pub fn new(row: &'a S) -> Self {
        Self { row }
    }

    fn resolve(&self, column: &ColumnRef) -> Result<Cow<'a, Cell>, PredicateError> {
        match column {
            ColumnRef::RowKey => Ok(Cow::Owned(self.row.key().to_cell())),
            ColumnRef::Indexed(indexed) => self
                .row
                .cell(indexed.index())
                .map(Cow::Borrowed)
                .ok_or(PredicateError::UnavailableColumn(indexed.index())),
        }
    }
}

impl<S> PredicateVisitor for Evaluator<'_, S>
where
    S: CellSource + ?Sized,
{
    type Value = bool;
    type Error = PredicateError;

    fn visit_leaf(
        &mut self,
        _original: &Predicate,
        leaf: &PredicateLeaf,
    ) -> Result<bool, PredicateError> {
        let cell = self.resolve(leaf.column())?;
        match leaf {
            PredicateLeaf::Missing { .. } => Ok(cell.is_missing()),
            _ if cell.is_missing() => Ok(false),
            PredicateLeaf::Compare {
                column,
                op,
                literal,
            } => match cell.compare(literal) {
                Some(ordering) => Ok(op.test_ordering(ordering)),
                None => Err(PredicateError::TypeMismatch {
                    column: column.to_string(),
                    expected: column.cell_type(),
                    actual: cell.cell_type().unwrap_or(column.cell_type()),
                }),
            },
            PredicateLeaf::Custom { func, .. } => func(&*cell),
        }
    }

    fn visit_not(
        &mut self,
        _original: &Predicate,
        child: &Predicate,
    ) -> Result<bool, PredicateError> {
        Ok(!child.accept(self)?)
    }

    fn visit_and(
        &mut self,
        _original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<bool, PredicateError> {
        if !left.accept(self)? {
            return Ok(false);
        }
        right.accept(self)
    }

    fn visit_or(
        &mut self,
        _original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<bool, PredicateError> {
        if left.accept(self)? {
            return Ok(true);
        }
        right.accept(self)
    }
}

impl Predicate {
    /// Evaluates this predicate against `row`.
    ///
    /// # Errors
    ///
    /// [`PredicateError::TypeMismatch`] when a cell carries an unexpected
    /// runtime type, [`PredicateError::UnavailableColumn`] when `row` does
    /// not expose a referenced column.
    pub fn evaluate<S>(&self, row: &S) -> Result<bool, PredicateError>
    where
        S: CellSource + ?Sized,
    {
        self.accept(&mut Evaluator::new(row))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::core::{
        bool_col, double_col, int_col, long_col, row_key, string_col, CellType, Column,
    };

    struct TestRow {
        key: RowKey,
        cells: Vec<Cell>,
    }

    impl CellSource for TestRow {
        fn key(&self) -> &RowKey {
            &self.key
        }

        fn cell(&self, index: usize) -> Option<&Cell> {
            self.cells.get(index)
        }
    }

    fn row(i: i32) -> TestRow {
        TestRow {
            key: RowKey::new(i.to_string()),
            cells: vec![
                Cell::Int32(i),
                Cell::from(i.to_string()),
                Cell::Int64(i64::from(i)),
                Cell::Float64(f64::from(i)),
                Cell::Boolean(i % 2 == 1),
            ],
        }
    }

    #[test]
    fn comparisons_cover_every_operator() {
        let r = row(5);
        assert!(int_col(0).equal(5).evaluate(&r).unwrap());
        assert!(int_col(0).not_equal(4).evaluate(&r).unwrap());
        assert!(long_col(2).lesser_than(6).evaluate(&r).unwrap());
        assert!(long_col(2).lesser_or_equal(5).evaluate(&r).unwrap());
        assert!(double_col(3).greater_than(4.5).evaluate(&r).unwrap());
        assert!(double_col(3).greater_or_equal(5.0).evaluate(&r).unwrap());
        assert!(string_col(1).equal("5").evaluate(&r).unwrap());
        assert!(bool_col(4).equal(true).evaluate(&r).unwrap());
        assert!(row_key().greater_than("4").evaluate(&r).unwrap());
    }

    #[test]
    fn missing_cells_never_match_comparisons() {
        let mut r = row(5);
        r.cells[0] = Cell::Missing;
        assert!(!int_col(0).equal(5).evaluate(&r).unwrap());
        assert!(!int_col(0).not_equal(5).evaluate(&r).unwrap());
        assert!(!int_col(0).custom(|_| true).evaluate(&r).unwrap());
        assert!(int_col(0).missing().evaluate(&r).unwrap());
        assert!(!int_col(1).missing().evaluate(&r).unwrap());
        assert!((!int_col(0).equal(5)).evaluate(&r).unwrap());
    }

    #[test]
    fn and_or_short_circuit_on_left() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            int_col(0).custom(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            })
        };
        let r = row(3);

        let and = int_col(0).equal(99).and(counted.clone());
        assert!(!and.evaluate(&r).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let or = int_col(0).equal(3).or(counted.clone());
        assert!(or.evaluate(&r).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let or = int_col(0).equal(99).or(counted);
        assert!(or.evaluate(&r).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn custom_on_foreign_type_is_type_mismatch() {
        let predicate = Column::<i64>::at(1).custom(|v| *v > 0);
        let err = predicate.evaluate(&row(1)).expect_err("utf8 cell under int64 predicate");
        assert_eq!(
            err,
            PredicateError::TypeMismatch {
                column: "#1".to_string(),
                expected: CellType::Int64,
                actual: CellType::Utf8,
            }
        );
    }

    #[test]
    fn comparison_on_foreign_type_is_type_mismatch() {
        let err = bool_col(0)
            .equal(true)
            .evaluate(&row(1))
            .expect_err("int cell under boolean predicate");
        assert!(matches!(err, PredicateError::TypeMismatch { .. }));
    }

    #[test]
    fn unavailable_column_is_reported() {
        let err = int_col(9).equal(1).evaluate(&row(1)).expect_err("no column 9");
        assert_eq!(err, PredicateError::UnavailableColumn(9));
    }
}
