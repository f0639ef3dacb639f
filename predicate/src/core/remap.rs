//! Rewrites column positions inside predicate trees.

use super::{ColumnRef, Predicate, PredicateError, PredicateLeaf, PredicateNode, PredicateVisitor};

/// Maps the column currently at position `i` to its new position.
///
/// `None` marks a column that has no counterpart in the target layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexMap {
    targets: Vec<Option<usize>>,
}

impl IndexMap {
    /// Creates a map from explicit, possibly absent, targets.
    #[must_use]
    pub fn new(targets: Vec<Option<usize>>) -> Self {
        Self { targets }
    }

    /// Map sending every position in `0..len` to itself.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self::new((0..len).map(Some).collect())
    }

    /// Number of source positions covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true when the map covers no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// New position of the column at `index`.
    ///
    /// # Errors
    ///
    /// [`PredicateError::IndexOutOfRange`] when `index` is past the map, and
    /// [`PredicateError::UnmappedColumn`] when the column has no target.
    pub fn get(&self, index: usize) -> Result<usize, PredicateError> {
        match self.targets.get(index) {
            Some(Some(target)) => Ok(*target),
            Some(None) => Err(PredicateError::UnmappedColumn(index)),
            None => Err(PredicateError::IndexOutOfRange {
                index,
                len: self.targets.len(),
            }),
        }
    }

    /// Map sending every target back to its source.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let len = self
            .targets
            .iter()
            .flatten()
            .max()
            .map_or(0, |max| max + 1);
        let mut targets = vec![None; len];
        for (source, target) in self.targets.iter().enumerate() {
            if let Some(target) = target {
                targets[*target] = Some(source);
            }
        }
        Self { targets }
    }
}

impl From<Vec<usize>> for IndexMap {
    fn from(value: Vec<usize>) -> Self {
        Self::new(value.into_iter().map(Some).collect())
    }
}

impl From<&[usize]> for IndexMap {
    fn from(value: &[usize]) -> Self {
        Self::new(value.iter().copied().map(Some).collect())
    }
}

/// Visitor producing a copy of the predicate with every indexed leaf moved
/// through an [`IndexMap`]. The row key and the tree shape are untouched.
#[derive(Debug)]
pub struct IndexMapper<'a> {
    map: &'a IndexMap,
}

impl<'a> IndexMapper<'a> {
    /// Creates a mapper over `map`.
    #[must_use]
    pub fn new(map: &'a IndexMap) -> Self {
        Self { map }
    }
}

impl PredicateVisitor for IndexMapper<'_> {
    type Value = Predicate;
    type Error = PredicateError;

    fn visit_leaf(
        &mut self,
        original: &Predicate,
        leaf: &PredicateLeaf,
    ) -> Result<Predicate, PredicateError> {
        match leaf.column() {
            ColumnRef::RowKey => Ok(original.clone()),
            ColumnRef::Indexed(column) => {
                let target = self.map.get(column.index())?;
                if target == column.index() {
                    return Ok(original.clone());
                }
                let column = ColumnRef::Indexed(column.with_index(target));
                Ok(Predicate::from_leaf(leaf.with_column(column)))
            }
        }
    }

    fn visit_not(
        &mut self,
        _original: &Predicate,
        child: &Predicate,
    ) -> Result<Predicate, PredicateError> {
        Ok(!child.accept(self)?)
    }

    fn visit_and(
        &mut self,
        _original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<Predicate, PredicateError> {
        let left = left.accept(self)?;
        let right = right.accept(self)?;
        Ok(Predicate::from_node(PredicateNode::And(left, right)))
    }

    fn visit_or(
        &mut self,
        _original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<Predicate, PredicateError> {
        let left = left.accept(self)?;
        let right = right.accept(self)?;
        Ok(Predicate::from_node(PredicateNode::Or(left, right)))
    }
}

impl Predicate {
    /// Returns a copy of this predicate with positions rewritten by `map`.
    ///
    /// # Errors
    ///
    /// Propagates the lookup errors of [`IndexMap::get`] for referenced
    /// positions.
    pub fn remap(&self, map: &IndexMap) -> Result<Predicate, PredicateError> {
        self.accept(&mut IndexMapper::new(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{int_col, long_col, row_key, string_col};

    #[test]
    fn remap_moves_every_indexed_leaf() {
        let predicate = int_col(0)
            .greater_or_equal(10)
            .and(!long_col(2).missing())
            .or(string_col(1).equal("a"));
        let map = IndexMap::from(vec![2, 0, 1]);
        let remapped = predicate.remap(&map).expect("remap");
        assert_eq!(
            remapped.to_string(),
            "((#2 >= 10 AND NOT #1 IS MISSING) OR #0 = \"a\")"
        );
        // the source tree is untouched
        assert_eq!(
            predicate.to_string(),
            "((#0 >= 10 AND NOT #2 IS MISSING) OR #1 = \"a\")"
        );
    }

    #[test]
    fn remap_past_map_length_fails() {
        let predicate = int_col(0).equal(1).and(int_col(5).equal(2));
        let err = predicate
            .remap(&IndexMap::from(vec![1, 0]))
            .expect_err("index 5 is not covered");
        assert_eq!(err, PredicateError::IndexOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn remap_of_unmapped_column_fails() {
        let map = IndexMap::new(vec![Some(0), None]);
        let err = int_col(1).missing().remap(&map).expect_err("unmapped");
        assert_eq!(err, PredicateError::UnmappedColumn(1));
    }

    #[test]
    fn row_key_leaves_survive_any_map() {
        let predicate = row_key().equal("14");
        let remapped = predicate.remap(&IndexMap::default()).expect("no index used");
        assert_eq!(remapped, predicate);
    }

    #[test]
    fn inverse_undoes_permutation() {
        let map = IndexMap::from(vec![3, 0, 2, 1]);
        let inverse = map.inverse();
        assert_eq!(inverse, IndexMap::from(vec![1, 3, 2, 0]));
        let predicate = int_col(0).equal(1).and(int_col(3).equal(2));
        let round_trip = predicate
            .remap(&map)
            .and_then(|p| p.remap(&inverse))
            .expect("round trip");
        assert_eq!(round_trip, predicate);
    }

    #[test]
    fn identity_keeps_positions() {
        let map = IndexMap::identity(3);
        assert_eq!(map.len(), 3);
        assert_eq!(map, IndexMap::from(vec![0, 1, 2]));
        assert_eq!(map.inverse(), map);
        assert!(IndexMap::identity(0).is_empty());

        let predicate = int_col(2).lesser_than(4).or(string_col(1).missing());
        assert_eq!(predicate.remap(&map).expect("every column mapped"), predicate);
        assert_eq!(
            int_col(3).equal(1).remap(&map).expect_err("past identity"),
            PredicateError::IndexOutOfRange { index: 3, len: 3 }
        );
    }
}
