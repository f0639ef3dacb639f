use super::{Predicate, PredicateLeaf, PredicateNode};

/// Visitor dispatched over the closed set of predicate nodes.
///
/// Branch callbacks receive their children unvisited; each visitor decides
/// whether and in which order to descend.
pub trait PredicateVisitor {
    /// Result produced for each visited node.
    type Value;
    /// Error type used when visiting fails.
    type Error;

    /// Visits a leaf.
    fn visit_leaf(
        &mut self,
        original: &Predicate,
        leaf: &PredicateLeaf,
    ) -> Result<Self::Value, Self::Error>;

    /// Visits a negation.
    fn visit_not(
        &mut self,
        original: &Predicate,
        child: &Predicate,
    ) -> Result<Self::Value, Self::Error>;

    /// Visits a conjunction.
    fn visit_and(
        &mut self,
        original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<Self::Value, Self::Error>;

    /// Visits a disjunction.
    fn visit_or(
        &mut self,
        original: &Predicate,
        left: &Predicate,
        right: &Predicate,
    ) -> Result<Self::Value, Self::Error>;

    /// Dispatches on the node kind of `predicate`.
    fn visit_predicate(&mut self, predicate: &Predicate) -> Result<Self::Value, Self::Error> {
        match predicate.kind() {
            PredicateNode::Leaf(leaf) => self.visit_leaf(predicate, leaf),
            PredicateNode::Not(child) => self.visit_not(predicate, child),
            PredicateNode::And(left, right) => self.visit_and(predicate, left, right),
            PredicateNode::Or(left, right) => self.visit_or(predicate, left, right),
        }
    }
}

impl Predicate {
    /// Accepts a visitor at the root of this tree.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<V::Value, V::Error>
    where
        V: PredicateVisitor + ?Sized,
    {
        visitor.visit_predicate(self)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::core::{int_col, long_col, not};

    /// Counts nodes by kind.
    #[derive(Default)]
    struct ShapeCounter {
        leaves: usize,
        nots: usize,
        ands: usize,
        ors: usize,
    }

    impl PredicateVisitor for ShapeCounter {
        type Value = ();
        type Error = Infallible;

        fn visit_leaf(&mut self, _: &Predicate, _: &PredicateLeaf) -> Result<(), Infallible> {
            self.leaves += 1;
            Ok(())
        }

        fn visit_not(&mut self, _: &Predicate, child: &Predicate) -> Result<(), Infallible> {
            self.nots += 1;
            child.accept(self)
        }

        fn visit_and(
            &mut self,
            _: &Predicate,
            left: &Predicate,
            right: &Predicate,
        ) -> Result<(), Infallible> {
            self.ands += 1;
            left.accept(self)?;
            right.accept(self)
        }

        fn visit_or(
            &mut self,
            _: &Predicate,
            left: &Predicate,
            right: &Predicate,
        ) -> Result<(), Infallible> {
            self.ors += 1;
            left.accept(self)?;
            right.accept(self)
        }
    }

    #[test]
    fn dispatch_reaches_every_node() {
        let predicate = int_col(0)
            .equal(1)
            .and(not(long_col(1).missing()))
            .or(int_col(2).custom(|_| true));
        let mut counter = ShapeCounter::default();
        predicate.accept(&mut counter).expect("infallible");
        assert_eq!(counter.leaves, 3);
        assert_eq!(counter.nots, 1);
        assert_eq!(counter.ands, 1);
        assert_eq!(counter.ors, 1);
    }
}
