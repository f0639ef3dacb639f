//! Builder for composing predicate trees from many clauses.

use super::{Predicate, PredicateNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

/// Folds any number of clauses into a left-deep binary tree.
///
/// `PredicateBuilder::and().predicate(a).predicate(b).predicate(c)` builds
/// `((a AND b) AND c)`, so clauses evaluate in insertion order.
#[derive(Debug)]
pub struct PredicateBuilder {
    connective: Connective,
    clauses: Vec<Predicate>,
}

impl PredicateBuilder {
    const fn new(connective: Connective) -> Self {
        Self {
            connective,
            clauses: Vec::new(),
        }
    }

    /// Builder joining its clauses with `AND`.
    #[must_use]
    pub fn and() -> Self {
        Self::new(Connective::And)
    }

    /// Builder joining its clauses with `OR`.
    #[must_use]
    pub fn or() -> Self {
        Self::new(Connective::Or)
    }

    /// Appends `predicate` as the next clause.
    #[must_use]
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.clauses.push(predicate);
        self
    }

    /// Adds every predicate yielded by `predicates`.
    #[must_use]
    pub fn predicates<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        self.clauses.extend(predicates);
        self
    }

    fn group<F>(self, nested: PredicateBuilder, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        match build(nested).build() {
            Some(predicate) => self.predicate(predicate),
            None => self,
        }
    }

    /// Appends the `AND` group `build` fills in.
    #[must_use]
    pub fn and_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        self.group(PredicateBuilder::and(), build)
    }

    /// Appends the `OR` group `build` fills in.
    #[must_use]
    pub fn or_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        self.group(PredicateBuilder::or(), build)
    }

    /// Appends the negated `AND` group `build` fills in.
    #[must_use]
    pub fn not_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        match build(PredicateBuilder::and()).build() {
            Some(predicate) => self.predicate(!predicate),
            None => self,
        }
    }

    /// Consumes the builder and returns the composed predicate, `None` when
    /// no clause was added.
    #[must_use]
    pub fn build(self) -> Option<Predicate> {
        let connective = self.connective;
        self.clauses.into_iter().reduce(|acc, clause| {
            Predicate::from_node(match connective {
                Connective::And => PredicateNode::And(acc, clause),
                Connective::Or => PredicateNode::Or(acc, clause),
            })
        })
    }
}
