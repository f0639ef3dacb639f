use std::{cmp::Ordering, collections::BTreeSet, fmt, ops, sync::Arc};

use super::{Cell, ColumnRef, PredicateError};

/// User function evaluated against a present cell.
pub type CustomFn = Arc<dyn Fn(&Cell) -> Result<bool, PredicateError> + Send + Sync>;

/// Comparison operator used by comparison leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equals (`=`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal to (`<=`).
    LessThanOrEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal to (`>=`).
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }

    /// Returns true when the operator needs an ordered value type.
    #[must_use]
    pub fn requires_ordering(self) -> bool {
        !matches!(self, ComparisonOp::Equal | ComparisonOp::NotEqual)
    }

    /// Evaluates the operator against a comparison ordering.
    #[must_use]
    pub fn test_ordering(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal predicate reading a single column.
#[derive(Clone)]
pub enum PredicateLeaf {
    /// Comparison of the cell against a literal.
    Compare {
        /// Column under inspection.
        column: ColumnRef,
        /// Operator.
        op: ComparisonOp,
        /// Literal right-hand side, typed like the column.
        literal: Cell,
    },
    /// Missing-value test.
    Missing {
        /// Column under inspection.
        column: ColumnRef,
    },
    /// User-supplied boolean function over the cell value.
    Custom {
        /// Column under inspection.
        column: ColumnRef,
        /// Function applied to present cells.
        func: CustomFn,
    },
}

impl PredicateLeaf {
    /// Column read by this leaf.
    #[must_use]
    pub fn column(&self) -> &ColumnRef {
        match self {
            PredicateLeaf::Compare { column, .. }
            | PredicateLeaf::Missing { column }
            | PredicateLeaf::Custom { column, .. } => column,
        }
    }

    /// Copy of this leaf reading `column` instead.
    #[must_use]
    pub fn with_column(&self, column: ColumnRef) -> Self {
        match self {
            PredicateLeaf::Compare { op, literal, .. } => PredicateLeaf::Compare {
                column,
                op: *op,
                literal: literal.clone(),
            },
            PredicateLeaf::Missing { .. } => PredicateLeaf::Missing { column },
            PredicateLeaf::Custom { func, .. } => PredicateLeaf::Custom {
                column,
                func: Arc::clone(func),
            },
        }
    }
}

impl PartialEq for PredicateLeaf {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                PredicateLeaf::Compare {
                    column: lc,
                    op: lo,
                    literal: ll,
                },
                PredicateLeaf::Compare {
                    column: rc,
                    op: ro,
                    literal: rl,
                },
            ) => lc == rc && lo == ro && ll == rl,
            (PredicateLeaf::Missing { column: lc }, PredicateLeaf::Missing { column: rc }) => {
                lc == rc
            }
            (
                PredicateLeaf::Custom {
                    column: lc,
                    func: lf,
                },
                PredicateLeaf::Custom {
                    column: rc,
                    func: rf,
                },
            ) => lc == rc && Arc::ptr_eq(lf, rf),
            _ => false,
        }
    }
}

impl fmt::Debug for PredicateLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateLeaf::Compare {
                column,
                op,
                literal,
            } => f
                .debug_struct("Compare")
                .field("column", column)
                .field("op", op)
                .field("literal", literal)
                .finish(),
            PredicateLeaf::Missing { column } => {
                f.debug_struct("Missing").field("column", column).finish()
            }
            PredicateLeaf::Custom { column, .. } => f
                .debug_struct("Custom")
                .field("column", column)
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Display for PredicateLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateLeaf::Compare {
                column,
                op,
                literal,
            } => write!(f, "{column} {op} {literal}"),
            PredicateLeaf::Missing { column } => write!(f, "{column} IS MISSING"),
            PredicateLeaf::Custom { column, .. } => write!(f, "custom({column})"),
        }
    }
}

/// Node of a predicate tree.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateNode {
    /// Leaf reading one column.
    Leaf(PredicateLeaf),
    /// Logical negation.
    Not(Predicate),
    /// Conjunction; the left side evaluates first.
    And(Predicate, Predicate),
    /// Disjunction; the left side evaluates first.
    Or(Predicate, Predicate),
}

/// Immutable boolean expression over the columns of a row.
///
/// Cloning is cheap: subtrees are shared, and every rewrite builds a new tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    kind: Arc<PredicateNode>,
}

impl Predicate {
    /// Returns a reference to the underlying node.
    #[must_use]
    pub fn kind(&self) -> &PredicateNode {
        &self.kind
    }

    /// Builds a predicate directly from a leaf.
    #[must_use]
    pub fn from_leaf(leaf: PredicateLeaf) -> Self {
        Self::from_node(PredicateNode::Leaf(leaf))
    }

    /// Builds a predicate directly from a node.
    #[must_use]
    pub fn from_node(node: PredicateNode) -> Self {
        Self {
            kind: Arc::new(node),
        }
    }

    /// Untyped comparison constructor.
    ///
    /// # Errors
    ///
    /// [`PredicateError::InvalidPredicate`] when `op` needs an ordering the
    /// column type lacks, or when `literal` is missing or typed differently
    /// from the column.
    pub fn compare(
        column: ColumnRef,
        op: ComparisonOp,
        literal: impl Into<Cell>,
    ) -> Result<Self, PredicateError> {
        let literal = literal.into();
        let cell_type = column.cell_type();
        if op.requires_ordering() && !cell_type.is_orderable() {
            return Err(PredicateError::InvalidPredicate(format!(
                "operator {op} requires an ordered type, column {column} holds {cell_type}"
            )));
        }
        match literal.cell_type() {
            Some(actual) if actual == cell_type => {}
            Some(actual) => {
                return Err(PredicateError::InvalidPredicate(format!(
                    "literal of type {actual} cannot be compared with column {column} of type \
                     {cell_type}"
                )));
            }
            None => {
                return Err(PredicateError::InvalidPredicate(format!(
                    "missing literal compared with column {column}; use a missing-value test"
                )));
            }
        }
        Ok(Self::from_leaf(PredicateLeaf::Compare {
            column,
            op,
            literal,
        }))
    }

    /// Missing-value test over an untyped column reference.
    #[must_use]
    pub fn missing(column: ColumnRef) -> Self {
        Self::from_leaf(PredicateLeaf::Missing { column })
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Self::from_node(PredicateNode::And(self, other))
    }

    /// Disjunction of `self` and `other`.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        Self::from_node(PredicateNode::Or(self, other))
    }

    /// Returns the sorted set of layout positions referenced by the tree.
    #[must_use]
    pub fn columns(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    /// Returns true when any leaf reads the row key.
    #[must_use]
    pub fn references_row_key(&self) -> bool {
        match self.kind() {
            PredicateNode::Leaf(leaf) => matches!(leaf.column(), ColumnRef::RowKey),
            PredicateNode::Not(child) => child.references_row_key(),
            PredicateNode::And(left, right) | PredicateNode::Or(left, right) => {
                left.references_row_key() || right.references_row_key()
            }
        }
    }

    fn collect_columns(&self, out: &mut BTreeSet<usize>) {
        match self.kind() {
            PredicateNode::Leaf(leaf) => {
                if let Some(index) = leaf.column().index() {
                    out.insert(index);
                }
            }
            PredicateNode::Not(child) => child.collect_columns(out),
            PredicateNode::And(left, right) | PredicateNode::Or(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }
}

impl ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        Predicate::from_node(PredicateNode::Not(self))
    }
}

/// Logical negation of `predicate`.
#[must_use]
pub fn not(predicate: Predicate) -> Predicate {
    !predicate
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PredicateNode::Leaf(leaf) => write!(f, "{leaf}"),
            PredicateNode::Not(child) => write!(f, "NOT {child}"),
            PredicateNode::And(left, right) => write!(f, "({left} AND {right})"),
            PredicateNode::Or(left, right) => write!(f, "({left} OR {right})"),
        }
    }
}
