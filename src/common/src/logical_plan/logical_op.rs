use crate::{Column, Field};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Operation;

/// A bound selection predicate. The shape decides which physical filter
/// the plan compiler emits.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Predicate {
    /// Two dynamic columns compared for equality (a join condition).
    ColumnEq(Column, Column),
    /// One column compared against a typed constant.
    ConstEq(Column, Field),
}

impl Predicate {
    /// The columns this predicate references.
    pub fn requires(&self) -> Vec<Column> {
        match self {
            Predicate::ColumnEq(l, r) => vec![l.clone(), r.clone()],
            Predicate::ConstEq(c, _) => vec![c.clone()],
        }
    }
}

/// Sort direction for one sort key.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// One sort key: a column plus its direction.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SortCriterion {
    pub column: Column,
    pub order: SortOrder,
}

/// Source node. A leaf that provides the columns of one named relation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceNode {
    /// Name of the relation being read.
    pub name: String,
    /// Columns the relation exposes, in schema order.
    pub provides: Vec<Column>,
}

/// Selection node. Passes through the rows of its child that satisfy the
/// predicate; requires the columns the predicate references.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SelectionNode {
    pub child: Box<Operation>,
    /// Columns the predicate references. May be empty while the predicate
    /// is still unbound.
    pub requires: Vec<Column>,
    /// The bound predicate, if any. `clone_with` preserves it verbatim.
    pub predicate: Option<Predicate>,
}

/// Projection node. Both needs and exposes exactly its column list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectionNode {
    pub child: Box<Operation>,
    pub columns: Vec<Column>,
}

/// Shape shared by the two-child operations: Product, Union, Intersection
/// and Difference.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BinaryNode {
    pub lhs: Box<Operation>,
    pub rhs: Box<Operation>,
}

/// Distinct node.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UnaryNode {
    pub child: Box<Operation>,
}

/// Sort node. Carries the criteria the plan compiler translates into a
/// physical sort; requires nothing from its child beyond what it provides.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SortNode {
    pub child: Box<Operation>,
    pub criteria: Vec<SortCriterion>,
}
