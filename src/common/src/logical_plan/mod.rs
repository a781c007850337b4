use crate::{Column, CsvqlError};
pub use logical_op::*;
use serde::{Deserialize, Serialize};
use std::fmt;
mod logical_op;

/// A logical query plan: an immutable tree of relational operations, each
/// owning its children by value.
///
/// Every node declares the columns it *provides* to its parent and the
/// columns it *requires* from its children. Constructors never validate
/// cross-tree consistency; a projection may require a column no descendant
/// provides, and the plan compiler reports that at compile time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Operation {
    Source(SourceNode),
    Selection(SelectionNode),
    Projection(ProjectionNode),
    Product(BinaryNode),
    Union(BinaryNode),
    Intersection(BinaryNode),
    Difference(BinaryNode),
    Distinct(UnaryNode),
    Sort(SortNode),
}

impl Operation {
    /// Creates a Source leaf for a named relation.
    pub fn source(name: &str, provides: Vec<Column>) -> Operation {
        Operation::Source(SourceNode {
            name: name.to_string(),
            provides,
        })
    }

    /// Creates a Selection with an explicit requires list and no bound
    /// predicate.
    pub fn selection(child: Operation, requires: Vec<Column>) -> Operation {
        Operation::Selection(SelectionNode {
            child: Box::new(child),
            requires,
            predicate: None,
        })
    }

    /// Creates a Selection with a bound predicate; the requires list is
    /// derived from the predicate's referenced columns.
    pub fn selection_with(child: Operation, predicate: Predicate) -> Operation {
        Operation::Selection(SelectionNode {
            child: Box::new(child),
            requires: predicate.requires(),
            predicate: Some(predicate),
        })
    }

    /// Creates a Projection onto the given column list.
    pub fn projection(child: Operation, columns: Vec<Column>) -> Operation {
        Operation::Projection(ProjectionNode {
            child: Box::new(child),
            columns,
        })
    }

    /// Creates a Product (cross product) of two subtrees.
    pub fn product(lhs: Operation, rhs: Operation) -> Operation {
        Operation::Product(BinaryNode {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Creates a Union of two subtrees. Union compatibility of the sides
    /// is not enforced here.
    pub fn union(lhs: Operation, rhs: Operation) -> Operation {
        Operation::Union(BinaryNode {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Creates an Intersection of two subtrees.
    pub fn intersection(lhs: Operation, rhs: Operation) -> Operation {
        Operation::Intersection(BinaryNode {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Creates a Difference of two subtrees.
    pub fn difference(lhs: Operation, rhs: Operation) -> Operation {
        Operation::Difference(BinaryNode {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Creates a Distinct over a subtree.
    pub fn distinct(child: Operation) -> Operation {
        Operation::Distinct(UnaryNode {
            child: Box::new(child),
        })
    }

    /// Creates a Sort over a subtree with the given criteria.
    pub fn sort(child: Operation, criteria: Vec<SortCriterion>) -> Operation {
        Operation::Sort(SortNode {
            child: Box::new(child),
            criteria,
        })
    }

    /// The variant name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Source(_) => "Source",
            Operation::Selection(_) => "Selection",
            Operation::Projection(_) => "Projection",
            Operation::Product(_) => "Product",
            Operation::Union(_) => "Union",
            Operation::Intersection(_) => "Intersection",
            Operation::Difference(_) => "Difference",
            Operation::Distinct(_) => "Distinct",
            Operation::Sort(_) => "Sort",
        }
    }

    /// The node's children, left to right.
    pub fn children(&self) -> Vec<&Operation> {
        match self {
            Operation::Source(_) => vec![],
            Operation::Selection(n) => vec![&n.child],
            Operation::Projection(n) => vec![&n.child],
            Operation::Product(n)
            | Operation::Union(n)
            | Operation::Intersection(n)
            | Operation::Difference(n) => vec![&n.lhs, &n.rhs],
            Operation::Distinct(n) => vec![&n.child],
            Operation::Sort(n) => vec![&n.child],
        }
    }

    /// Structural copy with the children replaced. Non-child payload (a
    /// selection's requires list and predicate, a projection's columns, a
    /// sort's criteria) is preserved verbatim.
    ///
    /// # Panics
    ///
    /// Panics if the replacement child count does not match the node's
    /// arity. This is an internal invariant violation; tree rewrites always
    /// pass back exactly the children they took.
    pub fn clone_with(&self, children: Vec<Operation>) -> Operation {
        match self {
            Operation::Source(n) => {
                Self::check_arity(self.name(), 0, &children);
                Operation::Source(n.clone())
            }
            Operation::Selection(n) => Operation::Selection(SelectionNode {
                child: Self::take_one(self.name(), children),
                requires: n.requires.clone(),
                predicate: n.predicate.clone(),
            }),
            Operation::Projection(n) => Operation::Projection(ProjectionNode {
                child: Self::take_one(self.name(), children),
                columns: n.columns.clone(),
            }),
            Operation::Product(_) => {
                let (lhs, rhs) = Self::take_two(self.name(), children);
                Operation::Product(BinaryNode { lhs, rhs })
            }
            Operation::Union(_) => {
                let (lhs, rhs) = Self::take_two(self.name(), children);
                Operation::Union(BinaryNode { lhs, rhs })
            }
            Operation::Intersection(_) => {
                let (lhs, rhs) = Self::take_two(self.name(), children);
                Operation::Intersection(BinaryNode { lhs, rhs })
            }
            Operation::Difference(_) => {
                let (lhs, rhs) = Self::take_two(self.name(), children);
                Operation::Difference(BinaryNode { lhs, rhs })
            }
            Operation::Distinct(_) => Operation::Distinct(UnaryNode {
                child: Self::take_one(self.name(), children),
            }),
            Operation::Sort(n) => Operation::Sort(SortNode {
                child: Self::take_one(self.name(), children),
                criteria: n.criteria.clone(),
            }),
        }
    }

    /// The columns this node exposes to its parent.
    pub fn provides(&self) -> Vec<Column> {
        match self {
            Operation::Source(n) => n.provides.clone(),
            Operation::Selection(n) => n.child.provides(),
            Operation::Projection(n) => n.columns.clone(),
            Operation::Product(n) => {
                let mut columns = n.lhs.provides();
                columns.extend(n.rhs.provides());
                columns
            }
            Operation::Union(n) | Operation::Intersection(n) | Operation::Difference(n) => {
                n.lhs.provides()
            }
            Operation::Distinct(n) => n.child.provides(),
            Operation::Sort(n) => n.child.provides(),
        }
    }

    /// The columns this node needs from its children.
    pub fn requires(&self) -> Vec<Column> {
        match self {
            Operation::Selection(n) => n.requires.clone(),
            Operation::Projection(n) => n.columns.clone(),
            _ => Vec::new(),
        }
    }

    /// Serializes the plan as json.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// De-serializes a json representation of a plan created in to_json.
    pub fn from_json(json: &str) -> Result<Operation, CsvqlError> {
        serde_json::from_str(json)
            .map_err(|_| CsvqlError::ValidationError(String::from("Malformatted logical plan json")))
    }

    fn check_arity(name: &str, expected: usize, children: &[Operation]) {
        if children.len() != expected {
            panic!(
                "{} cloned with wrong number of children: expected {}, got {}",
                name,
                expected,
                children.len()
            );
        }
    }

    fn take_one(name: &str, mut children: Vec<Operation>) -> Box<Operation> {
        Self::check_arity(name, 1, &children);
        Box::new(children.remove(0))
    }

    fn take_two(name: &str, mut children: Vec<Operation>) -> (Box<Operation>, Box<Operation>) {
        Self::check_arity(name, 2, &children);
        let rhs = children.remove(1);
        let lhs = children.remove(0);
        (Box::new(lhs), Box::new(rhs))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Field;

    fn columns(qualifier: &str, names: &[&str]) -> Vec<Column> {
        names.iter().map(|n| Column::new(qualifier, n)).collect()
    }

    #[test]
    fn test_source_provides() {
        let source = Operation::source("t", columns("t", &["a", "b"]));
        assert_eq!(source.provides(), columns("t", &["a", "b"]));
        assert_eq!(source.requires(), vec![]);
        assert!(source.children().is_empty());
    }

    #[test]
    fn test_selection_provides_child_columns() {
        let source = Operation::source("t", columns("t", &["a", "b"]));
        let sel = Operation::selection(source, columns("t", &["a"]));
        assert_eq!(sel.provides(), columns("t", &["a", "b"]));
        assert_eq!(sel.requires(), columns("t", &["a"]));
    }

    #[test]
    fn test_selection_with_predicate_derives_requires() {
        let source = Operation::source("t", columns("t", &["a", "b"]));
        let sel = Operation::selection_with(
            source,
            Predicate::ConstEq(Column::new("t", "b"), Field::StringField(String::from("x"))),
        );
        assert_eq!(sel.requires(), columns("t", &["b"]));
    }

    #[test]
    fn test_projection_provides_and_requires_its_columns() {
        let source = Operation::source("t", columns("t", &["a", "b", "c"]));
        let proj = Operation::projection(source, columns("t", &["c", "a"]));
        assert_eq!(proj.provides(), columns("t", &["c", "a"]));
        assert_eq!(proj.requires(), columns("t", &["c", "a"]));
    }

    #[test]
    fn test_product_provides_left_then_right() {
        let lhs = Operation::source("l", columns("l", &["a"]));
        let rhs = Operation::source("r", columns("r", &["b", "c"]));
        let product = Operation::product(lhs, rhs);
        assert_eq!(
            product.provides(),
            vec![
                Column::new("l", "a"),
                Column::new("r", "b"),
                Column::new("r", "c"),
            ]
        );
        assert_eq!(product.requires(), vec![]);
        assert_eq!(product.children().len(), 2);
    }

    #[test]
    fn test_union_provides_lhs() {
        let lhs = Operation::source("l", columns("l", &["a"]));
        let rhs = Operation::source("r", columns("r", &["b"]));
        let union = Operation::union(lhs, rhs);
        assert_eq!(union.provides(), columns("l", &["a"]));
    }

    #[test]
    fn test_clone_with_preserves_payload() {
        let source = Operation::source("t", columns("t", &["a", "b"]));
        let sel = Operation::selection(source, columns("t", &["a"]));
        let other = Operation::source("u", columns("u", &["a", "b"]));
        let cloned = sel.clone_with(vec![other.clone()]);
        match &cloned {
            Operation::Selection(n) => {
                assert_eq!(*n.child, other);
                assert_eq!(n.requires, columns("t", &["a"]));
            }
            _ => panic!("Incorrect operator"),
        }
    }

    #[test]
    #[should_panic(expected = "wrong number of children")]
    fn test_clone_with_wrong_arity_panics() {
        let source = Operation::source("t", columns("t", &["a"]));
        let sel = Operation::selection(source.clone(), vec![]);
        sel.clone_with(vec![source.clone(), source]);
    }

    #[test]
    #[should_panic(expected = "wrong number of children")]
    fn test_source_clone_with_child_panics() {
        let source = Operation::source("t", columns("t", &["a"]));
        source.clone_with(vec![Operation::source("u", vec![])]);
    }

    #[test]
    fn test_json_round_trip() {
        let source = Operation::source("t", columns("t", &["a", "b"]));
        let plan = Operation::projection(
            Operation::selection_with(
                source,
                Predicate::ColumnEq(Column::new("t", "a"), Column::new("t", "b")),
            ),
            columns("t", &["a"]),
        );
        let json = plan.to_json();
        let restored = Operation::from_json(&json.to_string()).unwrap();
        assert_eq!(plan, restored);
    }

    #[test]
    fn test_from_json_malformed() {
        match Operation::from_json("{not json") {
            Err(CsvqlError::ValidationError(_)) => (),
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }
}
