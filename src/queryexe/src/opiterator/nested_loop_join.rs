use super::{OpIterator, PlanDescriptor};
use common::{Column, CsvqlError, Row};

/// Cross product of two children, in left-major order.
///
/// Holds the current left row and pairs it with every right row, rewinding
/// the right child each time the left side advances. The right child must
/// therefore support `rewind`.
pub struct NestedLoopJoin {
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    columns: Vec<Column>,
    current_left: Option<Row>,
    started: bool,
}

impl NestedLoopJoin {
    pub fn new(left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Self {
        let mut columns = left.columns().to_vec();
        columns.extend(right.columns().to_vec());
        Self {
            left,
            right,
            columns,
            current_left: None,
            started: false,
        }
    }
}

impl OpIterator for NestedLoopJoin {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next(&mut self) -> Result<Option<Row>, CsvqlError> {
        if !self.started {
            self.current_left = self.left.next()?;
            self.started = true;
        }
        loop {
            let left_row = match &self.current_left {
                Some(row) => row,
                None => return Ok(None),
            };
            if let Some(right_row) = self.right.next()? {
                let mut row = left_row.clone();
                row.extend(right_row);
                return Ok(Some(row));
            }
            self.current_left = self.left.next()?;
            self.right.rewind()?;
        }
    }

    fn rewind(&mut self) -> Result<(), CsvqlError> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.started = false;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }

    fn plan_descriptor(&self) -> PlanDescriptor {
        PlanDescriptor::new("NestedLoopJoin", String::new())
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }
}

#[cfg(test)]
mod test {
    use super::super::MemoryScan;
    use super::*;
    use common::testutil::qualified_columns;

    fn left() -> Box<dyn OpIterator> {
        Box::new(MemoryScan::new(
            qualified_columns("l", &["a"]),
            vec![vec![String::from("1")], vec![String::from("2")]],
        ))
    }

    fn right() -> Box<dyn OpIterator> {
        Box::new(MemoryScan::new(
            qualified_columns("r", &["b"]),
            vec![
                vec![String::from("x")],
                vec![String::from("y")],
                vec![String::from("z")],
            ],
        ))
    }

    #[test]
    fn test_left_major_order() {
        let mut join = NestedLoopJoin::new(left(), right());
        let mut rows = Vec::new();
        while let Some(row) = join.next().unwrap() {
            rows.push(row);
        }
        assert_eq!(
            rows,
            vec![
                vec!["1", "x"],
                vec!["1", "y"],
                vec!["1", "z"],
                vec!["2", "x"],
                vec!["2", "y"],
                vec!["2", "z"],
            ]
        );
    }

    #[test]
    fn test_columns_concatenated() {
        let join = NestedLoopJoin::new(left(), right());
        let names: Vec<String> = join.columns().iter().map(|c| c.qualified_name()).collect();
        assert_eq!(names, vec!["l.a", "r.b"]);
    }

    #[test]
    fn test_empty_left() {
        let empty = Box::new(MemoryScan::new(qualified_columns("l", &["a"]), vec![]));
        let mut join = NestedLoopJoin::new(empty, right());
        assert_eq!(join.next().unwrap(), None);
    }

    #[test]
    fn test_rewind_restarts() {
        let mut join = NestedLoopJoin::new(left(), right());
        join.next().unwrap();
        join.next().unwrap();
        join.rewind().unwrap();
        assert_eq!(join.next().unwrap().unwrap(), vec!["1", "x"]);
    }
}
