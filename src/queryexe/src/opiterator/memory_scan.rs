use super::{OpIterator, PlanDescriptor};
use common::{Column, CsvqlError, Row};

/// Scan over rows already held in memory.
///
/// Used as a leaf for pre-materialized data and as a test double for the
/// streaming operators above it.
pub struct MemoryScan {
    columns: Vec<Column>,
    rows: Vec<Row>,
    next: usize,
}

impl MemoryScan {
    /// Creates a scan over fixed rows.
    ///
    /// # Arguments
    ///
    /// * `columns` - Column list matching the row layout.
    /// * `rows` - Rows to serve, in order.
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            next: 0,
        }
    }
}

impl OpIterator for MemoryScan {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next(&mut self) -> Result<Option<Row>, CsvqlError> {
        if self.next >= self.rows.len() {
            return Ok(None);
        }
        let row = self.rows[self.next].clone();
        self.next += 1;
        Ok(Some(row))
    }

    fn rewind(&mut self) -> Result<(), CsvqlError> {
        self.next = 0;
        Ok(())
    }

    fn close(&mut self) {}

    fn plan_descriptor(&self) -> PlanDescriptor {
        PlanDescriptor::new("MemoryScan", String::new())
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::testutil::qualified_columns;

    fn rows() -> Vec<Row> {
        vec![
            vec![String::from("1"), String::from("x")],
            vec![String::from("2"), String::from("y")],
        ]
    }

    #[test]
    fn test_scan_and_rewind() {
        let mut scan = MemoryScan::new(qualified_columns("t", &["a", "b"]), rows());
        assert_eq!(scan.next().unwrap().unwrap(), vec!["1", "x"]);
        assert_eq!(scan.next().unwrap().unwrap(), vec!["2", "y"]);
        assert_eq!(scan.next().unwrap(), None);
        scan.rewind().unwrap();
        assert_eq!(scan.next().unwrap().unwrap(), vec!["1", "x"]);
    }
}
