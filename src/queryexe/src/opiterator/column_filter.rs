use super::{find_column, OpIterator, PlanDescriptor};
use common::{Column, CsvqlError, Row};

/// Keeps rows where two columns of the same row hold equal values.
///
/// This is the operator a join condition compiles to once the optimizer has
/// placed it above the product of the joined tables.
pub struct ColumnFilter {
    child: Box<dyn OpIterator>,
    lhs: Column,
    rhs: Column,
    lhs_offset: usize,
    rhs_offset: usize,
}

impl ColumnFilter {
    pub fn new(
        lhs: Column,
        rhs: Column,
        child: Box<dyn OpIterator>,
    ) -> Result<Self, CsvqlError> {
        let lhs_offset = find_column(&lhs, child.columns())?;
        let rhs_offset = find_column(&rhs, child.columns())?;
        Ok(Self {
            child,
            lhs,
            rhs,
            lhs_offset,
            rhs_offset,
        })
    }
}

impl OpIterator for ColumnFilter {
    fn columns(&self) -> &[Column] {
        self.child.columns()
    }

    fn next(&mut self) -> Result<Option<Row>, CsvqlError> {
        while let Some(row) = self.child.next()? {
            if row[self.lhs_offset] == row[self.rhs_offset] {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> Result<(), CsvqlError> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn plan_descriptor(&self) -> PlanDescriptor {
        PlanDescriptor::new(
            "ColumnFilter",
            format!(
                "{} = {}",
                self.lhs.qualified_name(),
                self.rhs.qualified_name()
            ),
        )
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }
}
