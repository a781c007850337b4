use super::{find_column, OpIterator, PlanDescriptor};
use common::{Column, CsvqlError, Field, Row};

/// Keeps rows whose column at `offset` equals a constant.
pub struct Filter {
    child: Box<dyn OpIterator>,
    column: Column,
    offset: usize,
    value: Field,
}

impl Filter {
    /// Resolves `column` against the child's output and builds the filter.
    ///
    /// # Arguments
    ///
    /// * `column` - Column the predicate tests.
    /// * `value` - Constant the column must equal.
    /// * `child` - Operator producing candidate rows.
    pub fn new(
        column: Column,
        value: Field,
        child: Box<dyn OpIterator>,
    ) -> Result<Self, CsvqlError> {
        let offset = find_column(&column, child.columns())?;
        Ok(Self {
            child,
            column,
            offset,
            value,
        })
    }

    fn matches(&self, row: &Row) -> bool {
        let cell = &row[self.offset];
        match &self.value {
            Field::StringField(s) => cell == s,
            Field::IntField(i) => cell.parse::<i64>().map_or(false, |v| v == *i),
        }
    }
}

impl OpIterator for Filter {
    fn columns(&self) -> &[Column] {
        self.child.columns()
    }

    fn next(&mut self) -> Result<Option<Row>, CsvqlError> {
        while let Some(row) = self.child.next()? {
            if self.matches(&row) {
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
            "Filter",
            format!("{} = {}", self.column.qualified_name(), self.value),
        )
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }
}
