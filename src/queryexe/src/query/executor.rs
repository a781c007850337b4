use crate::opiterator::*;
use common::logical_plan::{Operation, Predicate};
use common::{CsvqlError, QueryResult, Relation};
use log::{debug, error};
use std::collections::HashMap;

/// Manages the execution of queries: converts an Operation tree to a tree of
/// OpIterators and runs it.
pub struct Executor {
    /// Executor state
    pub plan: Option<Box<dyn OpIterator>>,
}

impl Executor {
    /// Initializes an executor with no query configured.
    pub fn new_ref() -> Self {
        Self { plan: None }
    }

    pub fn configure_query(&mut self, physical_plan: Box<dyn OpIterator>) {
        self.plan = Some(physical_plan);
    }

    /// Returns the next row or None if there is no such row.
    ///
    /// # Panics
    ///
    /// Panics if no query is configured.
    pub fn next(&mut self) -> Result<Option<common::Row>, CsvqlError> {
        self.plan.as_mut().unwrap().next()
    }

    /// Closes the physical plan iterator.
    ///
    /// # Panics
    ///
    /// Panics if no query is configured.
    pub fn close(&mut self) {
        self.plan.as_mut().unwrap().close()
    }

    /// Consumes the physical plan iterator and stores the result in a
    /// QueryResult, one padded column per output column.
    ///
    /// An error before the first row aborts with no output. An error after
    /// rows have been produced truncates the result at the last emitted row
    /// and logs the failure.
    pub fn execute(&mut self) -> Result<QueryResult, CsvqlError> {
        let plan = self.plan.as_mut().unwrap();
        let width = plan
            .columns()
            .iter()
            .map(|c| c.qualified_name().len())
            .max()
            .unwrap_or(10)
            + 2;
        let mut res = String::new();
        for c in plan.columns() {
            let s = format!("{:width$}", c.qualified_name(), width = width);
            res += &s;
        }
        res += "\n";

        let mut emitted = 0;
        loop {
            match plan.next() {
                Ok(Some(row)) => {
                    for val in row {
                        let s = format!("{:width$}", val, width = width);
                        res += &s;
                    }
                    res += "\n";
                    emitted += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    if emitted == 0 {
                        plan.close();
                        return Err(e);
                    }
                    error!("result truncated after {} rows: {}", emitted, e);
                    break;
                }
            }
        }
        plan.close();
        Ok(QueryResult::new(&res))
    }

    /// Converts an Operation tree to a physical plan of op_iterators.
    ///
    /// Conversion is bottom-up; any error below aborts the whole compile so
    /// no partially built plan is ever returned.
    ///
    /// # Arguments
    ///
    /// * `plan` - Logical plan to convert.
    /// * `tables` - Metadata for the tables the plan's sources read.
    pub fn compile(
        plan: &Operation,
        tables: &HashMap<String, Relation>,
    ) -> Result<Box<dyn OpIterator>, CsvqlError> {
        debug!("compiling {} node", plan.name());
        match plan {
            Operation::Source(n) => {
                let relation = tables.get(&n.name).ok_or_else(|| {
                    CsvqlError::TableNotFound(format!("no metadata for table {:?}", n.name))
                })?;
                Ok(Box::new(TableScan::new(&relation.name, &relation.source)?))
            }
            Operation::Selection(n) => {
                let child = Self::compile(&n.child, tables)?;
                match &n.predicate {
                    Some(Predicate::ColumnEq(l, r)) => Ok(Box::new(ColumnFilter::new(
                        l.clone(),
                        r.clone(),
                        child,
                    )?)),
                    Some(Predicate::ConstEq(c, f)) => {
                        Ok(Box::new(Filter::new(c.clone(), f.clone(), child)?))
                    }
                    None => Err(CsvqlError::Unsupported(String::from(
                        "selection with no bound predicate",
                    ))),
                }
            }
            Operation::Projection(n) => {
                let child = Self::compile(&n.child, tables)?;
                Ok(Box::new(ProjectIterator::new(n.columns.clone(), child)?))
            }
            Operation::Product(n) => {
                let lhs = Self::compile(&n.lhs, tables)?;
                let rhs = Self::compile(&n.rhs, tables)?;
                Ok(Box::new(NestedLoopJoin::new(lhs, rhs)))
            }
            Operation::Sort(n) => {
                let child = Self::compile(&n.child, tables)?;
                let criteria = n
                    .criteria
                    .iter()
                    .map(|c| (c.column.clone(), c.order))
                    .collect();
                Ok(Box::new(SortScan::new(criteria, child)?))
            }
            Operation::Union(_)
            | Operation::Intersection(_)
            | Operation::Difference(_)
            | Operation::Distinct(_) => Err(CsvqlError::Unsupported(format!(
                "no physical operator for {}",
                plan.name()
            ))),
        }
    }
}
