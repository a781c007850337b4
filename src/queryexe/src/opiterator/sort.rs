use super::{find_column, OpIterator, PlanDescriptor};
use common::logical_plan::SortOrder;
use common::{Column, CsvqlError, Row};
use std::cmp::Ordering;

/// A single resolved sort key.
struct SortKey {
    column: Column,
    offset: usize,
    order: SortOrder,
}

/// Blocking sort over the child's full output.
///
/// Drains the child at construction and stably sorts the buffer, so equal
/// rows keep the order the child produced them in. `rewind` only resets the
/// cursor; the buffer is not rebuilt.
pub struct SortScan {
    child: Box<dyn OpIterator>,
    keys: Vec<SortKey>,
    rows: Vec<Row>,
    next: usize,
}

impl SortScan {
    /// Resolves the sort keys, drains `child` and sorts the buffer.
    ///
    /// # Arguments
    ///
    /// * `criteria` - Columns to sort by with their orders, most significant
    ///   first.
    /// * `child` - Operator producing the rows to sort.
    pub fn new(
        criteria: Vec<(Column, SortOrder)>,
        mut child: Box<dyn OpIterator>,
    ) -> Result<Self, CsvqlError> {
        let mut keys = Vec::with_capacity(criteria.len());
        for (column, order) in criteria {
            let offset = find_column(&column, child.columns())?;
            keys.push(SortKey {
                column,
                offset,
                order,
            });
        }
        let mut rows = Vec::new();
        while let Some(row) = child.next()? {
            rows.push(row);
        }
        rows.sort_by(|a, b| Self::compare(&keys, a, b));
        Ok(Self {
            child,
            keys,
            rows,
            next: 0,
        })
    }

    fn compare(keys: &[SortKey], a: &Row, b: &Row) -> Ordering {
        for key in keys {
            let ord = a[key.offset].cmp(&b[key.offset]);
            let ord = match key.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl OpIterator for SortScan {
    fn columns(&self) -> &[Column] {
        self.child.columns()
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

    fn close(&mut self) {
        self.rows.clear();
        self.child.close();
    }

    fn plan_descriptor(&self) -> PlanDescriptor {
        let keys: Vec<String> = self
            .keys
            .iter()
            .map(|k| format!("{} {}", k.column.qualified_name(), k.order))
            .collect();
        PlanDescriptor::new("SortScan", keys.join(", "))
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }
}
