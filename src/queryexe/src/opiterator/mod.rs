pub use self::column_filter::ColumnFilter;
pub use self::filter::Filter;
pub use self::memory_scan::MemoryScan;
pub use self::nested_loop_join::NestedLoopJoin;
pub use self::project::ProjectIterator;
pub use self::sort::SortScan;
pub use self::table_scan::TableScan;

mod column_filter;
mod filter;
mod memory_scan;
mod nested_loop_join;
mod project;
mod sort;
mod table_scan;

use common::{Column, CsvqlError, Row};

/// Name and human description of one physical operator, for plan explain
/// output.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDescriptor {
    pub name: String,
    pub description: String,
}

impl PlanDescriptor {
    pub fn new(name: &str, description: String) -> Self {
        Self {
            name: name.to_string(),
            description,
        }
    }
}

/// A pull-based physical operator streaming raw text rows.
///
/// Operators are created once per query and consumed synchronously:
/// `next` recurses down the tree and returns one row per call, `Ok(None)`
/// at end-of-data. `rewind` returns the operator to its first row (a
/// nested-loop join depends on this for re-scanning its right side) and
/// `close` releases file handles, propagating to children.
pub trait OpIterator {
    /// Ordered column list matching the row layout this operator emits.
    fn columns(&self) -> &[Column];

    /// Advances and returns the next row, or `Ok(None)` when exhausted.
    fn next(&mut self) -> Result<Option<Row>, CsvqlError>;

    /// Rewinds back to the first row.
    fn rewind(&mut self) -> Result<(), CsvqlError>;

    /// Releases any held resource. Reading after close is an error.
    fn close(&mut self);

    /// Name and description for the plan explainer.
    fn plan_descriptor(&self) -> PlanDescriptor;

    /// Child operators, left to right.
    fn children(&self) -> Vec<&dyn OpIterator>;
}

/// Locates a column among the columns a child operator provides.
///
/// An exact `(qualifier, name)` match wins; a target with no qualifier
/// falls back to a name-only match. This is the resolution rule the
/// equality filters use.
///
/// # Arguments
///
/// * `target` - Column to locate.
/// * `columns` - Columns the child provides, in row order.
pub(crate) fn find_column(target: &Column, columns: &[Column]) -> Result<usize, CsvqlError> {
    for (i, c) in columns.iter().enumerate() {
        if (target.qualifier.is_empty() && target.name == c.name)
            || (target.qualifier == c.qualifier && target.name == c.name)
        {
            return Ok(i);
        }
    }
    Err(CsvqlError::ColumnNotFound(format!(
        "column {:?} does not exist in relation",
        target.qualified_name()
    )))
}
