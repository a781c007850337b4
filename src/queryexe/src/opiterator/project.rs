use super::{OpIterator, PlanDescriptor};
use common::{Column, CsvqlError, Row};
use std::collections::HashMap;

/// Reorders and narrows rows to a chosen column list.
pub struct ProjectIterator {
    child: Box<dyn OpIterator>,
    columns: Vec<Column>,
    offsets: Vec<usize>,
}

impl ProjectIterator {
    /// Resolves every target column against the child's output.
    ///
    /// Columns resolve by qualified name first. A target whose qualified name
    /// is not present falls back to matching on the bare name alone, which is
    /// how an unqualified `select a` finds `t.a`.
    pub fn new(columns: Vec<Column>, child: Box<dyn OpIterator>) -> Result<Self, CsvqlError> {
        let input: HashMap<&Column, usize> = child
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();
        let mut offsets = Vec::with_capacity(columns.len());
        for target in &columns {
            let offset = match input.get(target) {
                Some(i) => *i,
                None => child
                    .columns()
                    .iter()
                    .position(|c| c.name == target.name)
                    .ok_or_else(|| {
                        CsvqlError::ColumnNotFound(format!(
                            "column {:?} does not exist in relation",
                            target.qualified_name()
                        ))
                    })?,
            };
            offsets.push(offset);
        }
        Ok(Self {
            child,
            columns,
            offsets,
        })
    }
}

impl OpIterator for ProjectIterator {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next(&mut self) -> Result<Option<Row>, CsvqlError> {
        match self.child.next()? {
            Some(row) => Ok(Some(
                self.offsets.iter().map(|&i| row[i].clone()).collect(),
            )),
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> Result<(), CsvqlError> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn plan_descriptor(&self) -> PlanDescriptor {
        let names: Vec<String> = self.columns.iter().map(|c| c.qualified_name()).collect();
        PlanDescriptor::new("Projection", names.join(", "))
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }
}

#[cfg(test)]
mod test {
    use super::super::MemoryScan;
    use super::*;
    use common::testutil::qualified_columns;
    use common::Column;

    fn scan() -> Box<dyn OpIterator> {
        Box::new(MemoryScan::new(
            qualified_columns("t", &["v1", "v2", "v3"]),
            vec![
                vec![String::from("a"), String::from("b"), String::from("c")],
                vec![String::from("d"), String::from("e"), String::from("f")],
            ],
        ))
    }

    #[test]
    fn test_reorder_and_narrow() {
        let mut p =
            ProjectIterator::new(qualified_columns("t", &["v3", "v1"]), scan()).unwrap();
        assert_eq!(p.next().unwrap().unwrap(), vec!["c", "a"]);
        assert_eq!(p.next().unwrap().unwrap(), vec!["f", "d"]);
        assert_eq!(p.next().unwrap(), None);
    }

    #[test]
    fn test_full_column_set_round_trips() {
        let mut p = ProjectIterator::new(
            qualified_columns("t", &["v1", "v2", "v3"]),
            scan(),
        )
        .unwrap();
        let names: Vec<String> = p.columns().iter().map(|c| c.qualified_name()).collect();
        assert_eq!(names, vec!["t.v1", "t.v2", "t.v3"]);
        assert_eq!(p.next().unwrap().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(p.next().unwrap().unwrap(), vec!["d", "e", "f"]);
        assert_eq!(p.next().unwrap(), None);
    }

    #[test]
    fn test_bare_name_fallback() {
        let mut p = ProjectIterator::new(vec![Column::new("", "v2")], scan()).unwrap();
        assert_eq!(p.next().unwrap().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_unknown_column() {
        let res = ProjectIterator::new(vec![Column::new("t", "v9")], scan());
        assert!(matches!(res, Err(CsvqlError::ColumnNotFound(_))));
    }
}
