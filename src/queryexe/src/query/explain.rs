use crate::opiterator::OpIterator;
use std::fmt::Write;

/// Renders a physical plan as text, one node per line, root first.
///
/// Each node prints as `o Name` or `o Name (description)`. A node's last
/// child stays on its parent's spine behind a `|` connector; every earlier
/// child is pushed one level right behind a `|\` connector, leaving room for
/// the spine to continue down.
pub fn explain(plan: &dyn OpIterator) -> String {
    let mut out = String::new();
    describe(&mut out, plan, 0);
    out
}

fn describe(out: &mut String, op: &dyn OpIterator, indentation: usize) {
    let descriptor = op.plan_descriptor();
    let prefix = "| ".repeat(indentation);
    if descriptor.description.is_empty() {
        let _ = writeln!(out, "{}o {}", prefix, descriptor.name);
    } else {
        let _ = writeln!(out, "{}o {} ({})", prefix, descriptor.name, descriptor.description);
    }
    let children = op.children();
    for (i, child) in children.iter().enumerate() {
        let increment = if i == children.len() - 1 { 0 } else { 1 };
        let _ = writeln!(out, "{}|{}", prefix, "\\".repeat(increment));
        describe(out, *child, indentation + increment);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opiterator::{ColumnFilter, MemoryScan, NestedLoopJoin, ProjectIterator};
    use common::testutil::qualified_columns;
    use common::Column;

    fn scan(qualifier: &str, names: &[&str]) -> Box<dyn OpIterator> {
        Box::new(MemoryScan::new(qualified_columns(qualifier, names), vec![]))
    }

    #[test]
    fn test_linear_pipeline() {
        let project =
            ProjectIterator::new(qualified_columns("t", &["a"]), scan("t", &["a", "b"])).unwrap();
        assert_eq!(
            explain(&project),
            "o Projection (t.a)\n\
             |\n\
             o MemoryScan\n"
        );
    }

    #[test]
    fn test_branching_pipeline() {
        let join = NestedLoopJoin::new(scan("s", &["id"]), scan("t", &["id"]));
        let filter = ColumnFilter::new(
            Column::new("s", "id"),
            Column::new("t", "id"),
            Box::new(join),
        )
        .unwrap();
        assert_eq!(
            explain(&filter),
            "o ColumnFilter (s.id = t.id)\n\
             |\n\
             o NestedLoopJoin\n\
             |\\\n\
             | o MemoryScan\n\
             |\n\
             o MemoryScan\n"
        );
    }
}
