use common::{Column, CsvqlError};
use std::collections::HashMap;

/// Resolves attribute references from a query against the columns an
/// operation provides.
///
/// A reference resolves by output alias first, then by qualified name, then
/// by bare column name. Zero matches and more than one match are both
/// validation errors, reported before any operator is built.
pub struct Mapper {
    columns: Vec<Column>,
    names: HashMap<String, Vec<Column>>,
    qualified: HashMap<String, Vec<Column>>,
    aliases: HashMap<String, Vec<Column>>,
}

impl Mapper {
    pub fn new(columns: &[Column]) -> Self {
        let mut names: HashMap<String, Vec<Column>> = HashMap::new();
        let mut qualified: HashMap<String, Vec<Column>> = HashMap::new();
        let mut aliases: HashMap<String, Vec<Column>> = HashMap::new();
        for c in columns {
            names.entry(c.name.clone()).or_default().push(c.clone());
            if !c.qualifier.is_empty() {
                qualified
                    .entry(c.qualified_name())
                    .or_default()
                    .push(c.clone());
            }
            if !c.alias.is_empty() {
                aliases.entry(c.alias.clone()).or_default().push(c.clone());
            }
        }
        Self {
            columns: columns.to_vec(),
            names,
            qualified,
            aliases,
        }
    }

    /// Resolves one attribute reference. `qualifier` is empty for a bare
    /// reference like `city`.
    pub fn resolve(&self, qualifier: &str, name: &str) -> Result<Column, CsvqlError> {
        if qualifier.is_empty() {
            if let Some(matches) = self.aliases.get(name) {
                if matches.len() > 1 {
                    return Err(CsvqlError::ValidationError(format!(
                        "too many matching aliases {:?}",
                        name
                    )));
                }
                return Ok(matches[0].clone());
            }
        } else {
            let qualified_name = format!("{}.{}", qualifier, name);
            return match self.qualified.get(&qualified_name) {
                None => Err(CsvqlError::ValidationError(format!(
                    "no matching qualified name {:?}",
                    qualified_name
                ))),
                Some(matches) if matches.len() > 1 => Err(CsvqlError::ValidationError(format!(
                    "too many matching qualified names {:?}",
                    qualified_name
                ))),
                Some(matches) => Ok(matches[0].clone()),
            };
        }
        match self.names.get(name) {
            None => Err(CsvqlError::ValidationError(format!(
                "no matching name {:?}",
                name
            ))),
            Some(matches) if matches.len() > 1 => Err(CsvqlError::ValidationError(format!(
                "too many matching names {:?}",
                name
            ))),
            Some(matches) => Ok(matches[0].clone()),
        }
    }

    /// Every provided column, in order, for resolving a `*` select list.
    pub fn all(&self) -> Vec<Column> {
        self.columns.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::testutil::qualified_columns;

    fn columns() -> Vec<Column> {
        let mut cs = qualified_columns("s", &["id", "city"]);
        cs.extend(qualified_columns("t", &["id", "pop"]));
        cs.push(Column::new("t", "score").with_alias("points"));
        cs
    }

    #[test]
    fn test_qualified_match() {
        let m = Mapper::new(&columns());
        let c = m.resolve("s", "id").unwrap();
        assert_eq!(c.qualified_name(), "s.id");
    }

    #[test]
    fn test_bare_name_match() {
        let m = Mapper::new(&columns());
        let c = m.resolve("", "city").unwrap();
        assert_eq!(c.qualified_name(), "s.city");
    }

    #[test]
    fn test_alias_wins_over_name() {
        let m = Mapper::new(&columns());
        let c = m.resolve("", "points").unwrap();
        assert_eq!(c.qualified_name(), "t.score");
    }

    #[test]
    fn test_ambiguous_bare_name() {
        let m = Mapper::new(&columns());
        let err = m.resolve("", "id").unwrap_err();
        assert!(matches!(err, CsvqlError::ValidationError(_)));
    }

    #[test]
    fn test_no_match() {
        let m = Mapper::new(&columns());
        assert!(m.resolve("", "nope").is_err());
        assert!(m.resolve("u", "id").is_err());
    }

    #[test]
    fn test_all_keeps_order() {
        let m = Mapper::new(&columns());
        let names: Vec<String> = m.all().iter().map(|c| c.qualified_name()).collect();
        assert_eq!(names, vec!["s.id", "s.city", "t.id", "t.pop", "t.score"]);
    }
}
