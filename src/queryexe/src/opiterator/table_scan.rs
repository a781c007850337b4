use super::{OpIterator, PlanDescriptor};
use csv::{Position, Reader, ReaderBuilder, StringRecord};
use common::{Column, CsvqlError, DataType, Row};
use std::fs::File;

/// Streaming scan over a CSV file.
///
/// The first record of the file names the columns, which are qualified by the
/// table name. Every value is read as a string. All-empty records are skipped
/// so trailing blank lines do not surface as rows.
pub struct TableScan {
    table: String,
    source: String,
    columns: Vec<Column>,
    reader: Option<Reader<File>>,
    // Position just past the header, where rewind returns to.
    data_start: Position,
}

impl TableScan {
    /// Opens `source` and reads its header record.
    ///
    /// # Arguments
    ///
    /// * `table` - Name used to qualify the columns.
    /// * `source` - Path of the CSV file to scan.
    pub fn new(table: &str, source: &str) -> Result<Self, CsvqlError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .from_path(source)
            .map_err(|_| {
                CsvqlError::TableNotFound(format!("cannot open {} for table {}", source, table))
            })?;
        let mut header = StringRecord::new();
        let has_header = reader
            .read_record(&mut header)
            .map_err(|e| CsvqlError::IOError(format!("reading header of {}: {}", source, e)))?;
        if !has_header {
            return Err(CsvqlError::SchemaError(format!(
                "{} has no header record",
                source
            )));
        }
        let columns = header
            .iter()
            .map(|name| Column::typed(table, name, DataType::String))
            .collect();
        let data_start = reader.position().clone();
        Ok(Self {
            table: table.to_string(),
            source: source.to_string(),
            columns,
            reader: Some(reader),
            data_start,
        })
    }
}

impl OpIterator for TableScan {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next(&mut self) -> Result<Option<Row>, CsvqlError> {
        let source = &self.source;
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| CsvqlError::ExecutionError(String::from("scan is closed")))?;
        let mut record = StringRecord::new();
        loop {
            let more = reader
                .read_record(&mut record)
                .map_err(|e| CsvqlError::IOError(format!("reading {}: {}", source, e)))?;
            if !more {
                return Ok(None);
            }
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            return Ok(Some(record.iter().map(|f| f.to_string()).collect()));
        }
    }

    fn rewind(&mut self) -> Result<(), CsvqlError> {
        let source = &self.source;
        let data_start = self.data_start.clone();
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| CsvqlError::ExecutionError(String::from("scan is closed")))?;
        reader
            .seek(data_start)
            .map_err(|e| CsvqlError::IOError(format!("rewinding {}: {}", source, e)))?;
        Ok(())
    }

    fn close(&mut self) {
        self.reader = None;
    }

    fn plan_descriptor(&self) -> PlanDescriptor {
        PlanDescriptor::new("TableScan", format!("{}, {}", self.table, self.source))
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::testutil::{gen_random_csv_path, init, write_csv};

    #[test]
    fn test_scan_cities() {
        init();
        let mut scan = TableScan::new("cities", "../../test_data/cities.csv").unwrap();
        let names: Vec<&str> = scan.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["LatD", "LatM", "LatS", "NS", "LonD", "LonM", "LonS", "EW", "City", "State"]
        );
        for c in scan.columns() {
            assert_eq!(c.qualifier, "cities");
        }
        let first = scan.next().unwrap().unwrap();
        assert_eq!(first[8], "Youngstown");
        assert_eq!(first[9], "OH");
    }

    #[test]
    fn test_rewind_restarts_after_header() {
        init();
        let path = gen_random_csv_path();
        write_csv(&path, &["a,b", "1,x", "2,y"]);
        let mut scan = TableScan::new("t", path.to_str().unwrap()).unwrap();
        assert_eq!(scan.next().unwrap().unwrap(), vec!["1", "x"]);
        assert_eq!(scan.next().unwrap().unwrap(), vec!["2", "y"]);
        assert_eq!(scan.next().unwrap(), None);
        scan.rewind().unwrap();
        assert_eq!(scan.next().unwrap().unwrap(), vec!["1", "x"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        init();
        let path = gen_random_csv_path();
        write_csv(&path, &["a,b", "1,x", "", "2,y", ""]);
        let mut scan = TableScan::new("t", path.to_str().unwrap()).unwrap();
        assert_eq!(scan.next().unwrap().unwrap(), vec!["1", "x"]);
        assert_eq!(scan.next().unwrap().unwrap(), vec!["2", "y"]);
        assert_eq!(scan.next().unwrap(), None);
    }

    #[test]
    fn test_read_after_close_errors() {
        init();
        let path = gen_random_csv_path();
        write_csv(&path, &["a,b", "1,x"]);
        let mut scan = TableScan::new("t", path.to_str().unwrap()).unwrap();
        assert_eq!(scan.next().unwrap().unwrap(), vec!["1", "x"]);
        scan.close();
        assert!(matches!(scan.next(), Err(CsvqlError::ExecutionError(_))));
        assert!(matches!(scan.rewind(), Err(CsvqlError::ExecutionError(_))));
    }

    #[test]
    fn test_missing_file() {
        init();
        let res = TableScan::new("t", "no_such_file.csv");
        assert!(matches!(res, Err(CsvqlError::TableNotFound(_))));
    }
}
