use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io;

pub mod logical_plan;
pub mod testutil;

/// Custom error type.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvqlError {
    /// A required column could not be resolved against the columns a child
    /// operator provides.
    ColumnNotFound(String),
    /// The backing file for a referenced table is missing.
    TableNotFound(String),
    /// The header row of a table could not be read.
    SchemaError(String),
    /// A logical operation with no physical translation.
    Unsupported(String),
    /// IO Errors.
    IOError(String),
    /// Validation errors.
    ValidationError(String),
    /// Execution errors.
    ExecutionError(String),
}

impl fmt::Display for CsvqlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CsvqlError::ColumnNotFound(s) => format!("Column Not Found: {}", s),
                CsvqlError::TableNotFound(s) => format!("Table Not Found: {}", s),
                CsvqlError::SchemaError(s) => format!("Schema Error: {}", s),
                CsvqlError::Unsupported(s) => format!("Unsupported: {}", s),
                CsvqlError::IOError(s) => s.to_string(),
                CsvqlError::ValidationError(s) => format!("Validation Error: {}", s),
                CsvqlError::ExecutionError(s) => format!("Execution Error: {}", s),
            }
        )
    }
}

impl From<io::Error> for CsvqlError {
    fn from(error: io::Error) -> Self {
        CsvqlError::IOError(error.to_string())
    }
}

impl From<csv::Error> for CsvqlError {
    fn from(error: csv::Error) -> Self {
        CsvqlError::IOError(error.to_string())
    }
}

impl Error for CsvqlError {}

/// A row of raw text cell values flowing through the physical operators.
pub type Row = Vec<String>;

/// Return type for a query result.
pub struct QueryResult {
    result: String,
}

impl QueryResult {
    /// Return an empty result.
    pub fn empty() -> Self {
        Self {
            result: String::from(""),
        }
    }

    /// Return a result with string.
    ///
    /// # Arguments
    ///
    /// * `result` - Result to return.
    pub fn new(result: &str) -> Self {
        Self {
            result: result.to_string(),
        }
    }

    /// Get the result.
    pub fn result(&self) -> &str {
        &self.result
    }
}

/// Enumerate the supported dtypes.
#[derive(PartialEq, Eq, Serialize, Deserialize, Clone, Copy, Debug)]
pub enum DataType {
    Int,
    String,
    /// Unknown until bound against a relation's schema.
    Any,
}

/// Typed constant values used in filter predicates.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub enum Field {
    IntField(i64),
    StringField(String),
}

impl Field {
    /// Unwraps integer fields.
    pub fn unwrap_int_field(&self) -> i64 {
        match self {
            Field::IntField(i) => *i,
            _ => panic!("Expected i64"),
        }
    }

    /// Unwraps string fields.
    pub fn unwrap_string_field(&self) -> &str {
        match self {
            Field::StringField(s) => s,
            _ => panic!("Expected String"),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::IntField(x) => write!(f, "{}", x),
            Field::StringField(x) => write!(f, "{}", x),
        }
    }
}

/// Identifies one data field of a relation by qualifier (table name or
/// alias) plus column name.
///
/// Two columns are the same field when `(qualifier, name)` match; equality
/// and hashing deliberately ignore the alias and dtype so a
/// `HashMap<Column, usize>` resolves columns to row offsets.
#[derive(Debug, Serialize, Deserialize, Clone, Eq)]
pub struct Column {
    /// Table name or alias prefixing the column reference.
    pub qualifier: String,
    /// Column name.
    pub name: String,
    /// Output alias, empty when none was given.
    pub alias: String,
    /// Column dtype.
    pub dtype: DataType,
}

impl Column {
    /// Create a new column with no alias and an unbound dtype.
    ///
    /// # Arguments
    ///
    /// * `qualifier` - Table name or alias, may be empty.
    /// * `name` - Column name.
    pub fn new(qualifier: &str, name: &str) -> Self {
        Self {
            qualifier: qualifier.to_string(),
            name: name.to_string(),
            alias: String::new(),
            dtype: DataType::Any,
        }
    }

    /// Create a new column with the given dtype.
    pub fn typed(qualifier: &str, name: &str, dtype: DataType) -> Self {
        Self {
            qualifier: qualifier.to_string(),
            name: name.to_string(),
            alias: String::new(),
            dtype,
        }
    }

    /// Returns a copy of this column carrying the given output alias.
    ///
    /// # Arguments
    ///
    /// * `alias` - Alias to set.
    pub fn with_alias(&self, alias: &str) -> Self {
        let mut c = self.clone();
        c.alias = alias.to_string();
        c
    }

    /// The canonical `qualifier.name` string, or just `name` when the
    /// qualifier is empty.
    pub fn qualified_name(&self) -> String {
        if self.qualifier.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.qualifier, self.name)
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.qualifier == other.qualifier && self.name == other.name
    }
}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualifier.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

/// Metadata for one CSV-backed relation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Relation {
    /// Relation name, used as the qualifier for its columns.
    pub name: String,
    /// Path of the backing CSV file.
    pub source: String,
    /// Columns in schema order.
    pub columns: Vec<Column>,
}

impl Relation {
    /// Create a relation with a known column list.
    pub fn new(name: &str, source: &str, columns: Vec<Column>) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            columns,
        }
    }

    /// Loads relation metadata by reading the header row of a CSV file.
    ///
    /// Every column is qualified with the table name and typed as a string;
    /// no rows beyond the header are read.
    ///
    /// # Arguments
    ///
    /// * `name` - Table name.
    /// * `source` - Path to the csv file.
    pub fn from_csv(name: &str, source: &str) -> Result<Self, CsvqlError> {
        let file = File::open(source).map_err(|_| {
            CsvqlError::TableNotFound(format!(
                "table {:?} could not be located at {:?}",
                name, source
            ))
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(file);
        let mut header = csv::StringRecord::new();
        let got = rdr.read_record(&mut header).map_err(|e| {
            CsvqlError::SchemaError(format!(
                "unable to read columns for table {:?} at {:?}: {}",
                name, source, e
            ))
        })?;
        if !got {
            return Err(CsvqlError::SchemaError(format!(
                "table {:?} at {:?} has no header row",
                name, source
            )));
        }
        let columns: Vec<Column> = header
            .iter()
            .map(|c| Column::typed(name, c, DataType::String))
            .collect();
        debug!("loaded {} columns for table {:?}", columns.len(), name);
        Ok(Self {
            name: name.to_string(),
            source: source.to_string(),
            columns,
        })
    }

    /// Mapping from column name to column, for name lookups.
    pub fn columns_map(&self) -> HashMap<String, Column> {
        let mut map = HashMap::new();
        for c in &self.columns {
            map.insert(c.name.clone(), c.clone());
        }
        map
    }
}
