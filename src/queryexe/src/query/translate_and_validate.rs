use super::mapper::Mapper;
use common::logical_plan::{Operation, Predicate, SortCriterion, SortOrder};
use common::{Column, CsvqlError, Field, Relation};
use log::info;
use sqlparser::ast::{
    BinaryOperator, Expr, JoinConstraint, JoinOperator, ObjectName, OrderByExpr, SelectItem,
    SetExpr, TableFactor, Value,
};
use std::collections::HashMap;
use std::path::Path;

/// Translates a parsed SQL query to a logical plan.
///
/// Tables referenced in the FROM clause are loaded from `<name>.csv` under
/// the data directory and memoized in the shared table map. Attribute
/// references are resolved through a [`Mapper`] so unknown and ambiguous
/// names are rejected before any operator runs.
pub struct TranslateAndValidate<'a> {
    /// Directory the backing csv files live in.
    data_dir: &'a Path,
    /// Table metadata, keyed by table name. Insert-on-load only.
    tables: &'a mut HashMap<String, Relation>,
}

impl<'a> TranslateAndValidate<'a> {
    fn new(data_dir: &'a Path, tables: &'a mut HashMap<String, Relation>) -> Self {
        Self { data_dir, tables }
    }

    /// Translates a sqlparser::ast::Query to an Operation tree.
    ///
    /// # Arguments
    ///
    /// * `sql` - AST to translate.
    /// * `data_dir` - Directory holding the csv files tables load from.
    /// * `tables` - Table metadata map, extended as tables are referenced.
    pub fn from_sql(
        sql: &sqlparser::ast::Query,
        data_dir: &Path,
        tables: &mut HashMap<String, Relation>,
    ) -> Result<Operation, CsvqlError> {
        let mut translator = TranslateAndValidate::new(data_dir, tables);
        translator.process_query(sql)
    }

    /// Helper function to process sqlparser::ast::Query.
    ///
    /// # Arguments
    ///
    /// * `query` - AST to process.
    fn process_query(&mut self, query: &sqlparser::ast::Query) -> Result<Operation, CsvqlError> {
        if !query.ctes.is_empty() {
            return Err(CsvqlError::ValidationError(String::from(
                "Common table expressions not supported",
            )));
        }
        if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
            return Err(CsvqlError::ValidationError(String::from(
                "Limit and offset not supported",
            )));
        }
        match &query.body {
            SetExpr::Select(b) => {
                let select = &*b;
                self.process_select(select, &query.order_by)
            }
            SetExpr::Query(_) => Err(CsvqlError::ValidationError(String::from(
                "Nested queries not supported",
            ))),
            SetExpr::SetOperation { .. } => Err(CsvqlError::Unsupported(String::from(
                "Set operations not supported",
            ))),
            SetExpr::Values(_) => Err(CsvqlError::ValidationError(String::from(
                "Value operation not supported",
            ))),
        }
    }

    /// Helper function to process sqlparser::ast::Select.
    ///
    /// Builds the plan bottom-up: sources and joins, then the WHERE
    /// selection, then the sort, then the projection on top.
    ///
    /// # Arguments
    ///
    /// * `select` - AST of a select query to process.
    /// * `order_by` - Order by clause of the enclosing query.
    fn process_select(
        &mut self,
        select: &sqlparser::ast::Select,
        order_by: &[OrderByExpr],
    ) -> Result<Operation, CsvqlError> {
        if select.distinct {
            return Err(CsvqlError::Unsupported(String::from(
                "Distinct not supported",
            )));
        }
        if select.from.len() != 1 {
            return Err(CsvqlError::ValidationError(String::from(
                "Exactly one FROM relation is supported",
            )));
        }
        if !select.group_by.is_empty() {
            return Err(CsvqlError::Unsupported(String::from(
                "Group by not supported",
            )));
        }
        if select.having.is_some() {
            return Err(CsvqlError::Unsupported(String::from("Having not supported")));
        }

        // From
        let from = &select.from[0];
        let mut node = self.process_table_factor(&from.relation)?;
        if from.joins.len() > 1 {
            return Err(CsvqlError::ValidationError(String::from(
                "Only a single inner join is supported",
            )));
        }
        for join in &from.joins {
            node = self.process_join(join, node)?;
        }

        // Where
        if let Some(expr) = &select.selection {
            let mapper = Mapper::new(&node.provides());
            let predicate = Self::to_predicate(expr, &mapper)?;
            node = Operation::selection_with(node, predicate);
        }

        // Order by
        if !order_by.is_empty() {
            node = Self::process_order_by(order_by, node)?;
        }

        // Select
        let mapper = Mapper::new(&node.provides());
        let mut columns = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::Wildcard => {
                    if select.projection.len() > 1 {
                        return Err(CsvqlError::ValidationError(String::from(
                            "Cannot select wildcard and exp in same select",
                        )));
                    }
                    columns = mapper.all();
                }
                SelectItem::UnnamedExpr(expr) => {
                    columns.push(Self::expr_to_column(expr, &mapper)?);
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    columns.push(Self::expr_to_column(expr, &mapper)?.with_alias(alias));
                }
                _ => {
                    return Err(CsvqlError::ValidationError(String::from(
                        "Select unsupported expression",
                    )));
                }
            }
        }
        Ok(Operation::projection(node, columns))
    }

    /// Loads the referenced table on first use and returns a Source leaf
    /// over its columns.
    ///
    /// # Arguments
    ///
    /// * `tf` - Table to process.
    fn process_table_factor(&mut self, tf: &TableFactor) -> Result<Operation, CsvqlError> {
        match tf {
            TableFactor::Table { name, .. } => {
                let name = get_name(name)?;
                if !self.tables.contains_key(&name) {
                    let source = self.data_dir.join(format!("{}.csv", name));
                    info!("loading table {} from {}", name, source.display());
                    let relation = Relation::from_csv(&name, &source.to_string_lossy())?;
                    self.tables.insert(name.clone(), relation);
                }
                let columns = self.tables[&name].columns.clone();
                Ok(Operation::source(&name, columns))
            }
            _ => Err(CsvqlError::ValidationError(String::from(
                "Nested joins and derived tables not supported",
            ))),
        }
    }

    /// Parses an inner join into a column-equality Selection over the
    /// Product of the two sides.
    ///
    /// # Arguments
    ///
    /// * `join` - The join node to parse.
    /// * `left` - Already-translated left side of the join.
    fn process_join(
        &mut self,
        join: &sqlparser::ast::Join,
        left: Operation,
    ) -> Result<Operation, CsvqlError> {
        let right = self.process_table_factor(&join.relation)?;
        let jc = match &join.join_operator {
            JoinOperator::Inner(jc) => jc,
            _ => {
                return Err(CsvqlError::Unsupported(String::from(
                    "Unsupported join type",
                )));
            }
        };
        if let JoinConstraint::On(expr) = jc {
            let product = Operation::product(left, right);
            let mapper = Mapper::new(&product.provides());
            match Self::to_predicate(expr, &mapper)? {
                p @ Predicate::ColumnEq(_, _) => Ok(Operation::selection_with(product, p)),
                Predicate::ConstEq(_, _) => Err(CsvqlError::ValidationError(String::from(
                    "Join condition must compare two columns",
                ))),
            }
        } else {
            Err(CsvqlError::Unsupported(String::from(
                "Unsupported join constraint",
            )))
        }
    }

    /// Translates an order by clause to a Sort over `child`.
    fn process_order_by(
        order_by: &[OrderByExpr],
        child: Operation,
    ) -> Result<Operation, CsvqlError> {
        let mapper = Mapper::new(&child.provides());
        let mut criteria = Vec::with_capacity(order_by.len());
        for ob in order_by {
            let column = Self::expr_to_column(&ob.expr, &mapper)?;
            let order = match ob.asc {
                Some(false) => SortOrder::Desc,
                _ => SortOrder::Asc,
            };
            criteria.push(SortCriterion { column, order });
        }
        Ok(Operation::sort(child, criteria))
    }

    /// Parses an equality expression to a predicate with its columns
    /// resolved.
    ///
    /// # Arguments
    ///
    /// * `expr` - Expression to parse.
    /// * `mapper` - Mapper over the columns the predicate may reference.
    fn to_predicate(expr: &Expr, mapper: &Mapper) -> Result<Predicate, CsvqlError> {
        let (left, op, right) = match expr {
            Expr::BinaryOp { left, op, right } => (left.as_ref(), op, right.as_ref()),
            _ => {
                return Err(CsvqlError::ValidationError(String::from(
                    "Unsupported predicate expression",
                )));
            }
        };
        if *op != BinaryOperator::Eq {
            return Err(CsvqlError::Unsupported(String::from(
                "Only equality predicates are supported",
            )));
        }
        match (left, right) {
            (Expr::Value(_), Expr::Value(_)) => Err(CsvqlError::ValidationError(String::from(
                "Predicate must reference a column",
            ))),
            (Expr::Value(v), e) => Ok(Predicate::ConstEq(
                Self::expr_to_column(e, mapper)?,
                Self::value_to_field(v)?,
            )),
            (e, Expr::Value(v)) => Ok(Predicate::ConstEq(
                Self::expr_to_column(e, mapper)?,
                Self::value_to_field(v)?,
            )),
            (l, r) => Ok(Predicate::ColumnEq(
                Self::expr_to_column(l, mapper)?,
                Self::expr_to_column(r, mapper)?,
            )),
        }
    }

    /// Resolves an identifier expression to a provided column.
    ///
    /// # Arguments
    ///
    /// * `expr` - Expression to resolve.
    /// * `mapper` - Mapper over the columns in scope.
    fn expr_to_column(expr: &Expr, mapper: &Mapper) -> Result<Column, CsvqlError> {
        match expr {
            Expr::Identifier(name) => mapper.resolve("", name),
            Expr::CompoundIdentifier(names) => {
                if names.len() != 2 {
                    return Err(CsvqlError::ValidationError(format!(
                        "No . table names supported in field {}",
                        names.join(".")
                    )));
                }
                mapper.resolve(&names[0], &names[1])
            }
            _ => Err(CsvqlError::ValidationError(String::from(
                "Unsupported expression",
            ))),
        }
    }

    /// Converts a literal to a typed constant.
    ///
    /// # Arguments
    ///
    /// * `val` - Literal to convert.
    fn value_to_field(val: &Value) -> Result<Field, CsvqlError> {
        match val {
            Value::Number(s) => {
                let i = s.parse::<i64>().map_err(|_| {
                    CsvqlError::ValidationError(format!("Unsupported literal {}", s))
                })?;
                Ok(Field::IntField(i))
            }
            Value::SingleQuotedString(s) => Ok(Field::StringField(s.to_string())),
            _ => Err(CsvqlError::ValidationError(String::from(
                "Unsupported literal in predicate",
            ))),
        }
    }
}

/// Extracts a plain table name, rejecting dotted names.
fn get_name(name: &ObjectName) -> Result<String, CsvqlError> {
    if name.0.len() > 1 {
        Err(CsvqlError::ValidationError(format!(
            "No . table names supported in {}",
            name
        )))
    } else {
        Ok(name.0[0].clone())
    }
}
