//! Statement assembler.
//!
//! Each request type is a plain value; `compile` is a pure function of it and
//! returns the SQL text with its ordered bind arguments.

use sea_query::{inject_parameters, MysqlQueryBuilder, Value};
use tracing::{debug, warn};

use crate::ast::{Assignments, ByClause, Condition, Having, Limit, Projection};
use crate::error::{Error, Result};
use crate::join::{compile_joins, Join};
use crate::predicate;
use crate::quote::{quote, quote_list, quote_projections};
use crate::table_ref::TableRef;
use crate::values::compile_values;

/// Compiled SQL text and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Statement {
    fn finish(kind: &'static str, sql: String, values: Vec<Value>) -> Self {
        debug!(kind, sql = %sql, args = values.len(), "compiled statement");
        Self { sql, values }
    }

    /// SQL with the arguments inlined. For logs and tests only, never execute
    /// the returned text.
    ///
    /// Raw SQL may contain extra `?` characters; when there are more of them
    /// than arguments the SQL is returned unchanged.
    pub fn render(&self) -> String {
        let placeholders = self.sql.matches('?').count();
        if placeholders > self.values.len() {
            warn!(
                placeholders,
                args = self.values.len(),
                "placeholder count exceeds arguments, not inlining"
            );
            return self.sql.clone();
        }
        inject_parameters(&self.sql, self.values.clone(), &MysqlQueryBuilder)
    }
}

/// Appends ` <keyword> <predicate>` when the condition is not empty.
fn push_predicate(
    sql: &mut String,
    values: &mut Vec<Value>,
    keyword: &str,
    condition: Option<&Condition>,
) -> Result<()> {
    let Some(condition) = condition else {
        return Ok(());
    };
    let fragment = predicate::compile(condition)?;
    if !fragment.is_empty() {
        sql.push(' ');
        sql.push_str(keyword);
        sql.push(' ');
        sql.push_str(&fragment.sql);
        values.extend(fragment.values);
    }
    Ok(())
}

fn push_joins(sql: &mut String, joins: &[Join]) -> Result<()> {
    let clause = compile_joins(joins)?;
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(&clause);
    }
    Ok(())
}

fn by_clause(by: &ByClause) -> String {
    match by {
        ByClause::Raw(text) => text.clone(),
        ByClause::Columns(columns) => quote_list(columns),
    }
}

fn limit_clause(limit: Limit) -> String {
    match limit {
        Limit::Count(count) => format!(" LIMIT {count}"),
        Limit::Range(offset, count) => format!(" LIMIT {offset}, {count}"),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<Projection>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Condition>,
    pub group: Option<ByClause>,
    pub having: Option<Having>,
    pub order: Option<ByClause>,
    pub limit: Option<Limit>,
}

impl Select {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn columns<I, P>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Projection>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn group_by(mut self, by: ByClause) -> Self {
        self.group = Some(by);
        self
    }

    pub fn having(mut self, having: impl Into<Having>) -> Self {
        self.having = Some(having.into());
        self
    }

    pub fn order_by(mut self, by: ByClause) -> Self {
        self.order = Some(by);
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn compile(&self) -> Result<Statement> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            quote_projections(&self.columns),
            TableRef::parse(&self.table).to_sql()
        );
        let mut values = Vec::new();

        push_joins(&mut sql, &self.joins)?;
        push_predicate(&mut sql, &mut values, "WHERE", self.where_clause.as_ref())?;
        if let Some(group) = self.group.as_ref().map(by_clause).filter(|s| !s.is_empty()) {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group);
        }
        match &self.having {
            Some(Having::Raw(expr)) if !expr.is_empty() => {
                sql.push_str(" HAVING ");
                sql.push_str(expr);
            }
            Some(Having::Condition(condition)) => {
                push_predicate(&mut sql, &mut values, "HAVING", Some(condition))?;
            }
            _ => {}
        }
        if let Some(order) = self.order.as_ref().map(by_clause).filter(|s| !s.is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&limit_clause(limit));
        }

        Ok(Statement::finish("select", sql, values))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    pub table: String,
    pub values: Assignments,
    pub ignore: bool,
}

impl Insert {
    pub fn new(table: impl Into<String>, values: Assignments) -> Self {
        Self {
            table: table.into(),
            values,
            ignore: false,
        }
    }

    /// `INSERT IGNORE`
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn compile(&self) -> Result<Statement> {
        let compiled = compile_values(&self.values, false)?;
        let sql = format!(
            "INSERT{} INTO {} ({}) VALUES ({})",
            if self.ignore { " IGNORE" } else { "" },
            quote(&self.table),
            compiled.columns,
            compiled.sql
        );
        Ok(Statement::finish("insert", sql, compiled.values))
    }
}

/// INSERT ... ON DUPLICATE KEY UPDATE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Upsert {
    pub table: String,
    pub values: Assignments,
    /// Columns refreshed on conflict; all inserted columns when `None`.
    pub update_columns: Option<Vec<String>>,
}

impl Upsert {
    pub fn new(table: impl Into<String>, values: Assignments) -> Self {
        Self {
            table: table.into(),
            values,
            update_columns: None,
        }
    }

    pub fn update_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn compile(&self) -> Result<Statement> {
        let compiled = compile_values(&self.values, false)?;
        let targets = match &self.update_columns {
            Some(columns) if !columns.is_empty() => columns.as_slice(),
            _ => compiled.names.as_slice(),
        };
        let updates = targets
            .iter()
            .map(|column| {
                let column = quote(column);
                format!("{column}=VALUES({column})")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
            quote(&self.table),
            compiled.columns,
            compiled.sql,
            updates
        );
        Ok(Statement::finish("upsert", sql, compiled.values))
    }
}

/// Multi-row INSERT with bound values only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertMany {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub ignore: bool,
}

impl InsertMany {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            ignore: false,
        }
    }

    pub fn row<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn compile(&self) -> Result<Statement> {
        if self.columns.is_empty() {
            return Err(Error::argument("insert_many needs at least one column"));
        }
        if self.rows.is_empty() {
            return Err(Error::argument("insert_many needs at least one row"));
        }
        let width = self.columns.len();
        if let Some((index, row)) = self.rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(Error::argument(format!(
                "row {index} has {} values, expected {width}",
                row.len()
            )));
        }

        let tuple = format!("({})", vec!["?"; width].join(", "));
        let tuples = vec![tuple.as_str(); self.rows.len()].join(", ");
        let sql = format!(
            "INSERT{} INTO {} ({}) VALUES {}",
            if self.ignore { " IGNORE" } else { "" },
            quote(&self.table),
            quote_list(&self.columns),
            tuples
        );
        let values = self.rows.iter().flatten().cloned().collect();
        Ok(Statement::finish("insert_many", sql, values))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub table: String,
    pub values: Assignments,
    pub where_clause: Option<Condition>,
    pub joins: Vec<Join>,
}

impl Update {
    pub fn new(table: impl Into<String>, values: Assignments) -> Self {
        Self {
            table: table.into(),
            values,
            ..Self::default()
        }
    }

    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn compile(&self) -> Result<Statement> {
        let compiled = compile_values(&self.values, true)?;
        let mut sql = format!("UPDATE {}", TableRef::parse(&self.table).to_sql());
        push_joins(&mut sql, &self.joins)?;
        sql.push_str(" SET ");
        sql.push_str(&compiled.sql);

        // SET arguments come before WHERE arguments
        let mut values = compiled.values;
        push_predicate(&mut sql, &mut values, "WHERE", self.where_clause.as_ref())?;
        Ok(Statement::finish("update", sql, values))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delete {
    pub table: String,
    pub where_clause: Option<Condition>,
}

impl Delete {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            where_clause: None,
        }
    }

    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn compile(&self) -> Result<Statement> {
        let table = TableRef::parse(&self.table);
        let target = match &table.alias {
            Some(alias) => format!("{} ", quote(alias)),
            None => String::new(),
        };
        let mut sql = format!("DELETE {target}FROM {}", table.to_sql());
        let mut values = Vec::new();
        push_predicate(&mut sql, &mut values, "WHERE", self.where_clause.as_ref())?;
        Ok(Statement::finish("delete", sql, values))
    }
}

/// Any statement the assembler can build.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Select(Select),
    Insert(Insert),
    Upsert(Upsert),
    InsertMany(InsertMany),
    Update(Update),
    Delete(Delete),
}

impl Request {
    pub fn compile(&self) -> Result<Statement> {
        match self {
            Self::Select(select) => select.compile(),
            Self::Insert(insert) => insert.compile(),
            Self::Upsert(upsert) => upsert.compile(),
            Self::InsertMany(insert) => insert.compile(),
            Self::Update(update) => update.compile(),
            Self::Delete(delete) => delete.compile(),
        }
    }

    /// Whether the statement returns rows.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Select(_))
    }
}

impl From<Select> for Request {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

impl From<Insert> for Request {
    fn from(insert: Insert) -> Self {
        Self::Insert(insert)
    }
}

impl From<Upsert> for Request {
    fn from(upsert: Upsert) -> Self {
        Self::Upsert(upsert)
    }
}

impl From<InsertMany> for Request {
    fn from(insert: InsertMany) -> Self {
        Self::InsertMany(insert)
    }
}

impl From<Update> for Request {
    fn from(update: Update) -> Self {
        Self::Update(update)
    }
}

impl From<Delete> for Request {
    fn from(delete: Delete) -> Self {
        Self::Delete(delete)
    }
}
