//! Execution boundary.
//!
//! The compilers never talk to a database; a [`Session`] hands compiled
//! statements to an [`Executor`] supplied by the caller, or only renders them
//! when running in [`Mode::RenderOnly`].

use sea_query::Value;
use serde::Deserialize;
use tracing::{debug, info};

use crate::ast::{Assignments, Condition, Key, Limit, Projection};
use crate::error::{Error, Result};
use crate::join::Join;
use crate::predicate::raw_sql;
use crate::statement::{Insert, Request, Select, Statement};
use crate::table_ref::TableRef;

/// One result row, values in column order.
pub type Row = Vec<Value>;

/// Result of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

/// A database driver.
pub trait Executor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&mut self, sql: &str, args: &[Value]) -> std::result::Result<ExecResult, Self::Error>;

    fn fetch_one(&mut self, sql: &str, args: &[Value]) -> std::result::Result<Option<Row>, Self::Error>;

    fn fetch_all(&mut self, sql: &str, args: &[Value]) -> std::result::Result<Vec<Row>, Self::Error>;

    fn commit(&mut self) -> std::result::Result<(), Self::Error>;

    fn rollback(&mut self) -> std::result::Result<(), Self::Error>;
}

/// Whether statements are executed or only rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Execute,
    RenderOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// SQL with arguments inlined; nothing was executed.
    Rendered(String),
    Rows(Vec<Row>),
    Written(ExecResult),
    /// First column of the first row, `None` when no row matched.
    Scalar(Option<Value>),
}

/// Fetches a single value of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Get {
    pub table: String,
    pub column: String,
    pub joins: Vec<Join>,
    pub where_clause: Option<Condition>,
    /// Insert the (flat) where mapping when no row matches.
    pub insert_if_missing: bool,
    /// Fail with this message when no row matches. Takes precedence over
    /// `insert_if_missing`.
    pub if_none: Option<String>,
}

impl Get {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            joins: Vec::new(),
            where_clause: None,
            insert_if_missing: false,
            if_none: None,
        }
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn insert_if_missing(mut self) -> Self {
        self.insert_if_missing = true;
        self
    }

    pub fn if_none(mut self, message: impl Into<String>) -> Self {
        self.if_none = Some(message.into());
        self
    }

    fn to_select(&self) -> Select {
        Select {
            table: self.table.clone(),
            columns: vec![Projection::Column(self.column.clone())],
            joins: self.joins.clone(),
            where_clause: self.where_clause.clone(),
            limit: Some(Limit::Count(1)),
            ..Select::default()
        }
    }

    /// The INSERT issued when nothing matched.
    fn to_insert(&self) -> Result<Insert> {
        let Some(condition) = &self.where_clause else {
            return Err(Error::argument("insert_if_missing needs a where mapping"));
        };
        if !condition.is_flat() {
            return Err(Error::argument(
                "insert_if_missing does not support nested where conditions",
            ));
        }
        let Condition::Map(entries) = condition else {
            return Err(Error::argument("insert_if_missing needs a where mapping"));
        };

        let mut values = Assignments::new();
        for (key, leaf) in entries {
            let Key::Column(column) = key else {
                continue;
            };
            values = match leaf {
                Condition::Value(value) if column.raw => values.raw(&column.name, raw_sql(value)?),
                Condition::Value(value) => values.set(&column.name, value.clone()),
                _ => values.set(&column.name, Value::String(None)),
            };
        }
        Ok(Insert::new(TableRef::parse(&self.table).name, values))
    }
}

/// Compiles requests and runs them through an [`Executor`].
pub struct Session<E> {
    executor: E,
    commit_writes: bool,
    last_statement: Option<Statement>,
}

impl<E: Executor> Session<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            commit_writes: true,
            last_statement: None,
        }
    }

    /// Commit after every write statement (on by default).
    pub fn commit_writes(mut self, enabled: bool) -> Self {
        self.commit_writes = enabled;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Rendered text of the last statement this session compiled or ran.
    /// Rendering happens here, never on the execution path.
    pub fn last_query(&self) -> Option<String> {
        self.last_statement.as_ref().map(Statement::render)
    }

    pub fn run(&mut self, request: &Request, mode: Mode) -> Result<Outcome> {
        let statement = request.compile()?;
        if mode == Mode::RenderOnly {
            let rendered = statement.render();
            self.last_statement = Some(statement);
            return Ok(Outcome::Rendered(rendered));
        }
        let statement = self.last_statement.insert(statement);

        if request.is_query() {
            let rows = self
                .executor
                .fetch_all(&statement.sql, &statement.values)
                .map_err(Error::driver)?;
            debug!(rows = rows.len(), "query finished");
            return Ok(Outcome::Rows(rows));
        }

        let result = self
            .executor
            .execute(&statement.sql, &statement.values)
            .map_err(Error::driver)?;
        if self.commit_writes {
            self.executor.commit().map_err(Error::driver)?;
        }
        debug!(
            rows_affected = result.rows_affected,
            last_insert_id = ?result.last_insert_id,
            "write finished"
        );
        Ok(Outcome::Written(result))
    }

    pub fn get(&mut self, get: &Get, mode: Mode) -> Result<Outcome> {
        let request = Request::Select(get.to_select());
        if mode == Mode::RenderOnly {
            return self.run(&request, mode);
        }

        let statement = self.last_statement.insert(request.compile()?);
        let row = self
            .executor
            .fetch_one(&statement.sql, &statement.values)
            .map_err(Error::driver)?;
        if let Some(row) = row {
            return Ok(Outcome::Scalar(row.into_iter().next()));
        }

        if let Some(message) = &get.if_none {
            return Err(Error::EmptyResultPolicy(message.clone()));
        }
        if get.insert_if_missing {
            info!(table = %get.table, "no row matched, inserting");
            return self.run(&Request::Insert(get.to_insert()?), mode);
        }
        Ok(Outcome::Scalar(None))
    }

    /// Runs caller-written SQL unchanged.
    pub fn query(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        self.last_statement = Some(Statement {
            sql: sql.to_string(),
            values: args.to_vec(),
        });
        self.executor.fetch_all(sql, args).map_err(Error::driver)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.executor.commit().map_err(Error::driver)
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.executor.rollback().map_err(Error::driver)
    }
}
