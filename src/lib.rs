//! Compiles nested condition/value mappings into parameterized MySQL statements.
//!
//! ```text
//! {"id": 5, "value": "Teacher"}  ->  (`id` = ?) AND (`value` = ?)   [5, "Teacher"]
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod join;
pub mod parser;
pub mod predicate;
pub mod quote;
pub mod session;
pub mod statement;
pub mod table_ref;
pub mod token;
pub mod values;

pub use ast::{Assignments, ByClause, Column, Condition, Having, Key, Limit, Projection};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use join::Join;
pub use parser::Parser;
pub use session::{ExecResult, Executor, Get, Mode, Outcome, Row, Session};
pub use statement::{Delete, Insert, InsertMany, Request, Select, Statement, Update, Upsert};
pub use token::{Connector, Operator};
