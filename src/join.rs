//! JOIN clause compiler. Join conditions compare columns only, so no
//! arguments are produced.

use crate::error::{Error, Result};
use crate::quote::quote;
use crate::table_ref::TableRef;
use crate::token::Operator;

/// `left <op> right` between two columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left: String,
    pub operator: Operator,
    pub right: String,
}

/// One joined table with its ON conditions (ANDed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: TableRef,
    pub on: Vec<JoinCondition>,
}

impl Join {
    /// `table` uses the compact table-reference syntax, e.g. `[>]orders(o)`.
    pub fn new(table: &str) -> Self {
        Self {
            table: TableRef::parse(table),
            on: Vec::new(),
        }
    }

    /// Adds `left = right`.
    pub fn on(self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.on_op(left, Operator::Eq, right)
    }

    /// Adds `left <operator> right`.
    pub fn on_op(mut self, left: impl Into<String>, operator: Operator, right: impl Into<String>) -> Self {
        self.on.push(JoinCondition {
            left: left.into(),
            operator,
            right: right.into(),
        });
        self
    }
}

fn compile_join(join: &Join) -> Result<String> {
    if join.on.is_empty() {
        return Err(Error::argument(format!(
            "join on '{}' has no ON condition",
            join.table.name
        )));
    }
    let conditions = join
        .on
        .iter()
        .map(|cond| {
            if !cond.operator.is_comparison() {
                return Err(Error::UnsupportedOperator(format!(
                    "{} is not allowed in a JOIN condition",
                    cond.operator.symbol(false)
                )));
            }
            Ok(format!(
                "{} {} {}",
                quote(&cond.left),
                cond.operator.symbol(false),
                quote(&cond.right)
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let keyword = match join.table.join_type.keyword() {
        Some(kind) => format!("{kind} JOIN"),
        None => String::from("JOIN"),
    };
    Ok(format!(
        "{keyword} {} ON {}",
        join.table.to_sql(),
        conditions.join(" AND ")
    ))
}

/// Compiles joins in the given order, separated by single spaces.
pub fn compile_joins(joins: &[Join]) -> Result<String> {
    Ok(joins
        .iter()
        .map(compile_join)
        .collect::<Result<Vec<_>>>()?
        .join(" "))
}
