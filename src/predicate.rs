//! Predicate compiler: condition tree -> parenthesized SQL boolean expression.
//!
//! The output never carries the `WHERE` keyword, so the same fragment can be
//! used for `WHERE` and `HAVING`.

use sea_query::Value;
use tracing::trace;

use crate::ast::{Column, Condition, Key};
use crate::error::{Error, Result};
use crate::quote::quote;
use crate::token::{Connector, Operator};

/// A piece of SQL text together with the arguments for its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub values: Vec<Value>,
    /// Keyword joining the top-level clauses, `None` for a single clause.
    joined_by: Option<&'static str>,
}

impl Fragment {
    fn clause(sql: String, values: Vec<Value>) -> Self {
        Self {
            sql: format!("({sql})"),
            values,
            joined_by: None,
        }
    }

    fn group(self) -> Self {
        Self {
            sql: format!("({})", self.sql),
            values: self.values,
            joined_by: None,
        }
    }

    /// Joins sibling parts; a part joined by a different keyword is grouped
    /// first so precedence follows the tree.
    fn join(mut parts: Vec<Fragment>, keyword: &'static str) -> Self {
        if parts.len() == 1 {
            if let Some(part) = parts.pop() {
                return part;
            }
        }
        let mut out = Fragment {
            joined_by: Some(keyword),
            ..Fragment::default()
        };
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.sql.push(' ');
                out.sql.push_str(keyword);
                out.sql.push(' ');
            }
            let part = match part.joined_by {
                Some(inner) if inner != keyword => part.group(),
                _ => part,
            };
            out.sql.push_str(&part.sql);
            out.values.extend(part.values);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// State carried down the recursion.
#[derive(Debug, Clone, Copy, Default)]
struct Scope<'a> {
    operator: Option<Operator>,
    column: Option<&'a Column>,
    connector: Option<Connector>,
    negated: bool,
}

impl<'a> Scope<'a> {
    fn column(&self) -> Result<&'a Column> {
        self.column
            .ok_or_else(|| Error::argument("condition value has no column to compare against"))
    }
}

/// Compiles a condition tree. An empty tree yields an empty fragment.
pub fn compile(tree: &Condition) -> Result<Fragment> {
    if tree.is_empty() {
        return Ok(Fragment::default());
    }
    let fragment = combine(tree, Scope::default())?;
    trace!(sql = %fragment.sql, args = fragment.values.len(), "compiled predicate");
    Ok(fragment)
}

fn combine<'a>(node: &'a Condition, scope: Scope<'a>) -> Result<Fragment> {
    match node {
        Condition::Map(entries) => combine_map(entries, scope),
        Condition::List(items) => combine_list(items, scope),
        Condition::Null => null_clause(scope),
        Condition::Value(value) => scalar_clause(value, scope),
    }
}

fn combine_map<'a>(entries: &'a [(Key, Condition)], scope: Scope<'a>) -> Result<Fragment> {
    if entries.is_empty() {
        return Err(Error::argument("empty mapping inside a condition tree"));
    }
    let parts = entries
        .iter()
        .map(|(key, child)| match key {
            Key::Connector(connector) => combine(
                child,
                Scope {
                    connector: Some(*connector),
                    ..scope
                },
            )
            .map(Fragment::group),
            Key::Operator(operator) => combine(
                child,
                Scope {
                    operator: Some(*operator),
                    ..scope
                },
            ),
            Key::Not => combine(
                child,
                Scope {
                    negated: !scope.negated,
                    ..scope
                },
            ),
            Key::Column(column) => combine(
                child,
                Scope {
                    column: Some(column),
                    ..scope
                },
            ),
        })
        .collect::<Result<Vec<_>>>()?;

    // Keys of one mapping are always ANDed, whatever connector is active.
    Ok(Fragment::join(parts, Connector::And.keyword(scope.negated)))
}

fn combine_list<'a>(items: &'a [Condition], scope: Scope<'a>) -> Result<Fragment> {
    if items.is_empty() {
        return Err(Error::argument("empty sequence inside a condition tree"));
    }

    if items.iter().all(|item| matches!(item, Condition::Map(_))) {
        let parts = items
            .iter()
            .map(|item| combine(item, scope))
            .collect::<Result<Vec<_>>>()?;
        let connector = scope.connector.unwrap_or_default();
        return Ok(Fragment::join(parts, connector.keyword(scope.negated)));
    }

    let values = items
        .iter()
        .map(|item| match item {
            Condition::Value(value) => Ok(value),
            _ => Err(Error::argument(
                "a sequence must hold either only mappings or only scalar values",
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    value_list_clause(&values, scope)
}

/// Placeholder for a bound value, or the value itself for a raw column.
fn operand(column: &Column, value: &Value, values: &mut Vec<Value>) -> Result<String> {
    if column.raw {
        raw_sql(value)
    } else {
        values.push(value.clone());
        Ok(String::from("?"))
    }
}

/// Text of a value spliced verbatim into SQL.
pub(crate) fn raw_sql(value: &Value) -> Result<String> {
    let text = match value {
        Value::String(Some(s)) => s.to_string(),
        Value::Bool(Some(b)) => String::from(if *b { "TRUE" } else { "FALSE" }),
        Value::TinyInt(Some(n)) => n.to_string(),
        Value::SmallInt(Some(n)) => n.to_string(),
        Value::Int(Some(n)) => n.to_string(),
        Value::BigInt(Some(n)) => n.to_string(),
        Value::TinyUnsigned(Some(n)) => n.to_string(),
        Value::SmallUnsigned(Some(n)) => n.to_string(),
        Value::Unsigned(Some(n)) => n.to_string(),
        Value::BigUnsigned(Some(n)) => n.to_string(),
        Value::Float(Some(f)) => f.to_string(),
        Value::Double(Some(f)) => f.to_string(),
        other => {
            return Err(Error::argument(format!(
                "value {other:?} cannot be used as a raw SQL expression"
            )))
        }
    };
    Ok(text)
}

fn value_list_clause(items: &[&Value], scope: Scope<'_>) -> Result<Fragment> {
    let column = scope.column()?;
    let name = quote(&column.name);
    let negated = scope.negated;

    let mut values = Vec::with_capacity(items.len());
    let operands = items
        .iter()
        .map(|value| operand(column, value, &mut values))
        .collect::<Result<Vec<_>>>()?;

    let sql = match scope.operator {
        None | Some(Operator::Eq | Operator::In) => {
            format!("{name} {} ({})", Operator::In.symbol(negated), operands.join(", "))
        }
        Some(Operator::Ne) => {
            format!("{name} {} ({})", Operator::In.symbol(!negated), operands.join(", "))
        }
        Some(Operator::Between) => {
            if operands.len() != 2 {
                return Err(Error::argument(format!(
                    "BETWEEN expects exactly 2 values, got {}",
                    operands.len()
                )));
            }
            format!(
                "{name} {} {} AND {}",
                Operator::Between.symbol(negated),
                operands[0],
                operands[1]
            )
        }
        Some(Operator::Like) => {
            // any of the patterns; none of them when negated
            let symbol = Operator::Like.symbol(negated);
            let joiner = format!(" {} ", Connector::Or.keyword(negated));
            operands
                .iter()
                .map(|operand| format!("({name} {symbol} {operand})"))
                .collect::<Vec<_>>()
                .join(&joiner)
        }
        Some(operator) => {
            return Err(Error::argument(format!(
                "operator {} does not accept a list of values",
                operator.symbol(false)
            )))
        }
    };
    Ok(Fragment::clause(sql, values))
}

fn null_clause(scope: Scope<'_>) -> Result<Fragment> {
    let column = scope.column()?;
    let negated = match scope.operator {
        None | Some(Operator::Eq | Operator::Is) => scope.negated,
        Some(Operator::Ne) => !scope.negated,
        Some(operator) => {
            return Err(Error::argument(format!(
                "NULL cannot be compared with {}",
                operator.symbol(false)
            )))
        }
    };
    let sql = format!("{} {} NULL", quote(&column.name), Operator::Is.symbol(negated));
    Ok(Fragment::clause(sql, Vec::new()))
}

fn scalar_clause(value: &Value, scope: Scope<'_>) -> Result<Fragment> {
    let column = scope.column()?;
    let operator = scope.operator.unwrap_or(Operator::Eq);
    let name = quote(&column.name);

    if operator == Operator::Is && !column.raw {
        // IS only takes literal truth values, never a placeholder
        let literal = match value {
            Value::Bool(Some(true)) => "TRUE",
            Value::Bool(Some(false)) => "FALSE",
            other => {
                return Err(Error::argument(format!(
                    "IS expects true, false or null, got {other:?}"
                )))
            }
        };
        let sql = format!("{name} {} {literal}", operator.symbol(scope.negated));
        return Ok(Fragment::clause(sql, Vec::new()));
    }

    let mut values = Vec::with_capacity(1);
    let operand = operand(column, value, &mut values)?;

    let sql = match operator {
        Operator::Between => {
            return Err(Error::argument("BETWEEN expects a list of exactly 2 values"));
        }
        Operator::In => format!("{name} {} ({operand})", operator.symbol(scope.negated)),
        _ => format!("{name} {} {operand}", operator.symbol(scope.negated)),
    };
    Ok(Fragment::clause(sql, values))
}
