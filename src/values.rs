//! Value/assignment compiler for INSERT value lists and UPDATE SET clauses.

use std::collections::HashSet;

use sea_query::Value;

use crate::ast::{AssignValue, Assignments};
use crate::error::{Error, Result};
use crate::quote::quote;

/// Output of one pass over an assignment mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledValues {
    /// Quoted column list, in mapping order.
    pub columns: String,
    /// `?, NOW()` for inserts, `` `a` = ?, `b` = NOW() `` for assignments.
    pub sql: String,
    pub values: Vec<Value>,
    /// Bare column names, in mapping order.
    pub names: Vec<String>,
}

/// Compiles an assignment mapping.
///
/// The mapping is walked once; column list and value list come from the same
/// iteration so their order always agrees.
pub fn compile_values(assignments: &Assignments, as_assignment: bool) -> Result<CompiledValues> {
    if assignments.is_empty() {
        return Err(Error::argument("value mapping must not be empty"));
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(assignments.0.len());
    let mut parts = Vec::with_capacity(assignments.0.len());
    let mut values = Vec::new();
    let mut names = Vec::with_capacity(assignments.0.len());

    for assignment in assignments.iter() {
        if !seen.insert(assignment.column.as_str()) {
            return Err(Error::argument(format!(
                "column '{}' is assigned more than once",
                assignment.column
            )));
        }
        let column = quote(&assignment.column);
        let rhs = match &assignment.value {
            AssignValue::Raw(expr) => expr.clone(),
            AssignValue::Bind(value) => {
                values.push(value.clone());
                String::from("?")
            }
        };
        parts.push(if as_assignment {
            format!("{column} = {rhs}")
        } else {
            rhs
        });
        columns.push(column);
        names.push(assignment.column.clone());
    }

    Ok(CompiledValues {
        columns: columns.join(", "),
        sql: parts.join(", "),
        values,
        names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_values() {
        let assignments = Assignments::new()
            .set("value", "Teacher")
            .raw("created", "NOW()")
            .set("age", 30);
        let compiled = compile_values(&assignments, false).unwrap();
        assert_eq!(compiled.columns, "`value`, `created`, `age`");
        assert_eq!(compiled.sql, "?, NOW(), ?");
        assert_eq!(compiled.values, vec![Value::from("Teacher"), Value::from(30)]);
    }

    #[test]
    fn test_set_clause() {
        let assignments = Assignments::new()
            .set("value", "Teacher")
            .raw("uuid", "UUID()");
        let compiled = compile_values(&assignments, true).unwrap();
        assert_eq!(compiled.sql, "`value` = ?, `uuid` = UUID()");
        assert_eq!(compiled.values, vec![Value::from("Teacher")]);
    }

    #[test]
    fn test_raw_values_never_bound() {
        let assignments = Assignments::new().raw("a", "NOW()").raw("b", "NULL");
        let compiled = compile_values(&assignments, true).unwrap();
        assert!(compiled.values.is_empty());
        assert!(compiled.sql.contains("NOW()"));
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let result = compile_values(&Assignments::new(), false);
        assert!(matches!(result, Err(Error::Argument(_))));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let assignments = Assignments::new().set("a", 1).raw("a", "2");
        assert!(matches!(compile_values(&assignments, true), Err(Error::Argument(_))));
    }
}
