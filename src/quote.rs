//! Backtick quoting of identifiers.
//!
//! Purely syntactic: names are never checked against a schema.

use crate::ast::Projection;

fn backtick(segment: &str) -> String {
    match segment {
        "" => String::new(),
        "*" => String::from("*"),
        s => format!("`{}`", s.replace('`', "``")),
    }
}

/// Quotes a column or table name.
///
/// `*` stays bare, `table.column` becomes `` `table`.`column` `` (split on the
/// first dot only) and a parenthesized tuple such as `(a, b)` is passed through.
pub fn quote(name: &str) -> String {
    if name.starts_with('(') && name.ends_with(')') {
        return name.to_string();
    }
    match name.split_once('.') {
        Some((table, rest)) => format!("{}.{}", backtick(table), backtick(rest)),
        None => backtick(name),
    }
}

/// Quotes every name and joins them with `, `.
pub fn quote_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| quote(name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a SELECT list; an empty list selects `*`.
pub fn quote_projections(columns: &[Projection]) -> String {
    if columns.is_empty() {
        return String::from("*");
    }
    columns
        .iter()
        .map(|column| match column {
            Projection::Column(name) => quote(name),
            Projection::Raw(expr) => expr.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_wildcard() {
        assert_eq!(quote("id"), "`id`");
        assert_eq!(quote("*"), "*");
    }

    #[test]
    fn test_dotted_names() {
        assert_eq!(quote("user.id"), "`user`.`id`");
        assert_eq!(quote("t.*"), "`t`.*");
        // only the first dot splits
        assert_eq!(quote("db.t.c"), "`db`.`t.c`");
    }

    #[test]
    fn test_tuple_passthrough() {
        assert_eq!(quote("(a, b)"), "(a, b)");
    }

    #[test]
    fn test_embedded_backtick_is_doubled() {
        assert_eq!(quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_lists() {
        assert_eq!(quote_list(["id", "value"]), "`id`, `value`");
        assert_eq!(quote_projections(&[]), "*");
        assert_eq!(
            quote_projections(&[
                Projection::from("u.name"),
                Projection::Raw("COUNT(*) AS n".to_string())
            ]),
            "`u`.`name`, COUNT(*) AS n"
        );
    }
}
