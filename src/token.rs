//! The keyword vocabulary of condition trees.
//!
//! Keywords are resolved once, when a request is parsed, so the compilers only
//! ever see these closed enums.

/// A comparison or membership operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,      // =
    Ne,      // <>
    Lt,      // <
    Lte,     // <=
    Gt,      // >
    Gte,     // >=
    Like,    // LIKE
    Between, // BETWEEN
    In,      // IN
    Is,      // IS
}

impl Operator {
    /// Resolves an operator keyword with its prefix already stripped.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let op = match word.to_ascii_uppercase().as_str() {
            "=" | "EQ" => Self::Eq,
            "<>" | "!=" | "NE" => Self::Ne,
            "<" | "LT" => Self::Lt,
            "<=" | "LTE" => Self::Lte,
            ">" | "GT" => Self::Gt,
            ">=" | "GTE" => Self::Gte,
            "LIKE" => Self::Like,
            "BETWEEN" => Self::Between,
            "IN" => Self::In,
            "IS" => Self::Is,
            _ => return None,
        };
        Some(op)
    }

    /// SQL text of the operator, or of its counterpart when `negated`.
    pub fn symbol(self, negated: bool) -> &'static str {
        match (self, negated) {
            (Self::Eq, false) | (Self::Ne, true) => "=",
            (Self::Ne, false) | (Self::Eq, true) => "<>",
            (Self::Lt, false) | (Self::Gte, true) => "<",
            (Self::Gte, false) | (Self::Lt, true) => ">=",
            (Self::Gt, false) | (Self::Lte, true) => ">",
            (Self::Lte, false) | (Self::Gt, true) => "<=",
            (Self::Like, false) => "LIKE",
            (Self::Like, true) => "NOT LIKE",
            (Self::Between, false) => "BETWEEN",
            (Self::Between, true) => "NOT BETWEEN",
            (Self::In, false) => "IN",
            (Self::In, true) => "NOT IN",
            (Self::Is, false) => "IS",
            (Self::Is, true) => "IS NOT",
        }
    }

    /// Operators allowed between two columns in a JOIN condition.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte
        )
    }
}

/// Combinator joining sibling clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    /// SQL keyword, swapped AND<->OR when `negated`.
    pub fn keyword(self, negated: bool) -> &'static str {
        match (self, negated) {
            (Self::And, false) | (Self::Or, true) => "AND",
            (Self::Or, false) | (Self::And, true) => "OR",
        }
    }
}

/// Any reserved key of a condition mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Connector(Connector),
    Operator(Operator),
    Not,
}

impl Keyword {
    /// Resolves a keyword with its prefix already stripped. Case-insensitive.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::Connector(Connector::And)),
            "OR" => Some(Self::Connector(Connector::Or)),
            "NOT" => Some(Self::Not),
            _ => Operator::from_keyword(word).map(Self::Operator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_spellings() {
        assert_eq!(Operator::from_keyword("<"), Some(Operator::Lt));
        assert_eq!(Operator::from_keyword("lt"), Some(Operator::Lt));
        assert_eq!(Operator::from_keyword("!="), Some(Operator::Ne));
        assert_eq!(Operator::from_keyword("Between"), Some(Operator::Between));
        assert_eq!(Operator::from_keyword("regex"), None);
    }

    #[test]
    fn test_negated_symbols() {
        let pairs = [
            (Operator::Eq, "<>"),
            (Operator::Ne, "="),
            (Operator::Lt, ">="),
            (Operator::Gte, "<"),
            (Operator::Gt, "<="),
            (Operator::Lte, ">"),
            (Operator::Like, "NOT LIKE"),
            (Operator::Between, "NOT BETWEEN"),
            (Operator::In, "NOT IN"),
            (Operator::Is, "IS NOT"),
        ];
        for (op, negated) in pairs {
            assert_eq!(op.symbol(true), negated, "{op:?}");
        }
    }

    #[test]
    fn test_connector_swaps_under_negation() {
        assert_eq!(Connector::And.keyword(false), "AND");
        assert_eq!(Connector::And.keyword(true), "OR");
        assert_eq!(Connector::Or.keyword(true), "AND");
        assert_eq!(Connector::default(), Connector::And);
    }

    #[test]
    fn test_keyword_parse() {
        assert_eq!(Keyword::parse("or"), Some(Keyword::Connector(Connector::Or)));
        assert_eq!(Keyword::parse("NOT"), Some(Keyword::Not));
        assert_eq!(Keyword::parse(">="), Some(Keyword::Operator(Operator::Gte)));
        assert_eq!(Keyword::parse("XOR"), None);
    }
}
