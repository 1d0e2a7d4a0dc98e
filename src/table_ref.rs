//! 表引用解析器
//!
//! 表名字符串可以内嵌连接类型和别名:
//!
//! ```text
//! [<marker>]<identifier>(<alias>)
//!
//! [>]orders(o)   -> LEFT JOIN `orders` AS `o`
//! [<]orders      -> RIGHT JOIN `orders`
//! [<>]orders     -> FULL JOIN `orders`
//! [><]orders     -> INNER JOIN `orders`
//! users(u)       -> `users` AS `u`
//! ```
//!
//! 不符合该语法的字符串整体作为表名处理 (例如 `db.users`)。

use crate::quote::quote;

/// 连接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    None,
    Left,
    Right,
    Full,
    Inner,
}

impl JoinType {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "" => Some(Self::None),
            ">" => Some(Self::Left),
            "<" => Some(Self::Right),
            "<>" => Some(Self::Full),
            "><" => Some(Self::Inner),
            _ => None,
        }
    }

    /// `JOIN` 前面的关键字, 无类型时为 `None`
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Left => Some("LEFT"),
            Self::Right => Some("RIGHT"),
            Self::Full => Some("FULL"),
            Self::Inner => Some("INNER"),
        }
    }
}

/// 解析后的表引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub join_type: JoinType,
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// 解析表名字符串, 永不失败
    pub fn parse(input: &str) -> Self {
        let compact: String = input.chars().filter(|c| *c != ' ').collect();
        match Scanner::new(&compact).scan() {
            Some((join_type, name, alias)) => Self {
                join_type,
                name: name.to_string(),
                alias: alias.map(str::to_string),
            },
            None => Self {
                join_type: JoinType::None,
                name: input.to_string(),
                alias: None,
            },
        }
    }

    /// 可直接写入 SQL 的表引用, 有别名时带 `AS`
    pub fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", quote(&self.name), quote(alias)),
            None => quote(&self.name),
        }
    }
}

impl From<&str> for TableRef {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}

struct Scanner<'a> {
    input: &'a str,
    /// 当前位置（字节索引）
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 当前字符等于 `expected` 时消费它
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// 读取一个由字母、数字和下划线组成的单词（可以为空）
    fn read_word(&mut self) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        &self.input[start..self.position]
    }

    /// 读取 `[` 之后的连接标记，直到 `]`
    fn read_marker(&mut self) -> Option<JoinType> {
        let start = self.position;
        while matches!(self.peek(), Some('<' | '>')) {
            self.bump();
        }
        let marker = &self.input[start..self.position];
        if !self.eat(']') {
            return None;
        }
        JoinType::from_marker(marker)
    }

    fn scan(&mut self) -> Option<(JoinType, &'a str, Option<&'a str>)> {
        let join_type = if self.eat('[') {
            self.read_marker()?
        } else {
            JoinType::None
        };

        let name = self.read_word();
        if name.is_empty() {
            return None;
        }

        let mut alias = None;
        if self.eat('(') {
            let word = self.read_word();
            if !self.eat(')') {
                return None;
            }
            if !word.is_empty() {
                alias = Some(word);
            }
        }

        // 必须完整消费输入
        if self.peek().is_some() {
            return None;
        }
        Some((join_type, name, alias))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name() {
        let table = TableRef::parse("jobs");
        assert_eq!(table.join_type, JoinType::None);
        assert_eq!(table.name, "jobs");
        assert_eq!(table.alias, None);
        assert_eq!(table.to_sql(), "`jobs`");
    }

    #[test]
    fn test_join_markers() {
        assert_eq!(TableRef::parse("[>]t").join_type, JoinType::Left);
        assert_eq!(TableRef::parse("[<]t").join_type, JoinType::Right);
        assert_eq!(TableRef::parse("[<>]t").join_type, JoinType::Full);
        assert_eq!(TableRef::parse("[><]t").join_type, JoinType::Inner);
        assert_eq!(TableRef::parse("[]t").join_type, JoinType::None);
    }

    #[test]
    fn test_alias() {
        let table = TableRef::parse("[>]orders(o)");
        assert_eq!(table.join_type, JoinType::Left);
        assert_eq!(table.name, "orders");
        assert_eq!(table.alias.as_deref(), Some("o"));
        assert_eq!(table.to_sql(), "`orders` AS `o`");
    }

    #[test]
    fn test_empty_alias_is_ignored() {
        let table = TableRef::parse("users()");
        assert_eq!(table.alias, None);
        assert_eq!(table.to_sql(), "`users`");
    }

    #[test]
    fn test_spaces_are_ignored() {
        let table = TableRef::parse("[>] orders ( o )");
        assert_eq!(table.name, "orders");
        assert_eq!(table.alias.as_deref(), Some("o"));
    }

    #[test]
    fn test_non_matching_falls_back_to_whole_string() {
        let table = TableRef::parse("db.users");
        assert_eq!(table.join_type, JoinType::None);
        assert_eq!(table.name, "db.users");
        assert_eq!(table.to_sql(), "`db`.`users`");

        let table = TableRef::parse("[>>]t");
        assert_eq!(table.name, "[>>]t");

        let table = TableRef::parse("t(a");
        assert_eq!(table.name, "t(a");
    }
}
