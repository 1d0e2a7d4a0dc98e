use sea_query::Value;
use serde::Deserialize;

use crate::token::{Connector, Operator};

/// 条件树, 即 WHERE / HAVING 子句的声明式表示
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// 有序映射: 列名或关键字 -> 子条件
    Map(Vec<(Key, Condition)>),
    /// 序列: 兄弟条件组, 或者标量值列表 (IN / BETWEEN / LIKE)
    List(Vec<Condition>),
    /// 标量叶子节点, 总是占用一个参数位置
    Value(Value),
    /// 空值叶子节点, 生成 IS [NOT] NULL, 不占用参数
    Null,
}

/// 映射中的键
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Connector(Connector),
    Operator(Operator),
    Not,
    Column(Column),
}

/// 条件或赋值中引用的列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// 右侧的值是原始 SQL, 原样输出且不绑定参数
    pub raw: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), raw: false }
    }

    pub fn raw(name: impl Into<String>) -> Self {
        Self { name: name.into(), raw: true }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Condition {
    /// `{column: condition}`
    pub fn column(column: impl Into<Column>, condition: impl Into<Condition>) -> Self {
        Self::Map(vec![(Key::Column(column.into()), condition.into())])
    }

    /// `{$op: condition}`
    pub fn op(operator: Operator, condition: impl Into<Condition>) -> Self {
        Self::Map(vec![(Key::Operator(operator), condition.into())])
    }

    /// `{$NOT: condition}`
    pub fn not(condition: impl Into<Condition>) -> Self {
        Self::Map(vec![(Key::Not, condition.into())])
    }

    /// `{$AND: [...]}`
    pub fn and<I: IntoIterator<Item = Condition>>(items: I) -> Self {
        Self::Map(vec![(Key::Connector(Connector::And), Self::List(items.into_iter().collect()))])
    }

    /// `{$OR: [...]}`
    pub fn or<I: IntoIterator<Item = Condition>>(items: I) -> Self {
        Self::Map(vec![(Key::Connector(Connector::Or), Self::List(items.into_iter().collect()))])
    }

    /// 标量值列表
    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(values.into_iter().map(|v| Self::Value(v.into())).collect())
    }

    /// 一个按顺序排列的多键映射
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Condition)>,
        K: Into<Key>,
    {
        Self::Map(entries.into_iter().map(|(k, c)| (k.into(), c)).collect())
    }

    /// 空映射或空列表表示没有条件
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(entries) => entries.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Value(_) | Self::Null => false,
        }
    }

    /// 是否只包含 `列 -> 标量/空值` 的一层映射
    pub fn is_flat(&self) -> bool {
        match self {
            Self::Map(entries) => entries.iter().all(|(key, value)| {
                matches!(key, Key::Column(_)) && matches!(value, Self::Value(_) | Self::Null)
            }),
            _ => false,
        }
    }
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Condition {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for Condition {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<f64> for Condition {
    fn from(value: f64) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl<T: Into<Condition>> From<Option<T>> for Condition {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&str> for Key {
    fn from(column: &str) -> Self {
        Self::Column(Column::new(column))
    }
}

impl From<Column> for Key {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<Operator> for Key {
    fn from(operator: Operator) -> Self {
        Self::Operator(operator)
    }
}

impl From<Connector> for Key {
    fn from(connector: Connector) -> Self {
        Self::Connector(connector)
    }
}

/// 赋值右侧
#[derive(Debug, Clone, PartialEq)]
pub enum AssignValue {
    /// 作为参数绑定
    Bind(Value),
    /// 原始 SQL 表达式, 例如 `NOW()`
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: AssignValue,
}

/// 列 -> 值 的有序映射, 用于 INSERT 和 UPDATE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments(pub Vec<Assignment>);

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定一个参数值
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push(Assignment {
            column: column.into(),
            value: AssignValue::Bind(value.into()),
        });
        self
    }

    /// 原样写入一个 SQL 表达式
    pub fn raw(mut self, column: impl Into<String>, expr: impl Into<String>) -> Self {
        self.0.push(Assignment {
            column: column.into(),
            value: AssignValue::Raw(expr.into()),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.0.iter()
    }
}

/// SELECT 列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// 需要加反引号的列名
    Column(String),
    /// 原样输出的表达式, 例如 `COUNT(*) AS n`
    Raw(String),
}

impl From<&str> for Projection {
    fn from(name: &str) -> Self {
        Self::Column(name.to_string())
    }
}

/// GROUP BY / ORDER BY 的参数
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByClause {
    /// 原样输出, 例如 `"id DESC"`
    Raw(String),
    Columns(Vec<String>),
}

/// HAVING 子句
#[derive(Debug, Clone, PartialEq)]
pub enum Having {
    /// 原样输出, 例如 `"COUNT(*) > 5"`
    Raw(String),
    Condition(Condition),
}

impl From<Condition> for Having {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<&str> for Having {
    fn from(expr: &str) -> Self {
        Self::Raw(expr.to_string())
    }
}

/// LIMIT 子句
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Limit {
    Count(u64),
    /// `[offset, count]`
    Range(u64, u64),
}
