//! 请求的语法分析器 (JSON 前端)
//!
//! ## 解析流程图
//!
//! ```text
//! parse_str()
//!   └─ parse_request()
//!        ├─ 按操作名分派: select / insert / upsert / insert_many / update / delete
//!        ├─ "having" 为字符串时原样输出, 否则同 "where"
//!        ├─ "where" → parse_condition() (递归)
//!        │    ├─ 对象 → 有序映射, 每个键经过 parse_key()
//!        │    │    ├─ "$" 前缀 → 关键字 ($AND, $OR, $NOT, $<, $IN ...)
//!        │    │    ├─ "#" 前缀 → 原始SQL列
//!        │    │    └─ 其他     → 普通列名
//!        │    ├─ 数组 → 兄弟条件组或值列表
//!        │    ├─ null → 空值叶子
//!        │    └─ 标量 → 参数值
//!        ├─ "value"  → parse_assignments()
//!        └─ "join"   → parse_joins()
//! ```
//!
//! ## 请求示例
//!
//! ```text
//! {"select": {"table": "jobs", "columns": ["id"], "where": {"id": {"$<": 5}}}}
//! {"insert": {"table": "jobs", "value": {"value": "Teacher", "#created": "NOW()"}}}
//! {"update": {"table": "jobs", "value": {"value": "x"}, "where": {"$OR": [{"a": 1}, {"b": 2}]}}}
//! ```
//!
//! 对象的键顺序会被保留 (serde_json 的 `preserve_order` 特性),
//! 因此生成的SQL和参数顺序与输入一致。

use sea_query::Value;
use serde::Deserialize;
use serde_json::{Map, Value as Json};

use crate::ast::{Assignments, ByClause, Column, Condition, Having, Key, Limit, Projection};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::join::Join;
use crate::predicate::raw_sql;
use crate::statement::{Delete, Insert, InsertMany, Request, Select, Update, Upsert};
use crate::token::Keyword;

pub struct Parser<'a> {
    config: &'a Config,
}

/// `"columns"` 可以是单个字符串或字符串数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Columns {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawRequest {
    Select(RawSelect),
    Insert(RawInsert),
    Upsert(RawUpsert),
    InsertMany(RawInsertMany),
    Update(RawUpdate),
    Delete(RawDelete),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSelect {
    table: String,
    #[serde(default)]
    columns: Option<Columns>,
    #[serde(default)]
    join: Option<Json>,
    #[serde(default, rename = "where")]
    where_clause: Option<Json>,
    #[serde(default)]
    group: Option<ByClause>,
    #[serde(default)]
    having: Option<Json>,
    #[serde(default)]
    order: Option<ByClause>,
    #[serde(default)]
    limit: Option<Limit>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInsert {
    table: String,
    value: Json,
    #[serde(default)]
    ignore: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUpsert {
    table: String,
    value: Json,
    #[serde(default)]
    update_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInsertMany {
    table: String,
    columns: Vec<String>,
    values: Vec<Vec<Json>>,
    #[serde(default)]
    ignore: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUpdate {
    table: String,
    value: Json,
    #[serde(default, rename = "where")]
    where_clause: Option<Json>,
    #[serde(default)]
    join: Option<Json>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDelete {
    table: String,
    #[serde(default, rename = "where")]
    where_clause: Option<Json>,
}

impl<'a> Parser<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// 解析一行JSON文本
    pub fn parse_str(&self, input: &str) -> Result<Request> {
        let json: Json = serde_json::from_str(input)
            .map_err(|e| Error::argument(format!("invalid request: {e}")))?;
        self.parse_request(&json)
    }

    pub fn parse_request(&self, json: &Json) -> Result<Request> {
        let raw: RawRequest = serde_json::from_value(json.clone())
            .map_err(|e| Error::argument(format!("invalid request: {e}")))?;

        let request = match raw {
            RawRequest::Select(raw) => Request::Select(Select {
                table: raw.table,
                columns: self.parse_projections(raw.columns),
                joins: self.parse_optional_joins(raw.join.as_ref())?,
                where_clause: self.parse_optional_condition(raw.where_clause.as_ref())?,
                group: raw.group,
                having: self.parse_having(raw.having.as_ref())?,
                order: raw.order,
                limit: raw.limit,
            }),
            RawRequest::Insert(raw) => Request::Insert(Insert {
                table: raw.table,
                values: self.parse_assignments(&raw.value)?,
                ignore: raw.ignore,
            }),
            RawRequest::Upsert(raw) => Request::Upsert(Upsert {
                table: raw.table,
                values: self.parse_assignments(&raw.value)?,
                update_columns: raw.update_columns.map(|columns| {
                    columns
                        .into_iter()
                        .map(|column| self.strip_marker(column))
                        .collect()
                }),
            }),
            RawRequest::InsertMany(raw) => Request::InsertMany(InsertMany {
                table: raw.table,
                columns: raw.columns,
                rows: raw
                    .values
                    .iter()
                    .map(|row| row.iter().map(parse_scalar).collect::<Result<Vec<_>>>())
                    .collect::<Result<Vec<_>>>()?,
                ignore: raw.ignore,
            }),
            RawRequest::Update(raw) => Request::Update(Update {
                table: raw.table,
                values: self.parse_assignments(&raw.value)?,
                where_clause: self.parse_optional_condition(raw.where_clause.as_ref())?,
                joins: self.parse_optional_joins(raw.join.as_ref())?,
            }),
            RawRequest::Delete(raw) => Request::Delete(Delete {
                table: raw.table,
                where_clause: self.parse_optional_condition(raw.where_clause.as_ref())?,
            }),
        };
        Ok(request)
    }

    /// 递归解析条件树
    pub fn parse_condition(&self, json: &Json) -> Result<Condition> {
        match json {
            Json::Object(map) => Ok(Condition::Map(
                map.iter()
                    .map(|(key, child)| Ok((self.parse_key(key)?, self.parse_condition(child)?)))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Json::Array(items) => Ok(Condition::List(
                items
                    .iter()
                    .map(|item| self.parse_condition(item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Json::Null => Ok(Condition::Null),
            scalar => parse_scalar(scalar).map(Condition::Value),
        }
    }

    /// 解析 列 -> 值 映射, `#` 前缀的列的值原样写入SQL
    pub fn parse_assignments(&self, json: &Json) -> Result<Assignments> {
        let Json::Object(map) = json else {
            return Err(Error::argument(format!(
                "value must be an object of column -> value, got {json}"
            )));
        };

        let mut assignments = Assignments::new();
        for (key, value) in map {
            assignments = match key.strip_prefix(self.config.escape_marker) {
                Some(column) => {
                    let expr = match value {
                        Json::Null => String::from("NULL"),
                        other => raw_sql(&parse_scalar(other)?)?,
                    };
                    assignments.raw(column, expr)
                }
                None => assignments.set(key.as_str(), parse_scalar(value)?),
            };
        }
        Ok(assignments)
    }

    /// 解析 `{"[>]table(alias)": {"left": "right", "left2": {"$<": "right2"}}}`
    pub fn parse_joins(&self, json: &Json) -> Result<Vec<Join>> {
        let Json::Object(map) = json else {
            return Err(Error::argument("join must be an object of table -> conditions"));
        };
        map.iter()
            .map(|(table, on)| self.parse_join(table, on))
            .collect()
    }

    fn parse_join(&self, table: &str, on: &Json) -> Result<Join> {
        let Json::Object(on) = on else {
            return Err(Error::argument(format!(
                "join on '{table}' must map left columns to right columns"
            )));
        };
        let mut join = Join::new(table);
        for (left, right) in on {
            join = match right {
                Json::String(right) => join.on(left.as_str(), right.as_str()),
                Json::Object(ops) => self.parse_join_operators(join, left, ops)?,
                other => {
                    return Err(Error::argument(format!(
                        "join column '{left}' has invalid right side {other}"
                    )))
                }
            };
        }
        Ok(join)
    }

    fn parse_join_operators(&self, mut join: Join, left: &str, ops: &Map<String, Json>) -> Result<Join> {
        for (key, right) in ops {
            let Key::Operator(operator) = self.parse_key(key)? else {
                return Err(Error::UnsupportedOperator(key.clone()));
            };
            let Json::String(right) = right else {
                return Err(Error::argument(format!(
                    "join column '{left}' must compare against a column name"
                )));
            };
            join = join.on_op(left, operator, right.as_str());
        }
        Ok(join)
    }

    /// 解析映射中的键
    fn parse_key(&self, key: &str) -> Result<Key> {
        if let Some(word) = key.strip_prefix(self.config.keyword_prefix) {
            return match Keyword::parse(word) {
                Some(Keyword::Connector(connector)) => Ok(Key::Connector(connector)),
                Some(Keyword::Operator(operator)) => Ok(Key::Operator(operator)),
                Some(Keyword::Not) => Ok(Key::Not),
                None => Err(Error::UnsupportedOperator(key.to_string())),
            };
        }
        if let Some(column) = key.strip_prefix(self.config.escape_marker) {
            return Ok(Key::Column(Column::raw(column)));
        }
        Ok(Key::Column(Column::new(key)))
    }

    fn parse_projections(&self, columns: Option<Columns>) -> Vec<Projection> {
        let columns = match columns {
            None => return Vec::new(),
            Some(Columns::One(column)) => vec![column],
            Some(Columns::Many(columns)) => columns,
        };
        // 单独的 "*" 等同于不指定列
        if columns.len() == 1 && columns[0] == "*" {
            return Vec::new();
        }
        columns
            .into_iter()
            .map(|column| match column.strip_prefix(self.config.escape_marker) {
                Some(expr) => Projection::Raw(expr.to_string()),
                None => Projection::Column(column),
            })
            .collect()
    }

    /// 去掉列名前的转义标记
    fn strip_marker(&self, column: String) -> String {
        match column.strip_prefix(self.config.escape_marker) {
            Some(bare) => bare.to_string(),
            None => column,
        }
    }

    /// 字符串为原始SQL, 其他为条件树
    fn parse_having(&self, json: Option<&Json>) -> Result<Option<Having>> {
        match json {
            None => Ok(None),
            Some(Json::String(expr)) => Ok(Some(Having::Raw(expr.clone()))),
            Some(json) => self.parse_condition(json).map(|c| Some(Having::Condition(c))),
        }
    }

    fn parse_optional_condition(&self, json: Option<&Json>) -> Result<Option<Condition>> {
        json.map(|json| self.parse_condition(json)).transpose()
    }

    fn parse_optional_joins(&self, json: Option<&Json>) -> Result<Vec<Join>> {
        match json {
            Some(json) => self.parse_joins(json),
            None => Ok(Vec::new()),
        }
    }
}

/// JSON 标量 -> 参数值, null 变成 NULL 参数
fn parse_scalar(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::String(None)),
        Json::Bool(b) => Ok(Value::from(*b)),
        Json::String(s) => Ok(Value::from(s.as_str())),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::from(f))
            } else {
                Err(Error::argument(format!("unsupported number {n}")))
            }
        }
        other => Err(Error::argument(format!("expected a scalar value, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Connector, Operator};

    fn parse(input: &str) -> Result<Request> {
        Parser::new(&Config::default()).parse_str(input)
    }

    fn compile(input: &str) -> (String, Vec<Value>) {
        let statement = parse(input).unwrap().compile().unwrap();
        (statement.sql, statement.values)
    }

    #[test]
    fn test_parse_select_scenario() {
        let (sql, values) = compile(
            r#"{"select": {"table": "jobs", "columns": ["id", "value"],
                "where": {"id": 5, "value": "Teacher"}}}"#,
        );
        assert_eq!(
            sql,
            "SELECT `id`, `value` FROM `jobs` WHERE (`id` = ?) AND (`value` = ?)"
        );
        assert_eq!(values, vec![Value::from(5i64), Value::from("Teacher")]);
    }

    #[test]
    fn test_key_order_is_preserved() {
        let (sql, values) = compile(r#"{"delete": {"table": "t", "where": {"z": 1, "a": 2}}}"#);
        assert_eq!(sql, "DELETE FROM `t` WHERE (`z` = ?) AND (`a` = ?)");
        assert_eq!(values, vec![Value::from(1i64), Value::from(2i64)]);
    }

    #[test]
    fn test_parse_condition_keys() {
        let config = Config::default();
        let parser = Parser::new(&config);
        let json: Json = serde_json::from_str(
            r##"{"$or": [{"a": {"$<": 1}}, {"$NOT": {"b": null}}], "#c": "NOW()"}"##,
        )
        .unwrap();
        let condition = parser.parse_condition(&json).unwrap();
        assert_eq!(
            condition,
            Condition::map([
                (
                    Key::Connector(Connector::Or),
                    Condition::List(vec![
                        Condition::column("a", Condition::op(Operator::Lt, 1i64)),
                        Condition::not(Condition::column("b", Condition::Null)),
                    ])
                ),
                (Key::Column(Column::raw("c")), "NOW()".into()),
            ])
        );
    }

    #[test]
    fn test_unknown_keyword() {
        let result = parse(r#"{"select": {"table": "t", "where": {"a": {"$REGEX": "x"}}}}"#);
        assert!(matches!(result, Err(Error::UnsupportedOperator(ref k)) if k == "$REGEX"));
    }

    #[test]
    fn test_custom_markers() {
        let config = Config {
            escape_marker: '!',
            keyword_prefix: '@',
            ..Config::default()
        };
        let request = Parser::new(&config)
            .parse_str(r#"{"update": {"table": "t", "value": {"!seen": "NOW()"}, "where": {"a": {"@gt": 1}}}}"#)
            .unwrap();
        assert_eq!(
            request.compile().unwrap().sql,
            "UPDATE `t` SET `seen` = NOW() WHERE (`a` > ?)"
        );
    }

    #[test]
    fn test_parse_insert_values() {
        let (sql, values) = compile(
            r##"{"insert": {"table": "jobs", "ignore": true,
                "value": {"value": "Teacher", "score": 1.5, "note": null, "#created": "NOW()"}}}"##,
        );
        assert_eq!(
            sql,
            "INSERT IGNORE INTO `jobs` (`value`, `score`, `note`, `created`) VALUES (?, ?, ?, NOW())"
        );
        assert_eq!(
            values,
            vec![Value::from("Teacher"), Value::from(1.5f64), Value::String(None)]
        );
    }

    #[test]
    fn test_value_must_be_object() {
        let result = parse(r#"{"insert": {"table": "jobs", "value": ["a"]}}"#);
        assert!(matches!(result, Err(Error::Argument(_))));
    }

    #[test]
    fn test_parse_joins() {
        let (sql, _) = compile(
            r##"{"select": {"table": "user", "columns": ["user.id", "#COUNT(*) AS n"],
                "join": {"[>]account(a)": {"user.id": "a.user_id", "user.level": {"$>=": "a.level"}}}}}"##,
        );
        assert_eq!(
            sql,
            "SELECT `user`.`id`, COUNT(*) AS n FROM `user` LEFT JOIN `account` AS `a` \
             ON `user`.`id` = `a`.`user_id` AND `user`.`level` >= `a`.`level`"
        );
    }

    #[test]
    fn test_parse_select_clauses() {
        let (sql, values) = compile(
            r#"{"select": {"table": "orders", "columns": "*", "group": ["user_id"],
                "having": {"n": {"$gt": 2}}, "order": "n DESC", "limit": [10, 5]}}"#,
        );
        assert_eq!(
            sql,
            "SELECT * FROM `orders` GROUP BY `user_id` HAVING (`n` > ?) ORDER BY n DESC LIMIT 10, 5"
        );
        assert_eq!(values, vec![Value::from(2i64)]);
    }

    #[test]
    fn test_star_inside_column_list_is_kept() {
        let (sql, _) = compile(r#"{"select": {"table": "t", "columns": ["*", "id"]}}"#);
        assert_eq!(sql, "SELECT *, `id` FROM `t`");

        let (sql, _) = compile(r#"{"select": {"table": "t", "columns": ["*"]}}"#);
        assert_eq!(sql, "SELECT * FROM `t`");
    }

    #[test]
    fn test_parse_raw_having() {
        let (sql, values) = compile(
            r#"{"select": {"table": "orders", "group": "user_id", "having": "COUNT(*) > 5"}}"#,
        );
        assert_eq!(sql, "SELECT * FROM `orders` GROUP BY user_id HAVING COUNT(*) > 5");
        assert!(values.is_empty());
    }

    #[test]
    fn test_parse_upsert_and_insert_many() {
        let (sql, _) = compile(
            r##"{"upsert": {"table": "t", "value": {"id": 1, "#v": "v + 1"}, "update_columns": ["#v"]}}"##,
        );
        assert_eq!(
            sql,
            "INSERT INTO `t` (`id`, `v`) VALUES (?, v + 1) ON DUPLICATE KEY UPDATE `v`=VALUES(`v`)"
        );

        let (sql, values) = compile(
            r#"{"insert_many": {"table": "t", "columns": ["a", "b"], "values": [[1, "x"], [2, null]]}}"#,
        );
        assert_eq!(sql, "INSERT INTO `t` (`a`, `b`) VALUES (?, ?), (?, ?)");
        assert_eq!(values.len(), 4);
        assert_eq!(values[3], Value::String(None));
    }

    #[test]
    fn test_invalid_requests() {
        assert!(matches!(parse("not json"), Err(Error::Argument(_))));
        assert!(matches!(parse(r#"{"merge": {"table": "t"}}"#), Err(Error::Argument(_))));
        assert!(matches!(
            parse(r#"{"delete": {"table": "t", "limit": 1}}"#),
            Err(Error::Argument(_))
        ));
    }
}
