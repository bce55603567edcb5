use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

use crate::error::ApiError;
use crate::model::schema::{Column, ColumnDefault, ColumnKind};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Type-checks a JSON value against the column it is written to.
    /// `null` converts to `Null`; whether that is allowed is the caller's call.
    pub fn from_json(column: &Column, value: &Value) -> Result<Self, ApiError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }

        let converted = match column.kind {
            ColumnKind::Text => value.as_str().map(|s| SqlValue::String(s.to_string())),
            ColumnKind::Integer => value.as_i64().map(SqlValue::I64),
            ColumnKind::Id => value.as_u64().filter(|id| *id > 0).map(SqlValue::U64),
            ColumnKind::Float => value.as_f64().map(SqlValue::F64),
            ColumnKind::Boolean => value.as_bool().map(SqlValue::Bool),
            ColumnKind::Date => value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .map(SqlValue::Date),
            ColumnKind::DateTime => value.as_str().and_then(parse_datetime).map(SqlValue::DateTime),
        };

        let converted = converted.ok_or_else(|| {
            ApiError::Validation(format!("Field `{}` must be a {}", column.name, column.kind))
        })?;

        if let (SqlValue::String(text), Some(max_len)) = (&converted, column.max_len) {
            if text.chars().count() > max_len {
                return Err(ApiError::Validation(format!(
                    "Field `{}` must be at most {max_len} characters",
                    column.name
                )));
            }
        }
        Ok(converted)
    }
}

impl From<ColumnDefault> for SqlValue {
    fn from(default: ColumnDefault) -> Self {
        match default {
            ColumnDefault::Bool(v) => SqlValue::Bool(v),
            ColumnDefault::Int(v) => SqlValue::I64(v),
            ColumnDefault::Float(v) => SqlValue::F64(v),
        }
    }
}

/// Accepts ISO-8601 with or without offset, a space separator, or a bare date.
/// Offsets are converted to UTC.
fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// ===============================
/// Validated column assignments
/// ===============================
#[derive(Debug, Default)]
pub struct Changes {
    entries: Vec<(&'static Column, SqlValue)>,
}

impl Changes {
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(column, _)| column.name == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, column: &'static Column, value: SqlValue) {
        match self.entries.iter_mut().find(|(c, _)| c.name == column.name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static Column, SqlValue)> {
        self.entries.iter()
    }
}

/// ===============================
/// SQL statement container
/// ===============================
#[derive(Debug)]
pub struct SqlStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// `INSERT INTO t () VALUES ()` when nothing is supplied, so every
/// column takes its database default.
pub fn build_insert_sql(table: &str, changes: &Changes) -> SqlStatement {
    let columns = changes.iter().map(|(c, _)| c.name).collect::<Vec<_>>();
    let placeholders = vec!["?"; columns.len()].join(", ");

    SqlStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        ),
        values: changes.iter().map(|(_, v)| v.clone()).collect(),
    }
}

/// `None` when there is nothing to write.
pub fn build_update_sql(table: &str, changes: &Changes, id: u64) -> Option<SqlStatement> {
    if changes.is_empty() {
        return None;
    }

    let set_clause = changes
        .iter()
        .map(|(c, _)| format!("{} = ?", c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut values = changes.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>();
    values.push(SqlValue::U64(id));

    Some(SqlStatement {
        sql: format!("UPDATE {} SET {} WHERE id = ?", table, set_clause),
        values,
    })
}

/// ===============================
/// Parameter binding
/// ===============================
pub fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::String(v) => query.bind(v),
        SqlValue::I64(v) => query.bind(v),
        SqlValue::U64(v) => query.bind(v),
        SqlValue::F64(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Date(v) => query.bind(v),
        SqlValue::DateTime(v) => query.bind(v),
        SqlValue::Null => query.bind(None::<String>),
    }
}

pub fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: Vec<SqlValue>,
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = bind_value(query, value);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static NAME: Column = Column::text("name").required();
    static BRANCH: Column = Column::id("branch_id");
    static BUDGET: Column = Column::float("budget");
    static BORN: Column = Column::date("date_of_birth");
    static JOINED: Column = Column::datetime("date_of_joining");
    static AGE: Column = Column::integer("age");
    static ZIP: Column = Column::text("zip_code").max_len(20);

    #[test]
    fn values_are_checked_against_column_kind() {
        assert_eq!(
            SqlValue::from_json(&NAME, &json!("Ops")).unwrap(),
            SqlValue::String("Ops".into())
        );
        assert_eq!(SqlValue::from_json(&BRANCH, &json!(7)).unwrap(), SqlValue::U64(7));
        assert_eq!(SqlValue::from_json(&BUDGET, &json!(12)).unwrap(), SqlValue::F64(12.0));
        assert_eq!(SqlValue::from_json(&AGE, &json!(null)).unwrap(), SqlValue::Null);

        assert!(SqlValue::from_json(&NAME, &json!(5)).is_err());
        assert!(SqlValue::from_json(&BRANCH, &json!(0)).is_err());
        assert!(SqlValue::from_json(&BRANCH, &json!("7")).is_err());
        assert!(SqlValue::from_json(&AGE, &json!(3.5)).is_err());
    }

    #[test]
    fn type_error_names_the_field() {
        let err = SqlValue::from_json(&BORN, &json!("12/31/1990")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field `date_of_birth` must be a date (YYYY-MM-DD)"
        );
    }

    #[test]
    fn text_longer_than_its_column_is_rejected() {
        let at_limit = "9".repeat(20);
        assert_eq!(
            SqlValue::from_json(&ZIP, &json!(at_limit)).unwrap(),
            SqlValue::String(at_limit)
        );

        let err = SqlValue::from_json(&ZIP, &json!("9".repeat(21))).unwrap_err();
        assert_eq!(err.to_string(), "Field `zip_code` must be at most 20 characters");

        // counted in characters, not bytes
        assert!(SqlValue::from_json(&ZIP, &json!("é".repeat(20))).is_ok());
    }

    #[test]
    fn datetimes_accept_common_iso_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        for raw in [
            "2024-03-01T09:30:00",
            "2024-03-01 09:30:00",
            "2024-03-01T09:30:00Z",
            "2024-03-01T11:30:00+02:00",
        ] {
            assert_eq!(
                SqlValue::from_json(&JOINED, &json!(raw)).unwrap(),
                SqlValue::DateTime(expected),
                "{raw}"
            );
        }
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            SqlValue::from_json(&JOINED, &json!("2024-03-01")).unwrap(),
            SqlValue::DateTime(midnight)
        );
    }

    #[test]
    fn insert_and_update_sql() {
        let mut changes = Changes::default();
        changes.set(&NAME, SqlValue::String("Ops".into()));
        changes.set(&BRANCH, SqlValue::U64(3));

        let insert = build_insert_sql("departments", &changes);
        assert_eq!(insert.sql, "INSERT INTO departments (name, branch_id) VALUES (?, ?)");
        assert_eq!(insert.values.len(), 2);

        let update = build_update_sql("departments", &changes, 9).unwrap();
        assert_eq!(update.sql, "UPDATE departments SET name = ?, branch_id = ? WHERE id = ?");
        assert_eq!(update.values.last(), Some(&SqlValue::U64(9)));

        assert!(build_update_sql("departments", &Changes::default(), 9).is_none());
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let mut changes = Changes::default();
        changes.set(&NAME, SqlValue::String("a".into()));
        changes.set(&NAME, SqlValue::String("b".into()));
        assert_eq!(changes.iter().count(), 1);
        assert_eq!(changes.get("name"), Some(&SqlValue::String("b".into())));
    }
}
