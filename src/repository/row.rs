use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Value, json};
use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::Record;
use crate::model::schema::{Column, ColumnKind, EntitySchema};

/// Decodes a row selected with `schema.select_list()` into a JSON object.
pub fn decode_row(schema: &EntitySchema, row: &MySqlRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    record.insert("id".to_string(), json!(row.try_get::<u64, _>("id")?));

    for column in schema.writable_columns() {
        record.insert(column.name.to_string(), decode_column(row, column)?);
    }

    let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;
    let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at")?;
    record.insert("created_at".to_string(), json!(created_at));
    record.insert("updated_at".to_string(), json!(updated_at));

    Ok(record)
}

fn decode_column(row: &MySqlRow, column: &Column) -> Result<Value, sqlx::Error> {
    let name = column.name;
    Ok(match column.kind {
        ColumnKind::Text => json!(row.try_get::<Option<String>, _>(name)?),
        ColumnKind::Integer => json!(row.try_get::<Option<i64>, _>(name)?),
        ColumnKind::Id => json!(row.try_get::<Option<u64>, _>(name)?),
        ColumnKind::Float => json!(row.try_get::<Option<f64>, _>(name)?),
        ColumnKind::Boolean => json!(row.try_get::<Option<bool>, _>(name)?),
        ColumnKind::Date => json!(row.try_get::<Option<NaiveDate>, _>(name)?),
        ColumnKind::DateTime => json!(row.try_get::<Option<NaiveDateTime>, _>(name)?),
    })
}
