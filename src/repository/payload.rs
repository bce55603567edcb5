use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::model::schema::EntitySchema;
use crate::utils::db_utils::{Changes, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Omitted optional columns keep their database default.
    Create,
    /// Omitted optional columns are reset to their default or `NULL`.
    Replace,
    /// Only supplied columns are touched.
    Patch,
}

/// Validates a request body against `schema` and turns it into the set of
/// column assignments for `mode`.
pub fn parse_payload(
    schema: &EntitySchema,
    payload: &Map<String, Value>,
    mode: WriteMode,
) -> Result<Changes, ApiError> {
    if let Some(unknown) = payload.keys().find(|key| schema.column(key).is_none()) {
        return Err(ApiError::Validation(format!(
            "Unknown field `{unknown}` for {}",
            schema.label
        )));
    }

    let mut changes = Changes::default();
    for column in schema.writable_columns() {
        match payload.get(column.name) {
            None if mode == WriteMode::Patch => {}
            Some(value) if !value.is_null() => {
                changes.set(column, SqlValue::from_json(column, value)?);
            }
            supplied => {
                if column.required {
                    let reason = if supplied.is_some() { "cannot be null" } else { "is required" };
                    return Err(ApiError::Validation(format!("Field `{}` {reason}", column.name)));
                }
                if supplied.is_some() && !column.nullable() {
                    return Err(ApiError::Validation(format!(
                        "Field `{}` cannot be null",
                        column.name
                    )));
                }
                match mode {
                    WriteMode::Create => {}
                    WriteMode::Patch => changes.set(column, SqlValue::Null),
                    WriteMode::Replace => changes.set(
                        column,
                        column.default.map(SqlValue::from).unwrap_or(SqlValue::Null),
                    ),
                }
            }
        }
    }

    Ok(changes)
}
