use sqlx::MySqlConnection;

use super::Record;
use super::payload::WriteMode;
use crate::error::ApiError;
use crate::model::schema::{EntitySchema, IS_ACTIVE, UniqueRule};
use crate::utils::db_utils::{Changes, SqlStatement, SqlValue, bind_values};

#[derive(Debug)]
pub struct UniqueProbe {
    pub message: String,
    pub statement: SqlStatement,
}

/// Row being updated: its id and its current stored values.
pub type Existing<'a> = Option<(u64, &'a Record)>;

/// One `SELECT` per rule that the write could violate. Rules whose values
/// are all `NULL` are skipped; on a patch only rules touching a supplied
/// column (or its scope) are checked, against the merged values. Active-only
/// rules are skipped for an update that leaves the row inactive.
pub fn plan(
    schema: &EntitySchema,
    changes: &Changes,
    existing: Existing<'_>,
    mode: WriteMode,
) -> Result<Vec<UniqueProbe>, ApiError> {
    let mut probes = Vec::new();

    for rule in schema.unique {
        let mut involved = rule.columns.iter().chain(rule.scope.iter());
        if mode == WriteMode::Patch && !involved.any(|c| changes.contains(c)) {
            continue;
        }
        // An inactive row cannot collide with active ones.
        if rule.active_only
            && existing.is_some()
            && resolve(schema, changes, existing, IS_ACTIVE.name)? == SqlValue::Bool(false)
        {
            continue;
        }

        let values = rule
            .columns
            .iter()
            .map(|c| resolve(schema, changes, existing, c))
            .collect::<Result<Vec<_>, _>>()?;
        if values.iter().all(SqlValue::is_null) {
            continue;
        }

        probes.push(UniqueProbe {
            message: rule.conflict_message(schema.label),
            statement: probe_statement(schema, rule, values, changes, existing)?,
        });
    }

    Ok(probes)
}

fn probe_statement(
    schema: &EntitySchema,
    rule: &UniqueRule,
    mut values: Vec<SqlValue>,
    changes: &Changes,
    existing: Existing<'_>,
) -> Result<SqlStatement, ApiError> {
    let mut conditions = rule
        .columns
        .iter()
        .map(|c| format!("{c} <=> ?"))
        .collect::<Vec<_>>();

    if let Some(scope) = rule.scope {
        conditions.push(format!("{scope} <=> ?"));
        values.push(resolve(schema, changes, existing, scope)?);
    }
    if rule.active_only {
        conditions.push("is_active = TRUE".to_string());
    }
    if let Some((id, _)) = existing {
        conditions.push("id <> ?".to_string());
        values.push(SqlValue::U64(id));
    }

    Ok(SqlStatement {
        sql: format!(
            "SELECT id FROM {} WHERE {} LIMIT 1",
            schema.table,
            conditions.join(" AND ")
        ),
        values,
    })
}

/// The value a column will hold after the write.
fn resolve(
    schema: &EntitySchema,
    changes: &Changes,
    existing: Existing<'_>,
    name: &str,
) -> Result<SqlValue, ApiError> {
    if let Some(value) = changes.get(name) {
        return Ok(value.clone());
    }
    let column = schema.column(name).ok_or(ApiError::Internal)?;
    match existing.and_then(|(_, record)| record.get(name)) {
        Some(stored) if !stored.is_null() => SqlValue::from_json(column, stored),
        _ => Ok(SqlValue::Null),
    }
}

/// Runs every probe and reports all violations at once.
pub async fn ensure_unique(
    conn: &mut MySqlConnection,
    schema: &EntitySchema,
    changes: &Changes,
    existing: Existing<'_>,
    mode: WriteMode,
) -> Result<(), ApiError> {
    let mut violations = Vec::new();

    for probe in plan(schema, changes, existing, mode)? {
        let SqlStatement { sql, values } = probe.statement;
        let hit = bind_values(sqlx::query(&sql), values)
            .fetch_optional(&mut *conn)
            .await?;
        if hit.is_some() {
            violations.push(probe.message);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Conflict(violations.join("; ")))
    }
}
