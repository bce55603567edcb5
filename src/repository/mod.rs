//! Generic CRUD over any `EntitySchema`. Every write runs in one transaction
//! that rolls back when dropped before commit.

pub mod hooks;
pub mod payload;
pub mod row;
pub mod unique;

use serde_json::{Map, Value};
use sqlx::{Executor, MySql, MySqlPool};
use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::model::schema::EntitySchema;
use crate::utils::db_utils::{SqlStatement, bind_values, build_insert_sql, build_update_sql};
pub use payload::WriteMode;
use payload::parse_payload;
use row::decode_row;
use unique::ensure_unique;

/// A row rendered as JSON, keyed by column name.
pub type Record = Map<String, Value>;

pub async fn list_active(pool: &MySqlPool, schema: &EntitySchema) -> Result<Vec<Record>, ApiError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE is_active = TRUE ORDER BY {}",
        schema.select_list(),
        schema.table,
        schema.order_by
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|row| decode_row(schema, row))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::from)
}

/// Returns the row whether or not it is active.
pub async fn find(pool: &MySqlPool, schema: &EntitySchema, id: u64) -> Result<Record, ApiError> {
    fetch_record(pool, schema, id, false)
        .await?
        .ok_or_else(|| schema.not_found())
}

pub async fn create(
    pool: &MySqlPool,
    schema: &EntitySchema,
    payload: &Map<String, Value>,
) -> Result<Record, ApiError> {
    let mut changes = parse_payload(schema, payload, WriteMode::Create)?;

    let mut tx = pool.begin().await?;
    ensure_unique(&mut tx, schema, &changes, None, WriteMode::Create).await?;
    hooks::before_insert(&mut tx, schema, &mut changes).await?;

    let SqlStatement { sql, values } = build_insert_sql(schema.table, &changes);
    let id = bind_values(sqlx::query(&sql), values)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

    hooks::after_write(&mut tx, schema, id, &changes, true).await?;
    let record = reread(&mut tx, schema, id).await?;
    tx.commit().await?;

    info!(entity = schema.label, id, "Record created");
    Ok(record)
}

/// PATCH or PUT. An empty patch writes nothing and returns the stored row.
pub async fn update(
    pool: &MySqlPool,
    schema: &EntitySchema,
    id: u64,
    payload: &Map<String, Value>,
    mode: WriteMode,
) -> Result<Record, ApiError> {
    let changes = parse_payload(schema, payload, mode)?;

    let mut tx = pool.begin().await?;
    let existing = fetch_record(&mut *tx, schema, id, true)
        .await?
        .ok_or_else(|| schema.not_found())?;

    let Some(SqlStatement { sql, values }) = build_update_sql(schema.table, &changes, id) else {
        debug!(entity = schema.label, id, "Empty update, nothing written");
        return Ok(existing);
    };

    ensure_unique(&mut tx, schema, &changes, Some((id, &existing)), mode).await?;
    hooks::before_update(&mut tx, schema, id, &existing, &changes).await?;

    bind_values(sqlx::query(&sql), values).execute(&mut *tx).await?;

    hooks::after_write(&mut tx, schema, id, &changes, false).await?;
    let record = reread(&mut tx, schema, id).await?;
    tx.commit().await?;

    info!(entity = schema.label, id, ?mode, "Record updated");
    Ok(record)
}

/// Soft delete. Deleting an inactive row again succeeds.
pub async fn deactivate(pool: &MySqlPool, schema: &EntitySchema, id: u64) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let found = sqlx::query(&format!("SELECT id FROM {} WHERE id = ? FOR UPDATE", schema.table))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if found.is_none() {
        return Err(schema.not_found());
    }

    sqlx::query(&format!("UPDATE {} SET is_active = FALSE WHERE id = ?", schema.table))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(entity = schema.label, id, "Record deactivated");
    Ok(())
}

async fn fetch_record<'c, E>(
    executor: E,
    schema: &EntitySchema,
    id: u64,
    for_update: bool,
) -> Result<Option<Record>, ApiError>
where
    E: Executor<'c, Database = MySql>,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?{}",
        schema.select_list(),
        schema.table,
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;

    row.map(|row| decode_row(schema, &row))
        .transpose()
        .map_err(ApiError::from)
}

async fn reread(
    conn: &mut sqlx::MySqlConnection,
    schema: &EntitySchema,
    id: u64,
) -> Result<Record, ApiError> {
    fetch_record(&mut *conn, schema, id, false)
        .await?
        .ok_or_else(|| {
            error!(entity = schema.label, id, "Row vanished inside its own transaction");
            ApiError::Internal
        })
}
