//! Entity-specific steps that run inside the write transaction.

use sqlx::MySqlConnection;
use tracing::{debug, info};

use super::Record;
use crate::error::ApiError;
use crate::model::employee::{EMPLOYEE, employee_code, is_generated_code};
use crate::model::schema::{EntitySchema, Hook, IS_ACTIVE};
use crate::utils::db_utils::{Changes, SqlValue};

pub async fn before_insert(
    conn: &mut MySqlConnection,
    schema: &EntitySchema,
    changes: &mut Changes,
) -> Result<(), ApiError> {
    if schema.hook == Hook::EmployeeCode {
        check_employee_code(changes, None)?;
    }
    if schema.hook == Hook::SingleActiveProfile {
        let employee_id = match changes.get("employee_id") {
            Some(SqlValue::U64(id)) => *id,
            _ => return Err(ApiError::Validation("Field `employee_id` is required".to_string())),
        };
        lock_employee(conn, employee_id).await?;
        deactivate_profiles(conn, schema, employee_id, None).await?;
        changes.set(&IS_ACTIVE, SqlValue::Bool(true));
    }
    Ok(())
}

pub async fn before_update(
    conn: &mut MySqlConnection,
    schema: &EntitySchema,
    id: u64,
    existing: &Record,
    changes: &Changes,
) -> Result<(), ApiError> {
    if schema.hook == Hook::EmployeeCode {
        check_employee_code(changes, Some(id))?;
    }
    if schema.hook == Hook::SingleActiveProfile {
        let active = match changes.get(IS_ACTIVE.name) {
            Some(SqlValue::Bool(active)) => *active,
            _ => existing
                .get(IS_ACTIVE.name)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        };
        if !active {
            return Ok(());
        }

        let employee_id = match changes.get("employee_id") {
            Some(SqlValue::U64(id)) => Some(*id),
            _ => existing.get("employee_id").and_then(|v| v.as_u64()),
        };
        let Some(employee_id) = employee_id else {
            return Err(ApiError::Validation("Field `employee_id` is required".to_string()));
        };
        lock_employee(conn, employee_id).await?;
        deactivate_profiles(conn, schema, employee_id, Some(id)).await?;
    }
    Ok(())
}

/// `inserted` is false for updates, where an absent `employee_code` means
/// "unchanged" rather than "empty".
pub async fn after_write(
    conn: &mut MySqlConnection,
    schema: &EntitySchema,
    id: u64,
    changes: &Changes,
    inserted: bool,
) -> Result<(), ApiError> {
    if schema.hook == Hook::EmployeeCode {
        let needs_code = match changes.get("employee_code") {
            Some(value) => value.is_null(),
            None => inserted,
        };
        if needs_code {
            let code = employee_code(id);
            sqlx::query(&format!("UPDATE {} SET employee_code = ? WHERE id = ?", schema.table))
                .bind(&code)
                .bind(id)
                .execute(&mut *conn)
                .await?;
            debug!(employee_id = id, code = %code, "Assigned generated employee code");
        }
    }
    Ok(())
}

/// Codes of the generated shape belong to the row whose id they encode, so a
/// supplied one may only repeat that row's own code.
fn check_employee_code(changes: &Changes, own_id: Option<u64>) -> Result<(), ApiError> {
    let Some(SqlValue::String(code)) = changes.get("employee_code") else {
        return Ok(());
    };
    if !is_generated_code(code) {
        return Ok(());
    }
    let own = own_id.is_some_and(|id| code.trim_end().eq_ignore_ascii_case(&employee_code(id)));
    if own {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Field `employee_code` cannot use the reserved EMP-NNNNNN form".to_string(),
        ))
    }
}

/// Serializes concurrent profile writes for one employee.
async fn lock_employee(conn: &mut MySqlConnection, employee_id: u64) -> Result<(), ApiError> {
    let found = sqlx::query(&format!("SELECT id FROM {} WHERE id = ? FOR UPDATE", EMPLOYEE.table))
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(ApiError::Validation(format!("Employee {employee_id} does not exist"))),
    }
}

async fn deactivate_profiles(
    conn: &mut MySqlConnection,
    schema: &EntitySchema,
    employee_id: u64,
    keep: Option<u64>,
) -> Result<(), ApiError> {
    let mut sql = format!(
        "UPDATE {} SET is_active = FALSE WHERE employee_id = ? AND is_active = TRUE",
        schema.table
    );
    if keep.is_some() {
        sql.push_str(" AND id <> ?");
    }

    let mut query = sqlx::query(&sql).bind(employee_id);
    if let Some(keep) = keep {
        query = query.bind(keep);
    }
    let result = query.execute(&mut *conn).await?;

    if result.rows_affected() > 0 {
        info!(
            employee_id,
            deactivated = result.rows_affected(),
            "Deactivated previous active profiles"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_code(code: &str) -> Changes {
        let mut changes = Changes::default();
        let column = EMPLOYEE.column("employee_code").unwrap();
        changes.set(column, SqlValue::String(code.to_string()));
        changes
    }

    #[test]
    fn reserved_code_is_rejected_on_create() {
        let err = check_employee_code(&with_code("EMP-000042"), None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(check_employee_code(&with_code("emp-000042"), None).is_err());
        assert!(check_employee_code(&with_code("HR-42"), None).is_ok());
        assert!(check_employee_code(&Changes::default(), None).is_ok());
    }

    #[test]
    fn row_may_keep_its_own_generated_code() {
        assert!(check_employee_code(&with_code("EMP-000042"), Some(42)).is_ok());
        assert!(check_employee_code(&with_code("EMP-000043"), Some(42)).is_err());
    }
}
