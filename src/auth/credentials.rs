//! Persistence for user credentials.

use actix_web::web;
use sqlx::MySqlPool;
use tracing::{debug, error, info, warn};

use crate::auth::password::CredentialHasher;
use crate::error::ApiError;
use crate::model::schema::VARCHAR_LEN;
use crate::model::user::{Credential, User};
use crate::utils::{email_cache, email_filter, normalize_email};

const EMAIL_TAKEN: &str = "Email already registered";

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> Result<bool, ApiError> {
    // 1️⃣ Cuckoo filter: fast negative
    if !email_filter::might_exist(email) {
        return Ok(true);
    }

    // 2️⃣ Moka cache: fast positive
    if email_cache::owner(email).await.is_some() {
        return Ok(false);
    }

    // 3️⃣ Database fallback
    let owner = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    match owner {
        Some(user_id) => {
            email_cache::remember(email, user_id).await;
            Ok(false)
        }
        None => Ok(true),
    }
}

/// Fails with `Validation` on blank fields, `Conflict` when the email is taken.
pub async fn register(
    pool: &MySqlPool,
    hasher: &CredentialHasher,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Credential, ApiError> {
    let name = name.trim();
    let email = normalize_email(email);
    validate_registration(name, &email, password)?;

    if !is_email_available(&email, pool).await? {
        return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let hasher = hasher.clone();
    let password = password.to_string();
    let password_hash = web::block(move || hasher.hash(&password))
        .await?
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ApiError::Internal
        })?;

    let result = sqlx::query("INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)")
        .bind(name)
        .bind(&email)
        .bind(&password_hash)
        .execute(pool)
        .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // Lost a race with a concurrent registration.
            email_filter::insert(&email);
            return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    email_filter::insert(&email);
    email_cache::remember(&email, id).await;
    info!(user_id = id, "User registered");

    Ok(Credential {
        id,
        name: name.to_string(),
        email,
    })
}

fn validate_registration(name: &str, email: &str, password: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::Validation("Field `name` must not be empty".to_string()));
    }
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !well_formed || email.contains(char::is_whitespace) {
        return Err(ApiError::Validation("Field `email` must be a valid email address".to_string()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Field `password` must not be empty".to_string()));
    }
    for (field, value) in [("name", name), ("email", email)] {
        if value.chars().count() > VARCHAR_LEN {
            return Err(ApiError::Validation(format!(
                "Field `{field}` must be at most {VARCHAR_LEN} characters"
            )));
        }
    }
    Ok(())
}

pub async fn find_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// `None` for an unknown email or a wrong password.
pub async fn verify(
    pool: &MySqlPool,
    hasher: &CredentialHasher,
    email: &str,
    password: &str,
) -> Result<Option<Credential>, ApiError> {
    let hasher = hasher.clone();
    let password = password.to_string();

    let Some(user) = find_by_email(pool, email).await? else {
        web::block(move || hasher.verify_missing(&password)).await?;
        info!("Invalid credentials: user not found");
        return Ok(None);
    };

    debug!(user_id = user.id, "Verifying password");
    let hashed = user.password_hash.clone();
    let matches = web::block(move || hasher.verify(&password, &hashed)).await?;

    if !matches {
        info!(user_id = user.id, "Invalid credentials: password mismatch");
        return Ok(None);
    }

    touch_last_login(pool, user.id).await;
    Ok(Some(Credential::from(user)))
}

/// Best effort. A failure here must not fail the login.
async fn touch_last_login(pool: &MySqlPool, user_id: u64) {
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
    {
        warn!(error = %e, user_id, "Failed to record last login");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_input_is_validated() {
        assert!(validate_registration("Jane", "jane@example.com", "pw").is_ok());
        assert!(validate_registration("", "jane@example.com", "pw").is_err());
        assert!(validate_registration("Jane", "jane.example.com", "pw").is_err());
        assert!(validate_registration("Jane", "@example.com", "pw").is_err());
        assert!(validate_registration("Jane", "jane@localhost", "pw").is_err());
        assert!(validate_registration("Jane", "ja ne@example.com", "pw").is_err());
        assert!(validate_registration("Jane", "jane@example.com", "").is_err());

        let long_name = "J".repeat(VARCHAR_LEN + 1);
        let err = validate_registration(&long_name, "jane@example.com", "pw").unwrap_err();
        assert_eq!(err.to_string(), "Field `name` must be at most 255 characters");
        let long_email = format!("{}@example.com", "j".repeat(VARCHAR_LEN));
        assert!(validate_registration("Jane", &long_email, "pw").is_err());
    }
}
