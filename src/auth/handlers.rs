use std::time::Duration;

use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

use crate::auth::auth::AuthUser;
use crate::auth::credentials;
use crate::auth::jwt::TokenService;
use crate::auth::password::CredentialHasher;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::user::Credential;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = Credential),
        (status = 400, description = "Email already registered"),
        (status = 422, description = "Invalid input")
    )
)]
#[instrument(name = "auth_register", skip(body, pool, hasher), fields(email = %body.email))]
pub async fn register(
    body: web::Json<RegisterRequest>,
    pool: web::Data<MySqlPool>,
    hasher: web::Data<CredentialHasher>,
) -> Result<HttpResponse, ApiError> {
    info!("Registration request received");

    let user = credentials::register(
        pool.get_ref(),
        hasher.get_ref(),
        &body.name,
        &body.email,
        &body.password,
    )
    .await?;

    Ok(HttpResponse::Created().json(user))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Invalid input")
    )
)]
#[instrument(name = "auth_login", skip(body, pool, hasher, tokens, config), fields(email = %body.email))]
pub async fn login(
    body: web::Json<LoginRequest>,
    pool: web::Data<MySqlPool>,
    hasher: web::Data<CredentialHasher>,
    tokens: web::Data<TokenService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required".to_string()));
    }

    let user = credentials::verify(pool.get_ref(), hasher.get_ref(), &body.email, &body.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    debug!(user_id = user.id, "Generating access token");
    let access_token = tokens.issue(&user.email, Some(Duration::from_secs(config.login_token_ttl)))?;

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user,
    }))
}

/// The authenticated caller
#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = Credential),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
#[instrument(name = "auth_me", skip(user, pool), fields(actor = %user.email))]
pub async fn me(user: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let found = credentials::find_by_email(pool.get_ref(), &user.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(Credential::from(found)))
}
