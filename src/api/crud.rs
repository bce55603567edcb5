//! One handler set shared by every entity scope. The scope supplies the
//! `EntitySchema` as app data.

use actix_web::{HttpResponse, web};
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use tracing::{debug, instrument};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::schema::EntitySchema;
use crate::repository::{self, WriteMode};

type Schema = web::Data<&'static EntitySchema>;

#[instrument(name = "entity_list", skip_all, fields(entity = schema.label, actor = %user.email))]
pub async fn list(
    schema: Schema,
    pool: web::Data<MySqlPool>,
    user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let records = repository::list_active(pool.get_ref(), &schema).await?;
    debug!(count = records.len(), "Listed active records");
    Ok(HttpResponse::Ok().json(records))
}

#[instrument(name = "entity_create", skip_all, fields(entity = schema.label, actor = %user.email))]
pub async fn create(
    schema: Schema,
    pool: web::Data<MySqlPool>,
    user: AuthUser,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let record = repository::create(pool.get_ref(), &schema, &body).await?;
    Ok(HttpResponse::Created().json(record))
}

#[instrument(name = "entity_get", skip_all, fields(entity = schema.label, actor = %user.email, id = *id))]
pub async fn get(
    schema: Schema,
    pool: web::Data<MySqlPool>,
    user: AuthUser,
    id: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let record = repository::find(pool.get_ref(), &schema, *id).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[instrument(name = "entity_patch", skip_all, fields(entity = schema.label, actor = %user.email, id = *id))]
pub async fn patch(
    schema: Schema,
    pool: web::Data<MySqlPool>,
    user: AuthUser,
    id: web::Path<u64>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let record = repository::update(pool.get_ref(), &schema, *id, &body, WriteMode::Patch).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[instrument(name = "entity_replace", skip_all, fields(entity = schema.label, actor = %user.email, id = *id))]
pub async fn replace(
    schema: Schema,
    pool: web::Data<MySqlPool>,
    user: AuthUser,
    id: web::Path<u64>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let record = repository::update(pool.get_ref(), &schema, *id, &body, WriteMode::Replace).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[instrument(name = "entity_delete", skip_all, fields(entity = schema.label, actor = %user.email, id = *id))]
pub async fn delete(
    schema: Schema,
    pool: web::Data<MySqlPool>,
    user: AuthUser,
    id: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    repository::deactivate(pool.get_ref(), &schema, *id).await?;
    Ok(HttpResponse::NoContent().finish())
}
