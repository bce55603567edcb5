use actix_web::error::{BlockingError, JsonPayloadError, PathError};
use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use derive_more::Display;
use serde_json::json;
use tracing::error;

/// Every failure a handler can report. Rendered as `{"detail": "..."}`.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Malformed or missing input.
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// A unique value is already taken.
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    /// Missing, malformed or expired bearer token.
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "Invalid credentials")]
    InvalidCredentials,
    /// The cause is logged where the error is created, never sent to the caller.
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let ApiError::Unauthorized(_) = self {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "detail": self.to_string() }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // Backstop for writes that race past the uniqueness pre-check.
            if db_err.is_unique_violation() {
                return ApiError::Conflict(
                    "A record with the same unique value already exists".to_string(),
                );
            }
            if db_err.is_foreign_key_violation() {
                return ApiError::Validation("Referenced record does not exist".to_string());
            }
        }

        error!(error = %e, "Database error");
        ApiError::Internal
    }
}

impl From<BlockingError> for ApiError {
    fn from(e: BlockingError) -> Self {
        error!(error = %e, "Blocking task failed");
        ApiError::Internal
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid request body: {err}")).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid path parameter: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn conflict_is_a_bad_request_with_detail() {
        let (status, body) = body_of(ApiError::Conflict("Branch with this name already exists".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Branch with this name already exists");
    }

    #[actix_web::test]
    async fn internal_error_hides_the_cause() {
        let (status, body) = body_of(ApiError::Internal).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal Server Error");
    }

    #[test]
    fn unauthorized_challenges_with_bearer() {
        let resp = ApiError::Unauthorized("Not authenticated".into()).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn row_not_found_maps_to_internal() {
        assert!(matches!(ApiError::from(sqlx::Error::RowNotFound), ApiError::Internal));
    }
}
