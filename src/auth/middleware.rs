use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    web::Data,
};
use tracing::debug;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::TokenService;
use crate::error::ApiError;

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let tokens = req
        .app_data::<Data<TokenService>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Token service missing"))?;

    let email = match authenticate(&req, &tokens) {
        Ok(email) => email,
        Err(err) => {
            debug!(path = %req.path(), reason = %err, "Rejected unauthenticated request");
            return Ok(req.into_response(err.error_response()));
        }
    };

    req.extensions_mut().insert(AuthUser { email });

    next.call(req).await
}

fn authenticate(req: &ServiceRequest, tokens: &TokenService) -> Result<String, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    let token = bearer_token(header_value).ok_or_else(|| {
        ApiError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
    })?;

    tokens
        .validate(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))
}

/// The credential part of `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }
}
