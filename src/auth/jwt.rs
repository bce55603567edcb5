use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::models::Claims;

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Issues and checks HS256 bearer tokens. Built once from configuration and
/// shared as app data.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
        }
    }

    /// `ttl` falls back to the configured default.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String, ApiError> {
        self.issue_at(subject, ttl.unwrap_or(self.default_ttl), now())
    }

    pub(crate) fn issue_at(&self, subject: &str, ttl: Duration, issued_at: u64) -> Result<String, ApiError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl.as_secs()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            ApiError::Internal
        })
    }

    /// The subject of a valid token. Any failure yields `None`.
    pub fn validate(&self, token: &str) -> Option<String> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) if !data.claims.sub.trim().is_empty() => Some(data.claims.sub),
            Ok(_) => {
                debug!("Token rejected: empty subject");
                None
            }
            Err(e) => {
                debug!(error = %e, "Token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", Duration::from_secs(900))
    }

    #[test]
    fn issued_token_validates_to_subject() {
        let tokens = service();
        let token = tokens.issue("jane@example.com", None).unwrap();
        assert_eq!(tokens.validate(&token).as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at("jane@example.com", Duration::from_secs(60), now() - 3600)
            .unwrap();
        assert_eq!(tokens.validate(&token), None);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = TokenService::new("different-secret", Duration::from_secs(900));
        let token = other.issue("jane@example.com", None).unwrap();
        assert_eq!(service().validate(&token), None);
    }

    #[test]
    fn swapped_payload_is_rejected() {
        let tokens = service();
        let jane = tokens.issue("jane@example.com", None).unwrap();
        let mallory = tokens.issue("mallory@example.com", None).unwrap();

        let jane_parts: Vec<_> = jane.split('.').collect();
        let mallory_parts: Vec<_> = mallory.split('.').collect();
        let forged = format!("{}.{}.{}", jane_parts[0], mallory_parts[1], jane_parts[2]);
        assert_eq!(tokens.validate(&forged), None);
    }

    #[test]
    fn missing_or_empty_subject_is_rejected() {
        let tokens = service();
        let key = EncodingKey::from_secret(b"unit-test-secret");
        let exp = now() + 600;

        let no_sub = encode(&Header::default(), &json!({ "exp": exp }), &key).unwrap();
        assert_eq!(tokens.validate(&no_sub), None);

        let empty_sub = encode(&Header::default(), &json!({ "sub": "", "exp": exp }), &key).unwrap();
        assert_eq!(tokens.validate(&empty_sub), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(service().validate("not.a.token"), None);
        assert_eq!(service().validate(""), None);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let tokens = service();
        let token = tokens
            .issue_at("a@b.io", Duration::from_secs(u64::MAX), now())
            .unwrap();
        assert_eq!(tokens.validate(&token).as_deref(), Some("a@b.io"));
    }

    #[test]
    fn token_lives_exactly_its_ttl() {
        let tokens = service();
        let ttl = Duration::from_secs(1800);
        let fresh = tokens.issue_at("a@b.io", ttl, now() - 1700).unwrap();
        let stale = tokens.issue_at("a@b.io", ttl, now() - 1900).unwrap();
        assert!(tokens.validate(&fresh).is_some());
        assert!(tokens.validate(&stale).is_none());
    }
}
