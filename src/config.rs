use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// Seconds. Used when a caller asks for a token without a lifetime.
    pub access_token_ttl: u64,
    /// Seconds. Lifetime of tokens minted by `/login`.
    pub login_token_ttl: u64,

    // Argon2id cost
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string()),
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: token_ttl(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            login_token_ttl: token_ttl(&lookup, "LOGIN_TOKEN_TTL", 1800)?,  // 30 min

            argon2_memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", 19 * 1024)?,
            argon2_iterations: parse_or(&lookup, "ARGON2_ITERATIONS", 2)?,
            argon2_parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", 1)?,

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse_or(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: normalize_prefix(&lookup("API_PREFIX").unwrap_or_default()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

/// One year.
const MAX_TOKEN_TTL: u64 = 365 * 24 * 60 * 60;

/// Seconds, between 1 and `MAX_TOKEN_TTL`.
fn token_ttl<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let ttl = parse_or(lookup, key, default)?;
    if ttl == 0 || ttl > MAX_TOKEN_TTL {
        return Err(anyhow!("{key} must be between 1 and {MAX_TOKEN_TTL} seconds, got {ttl}"));
    }
    Ok(ttl)
}

/// `""`, `"/"` and `"api/"` become `""`, `""` and `"/api"`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("mysql://hr:hr@127.0.0.1:3306/hr_admin_test".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        "ARGON2_MEMORY_KIB" => Some("1024".to_string()),
        "ARGON2_ITERATIONS" => Some("1".to_string()),
        _ => None,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = from_pairs(&[("DATABASE_URL", "mysql://x"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:8000");
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.login_token_ttl, 1800);
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.api_prefix, "");
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn jwt_secret_is_mandatory() {
        let err = from_pairs(&[("DATABASE_URL", "mysql://x")]).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = from_pairs(&[("DATABASE_URL", "mysql://x"), ("JWT_SECRET", "  ")]).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn unparseable_numbers_are_errors() {
        let err = from_pairs(&[
            ("DATABASE_URL", "mysql://x"),
            ("JWT_SECRET", "s"),
            ("LOGIN_TOKEN_TTL", "half an hour"),
        ])
        .err()
        .unwrap();
        assert!(err.to_string().contains("LOGIN_TOKEN_TTL"));
    }

    #[test]
    fn token_ttl_must_be_in_range() {
        for raw in ["0", "18446744073709551615"] {
            let err = from_pairs(&[
                ("DATABASE_URL", "mysql://x"),
                ("JWT_SECRET", "s"),
                ("ACCESS_TOKEN_TTL", raw),
            ])
            .err()
            .unwrap();
            assert!(err.to_string().contains("ACCESS_TOKEN_TTL"), "{raw}");
        }

        let config = from_pairs(&[
            ("DATABASE_URL", "mysql://x"),
            ("JWT_SECRET", "s"),
            ("LOGIN_TOKEN_TTL", "86400"),
        ])
        .unwrap();
        assert_eq!(config.login_token_ttl, 86_400);
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let config = from_pairs(&[
            ("DATABASE_URL", "mysql://x"),
            ("JWT_SECRET", "s"),
            ("LOG_LEVEL", "warn"),
        ])
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::WARN);
    }

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("api/"), "/api");
        assert_eq!(normalize_prefix("/api/v1"), "/api/v1");
    }
}
