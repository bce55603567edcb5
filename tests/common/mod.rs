// Shared setup for tests that need a real MySQL database.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use hr_admin::config::Config;
use hr_admin::db::{init_db, run_migrations};
use hr_admin::routes::AppState;

/// Builds app state against `TEST_DATABASE_URL` with migrations applied.
pub async fn setup_state() -> AppState {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some("integration-test-secret".to_string()),
        "ARGON2_MEMORY_KIB" => Some("1024".to_string()),
        "ARGON2_ITERATIONS" => Some("1".to_string()),
        _ => None,
    })
    .expect("Failed to build test config");

    let pool = init_db(&config.database_url, 5)
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    AppState::new(pool, config).expect("Failed to build app state")
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:41000".parse().unwrap()
}

/// Distinct per call, so tests never collide on unique columns across runs.
pub fn unique(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{prefix}-{nanos}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

pub fn bearer(state: &AppState) -> (actix_web::http::header::HeaderName, String) {
    let token = state.tokens.issue("integration@example.com", None).unwrap();
    (actix_web::http::header::AUTHORIZATION, format!("Bearer {token}"))
}
