use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use futures_util::{StreamExt, TryStreamExt};
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use super::normalize_email;

/// Registered email -> owning user id. Absence says nothing; the database
/// decides.
static EMAIL_OWNERS: Lazy<Cache<String, u64>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000)
        .time_to_idle(Duration::from_secs(6 * 60 * 60))
        .build()
});

pub async fn remember(email: &str, user_id: u64) {
    EMAIL_OWNERS.insert(normalize_email(email), user_id).await;
}

pub async fn owner(email: &str) -> Option<u64> {
    EMAIL_OWNERS.get(&normalize_email(email)).await
}

/// Preloads owners of accounts used in the last `days` days, newest first.
/// Each page of `page_size` rows is inserted concurrently.
pub async fn warmup_email_cache(pool: &MySqlPool, days: u32, page_size: usize) -> Result<()> {
    let mut pages = sqlx::query_as::<_, (u64, String)>(
        r#"
        SELECT id, email
        FROM users
        WHERE last_login_at IS NOT NULL
          AND last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool)
    .try_chunks(page_size.max(1));

    let mut loaded = 0usize;
    while let Some(page) = pages.next().await {
        let page = page.context("email cache warm-up query failed")?;
        loaded += page.len();
        join_all(page.iter().map(|(id, email)| remember(email, *id))).await;
    }

    log::info!("Email cache warm-up: {loaded} owners from the last {days} days");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn owner_lookup_ignores_case_and_padding() {
        assert_eq!(owner("owner.test@example.com").await, None);
        remember(" Owner.Test@Example.com", 17).await;
        assert_eq!(owner("owner.test@example.com").await, Some(17));
        assert_eq!(owner("OWNER.TEST@EXAMPLE.COM").await, Some(17));
    }

    #[actix_web::test]
    async fn later_registration_overwrites_owner() {
        remember("moved@example.com", 1).await;
        remember("moved@example.com", 2).await;
        assert_eq!(owner("moved@example.com").await, Some(2));
    }
}
