pub mod db_utils;
pub mod email_cache;
pub mod email_filter;

/// Emails are compared and stored trimmed and lower-cased.
#[inline]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
