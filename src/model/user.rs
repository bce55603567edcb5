use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Row of the `users` table.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Public view of a registered user. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Credential {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
}

impl From<User> for Credential {
    fn from(user: User) -> Self {
        Credential {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}
