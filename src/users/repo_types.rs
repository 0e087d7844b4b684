use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::favourites::Favourites;

/// User record as stored.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub password_hash: String, // Argon2 PHC string
    pub favourites: Favourites,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by the caller on insert; the rest is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub user_name: String,
    pub password_hash: String,
    pub favourites: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            user_name: r.user_name,
            password_hash: r.password_hash,
            favourites: Favourites::from_stored(r.favourites),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
