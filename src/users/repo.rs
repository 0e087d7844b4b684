use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::favourites::CAPACITY;
use super::repo_types::{NewUser, User, UserRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    /// Unique user name constraint hit.
    #[error("user name already exists")]
    Conflict,

    #[error("favourites capacity reached")]
    CapacityReached,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for user documents. Every mutation returns the post-mutation record.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<User>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<User>;
    /// Atomic set-add; a no-op when `fav_id` is already present.
    async fn add_favourite(&self, id: Uuid, fav_id: &str) -> StoreResult<User>;
    /// Atomic removal; a no-op when `fav_id` is absent.
    async fn remove_favourite(&self, id: Uuid, fav_id: &str) -> StoreResult<User>;

    async fn close(&self) {}
}

const USER_COLUMNS: &str = "id, user_name, password_hash, favourites, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (user_name, password_hash)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.user_name)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;
        debug!(user_id = %row.id, "user inserted");
        Ok(row.into())
    }

    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_name = $1"
        ))
        .bind(user_name)
        .fetch_optional(&self.db)
        .await?
        .map(User::from)
        .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(User::from)
            .ok_or(StoreError::NotFound)
    }

    async fn add_favourite(&self, id: Uuid, fav_id: &str) -> StoreResult<User> {
        // The cardinality guard keeps concurrent adds from pushing past the cap.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET favourites = CASE
                       WHEN $2 = ANY(favourites) THEN favourites
                       ELSE array_append(favourites, $2)
                   END,
                   updated_at = CASE
                       WHEN $2 = ANY(favourites) THEN updated_at
                       ELSE now()
                   END
             WHERE id = $1
               AND ($2 = ANY(favourites) OR cardinality(favourites) < $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fav_id)
        .bind(CAPACITY as i32)
        .fetch_optional(&self.db)
        .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        match exists {
            Some(_) => Err(StoreError::CapacityReached),
            None => Err(StoreError::NotFound),
        }
    }

    async fn remove_favourite(&self, id: Uuid, fav_id: &str) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET favourites = array_remove(favourites, $2),
                   updated_at = CASE
                       WHEN $2 = ANY(favourites) THEN now()
                       ELSE updated_at
                   END
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fav_id)
        .fetch_optional(&self.db)
        .await?
        .map(User::from)
        .ok_or(StoreError::NotFound)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn store() -> PgUserStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at Postgres");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        PgUserStore::new(pool)
    }

    async fn new_user(store: &PgUserStore) -> User {
        store
            .insert(NewUser {
                user_name: format!("user-{}", Uuid::new_v4()),
                password_hash: "$argon2id$placeholder".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn duplicate_user_name_conflicts() {
        let store = store().await;
        let user = new_user(&store).await;
        let err = store
            .insert(NewUser {
                user_name: user.user_name.clone(),
                password_hash: "other".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let found = store.find_by_user_name(&user.user_name).await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn adding_twice_keeps_one_and_leaves_record_untouched() {
        let store = store().await;
        let user = new_user(&store).await;
        let first = store.add_favourite(user.id, "movie42").await.unwrap();
        let second = store.add_favourite(user.id, "movie42").await.unwrap();
        assert_eq!(second.favourites.as_slice(), ["movie42".to_string()]);
        assert_eq!(second.updated_at, first.updated_at);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn add_past_capacity_fails_and_keeps_list() {
        let store = store().await;
        let user = new_user(&store).await;
        for i in 0..CAPACITY {
            store.add_favourite(user.id, &format!("movie{i}")).await.unwrap();
        }
        let err = store.add_favourite(user.id, "movie-extra").await.unwrap_err();
        assert!(matches!(err, StoreError::CapacityReached));

        let after = store.find_by_id(user.id).await.unwrap();
        assert_eq!(after.favourites.len(), CAPACITY);
        assert!(!after.favourites.contains("movie-extra"));

        // re-adding a present id at the cap is still a no-op
        let again = store.add_favourite(user.id, "movie0").await.unwrap();
        assert_eq!(again.favourites.len(), CAPACITY);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn removing_absent_id_changes_nothing() {
        let store = store().await;
        let user = new_user(&store).await;
        let before = store.add_favourite(user.id, "movie1").await.unwrap();

        let after = store.remove_favourite(user.id, "movie2").await.unwrap();
        assert_eq!(after.favourites.as_slice(), ["movie1".to_string()]);
        assert_eq!(after.updated_at, before.updated_at);

        let removed = store.remove_favourite(user.id, "movie1").await.unwrap();
        assert_eq!(removed.favourites.len(), 0);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn unknown_id_is_not_found() {
        let store = store().await;
        let id = Uuid::new_v4();
        assert!(matches!(store.find_by_id(id).await, Err(StoreError::NotFound)));
        assert!(matches!(store.add_favourite(id, "x").await, Err(StoreError::NotFound)));
        assert!(matches!(store.remove_favourite(id, "x").await, Err(StoreError::NotFound)));
    }
}
