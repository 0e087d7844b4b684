//! In-memory user store used by tests and local runs without Postgres.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::favourites::Favourites;
use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{NewUser, User};

#[derive(Debug, Default, Clone)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.user_name == user.user_name) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            user_name: user.user_name,
            password_hash: user.password_hash,
            favourites: Favourites::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<User> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| u.user_name == user_name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<User> {
        let users = self.users.read().await;
        users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn add_favourite(&self, id: Uuid, fav_id: &str) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        let changed = user
            .favourites
            .insert(fav_id)
            .map_err(|_| StoreError::CapacityReached)?;
        if changed {
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(user.clone())
    }

    async fn remove_favourite(&self, id: Uuid, fav_id: &str) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if user.favourites.remove(fav_id) {
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            user_name: name.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_user_name_conflicts() {
        let store = MemoryUserStore::new();
        store.insert(new_user("alice")).await.unwrap();
        let err = store.insert(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn user_names_are_case_sensitive() {
        let store = MemoryUserStore::new();
        store.insert(new_user("alice")).await.unwrap();
        store.insert(new_user("Alice")).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn mutations_on_unknown_id_are_not_found() {
        let store = MemoryUserStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.find_by_id(id).await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.add_favourite(id, "x").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.remove_favourite(id, "x").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn add_and_remove_return_post_mutation_state() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("bob")).await.unwrap();
        let after_add = store.add_favourite(user.id, "movie42").await.unwrap();
        assert_eq!(after_add.favourites.as_slice(), ["movie42".to_string()]);
        let after_remove = store.remove_favourite(user.id, "movie42").await.unwrap();
        assert_eq!(after_remove.favourites.len(), 0);
    }
}
