use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::favourites::Favourites;
use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};

/// Account business logic over an injected [`UserStore`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
}

fn normalize_user_name(raw: &str) -> AppResult<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("User Name is required".into()));
    }
    Ok(name)
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    #[instrument(skip(self, password, password_confirmation))]
    pub async fn register(
        &self,
        user_name: &str,
        password: &str,
        password_confirmation: &str,
    ) -> AppResult<String> {
        if password != password_confirmation {
            return Err(AppError::Validation("Passwords do not match".into()));
        }
        let user_name = normalize_user_name(user_name)?;

        let password_hash = hash_password(password).map_err(AppError::Internal)?;
        let new_user = NewUser {
            user_name: user_name.to_string(),
            password_hash,
        };

        match self.store.insert(new_user).await {
            Ok(user) => {
                info!(
                    user_id = %user.id,
                    user_name = %user.user_name,
                    created_at = %user.created_at,
                    "user registered"
                );
                Ok(format!("User {} successfully registered", user.user_name))
            }
            Err(StoreError::Conflict) => {
                warn!(%user_name, "user name already taken");
                Err(AppError::Conflict("User Name already taken".into()))
            }
            Err(e) => Err(AppError::storage("There was an error creating the user", e)),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, user_name: &str, password: &str) -> AppResult<User> {
        let user_name = normalize_user_name(user_name)?;
        let user = match self.store.find_by_user_name(user_name).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                warn!(%user_name, "login unknown user");
                return Err(AppError::NotFound(format!("Unable to find user {user_name}")));
            }
            Err(e) => {
                return Err(AppError::storage(
                    format!("Unable to find user {user_name}"),
                    e,
                ))
            }
        };

        let ok = verify_password(password, &user.password_hash).map_err(AppError::Internal)?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Auth(format!("Incorrect password for user {user_name}")));
        }

        info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_favourites(&self, id: Uuid) -> AppResult<Favourites> {
        self.store
            .find_by_id(id)
            .await
            .map(|u| u.favourites)
            .map_err(|e| {
                map_store_error(e, format!("Unable to get favourites for user with id: {id}"))
            })
    }

    #[instrument(skip(self))]
    pub async fn add_favourite(&self, id: Uuid, fav_id: &str) -> AppResult<Favourites> {
        let context = || format!("Unable to update favourites for user with id: {id}");
        let current = self
            .store
            .find_by_id(id)
            .await
            .map_err(|e| map_store_error(e, context()))?;
        if current.favourites.is_full() {
            warn!(user_id = %id, "favourites limit reached");
            return Err(AppError::Capacity);
        }

        let user = self
            .store
            .add_favourite(id, fav_id)
            .await
            .map_err(|e| map_store_error(e, context()))?;
        debug!(count = user.favourites.len(), updated_at = %user.updated_at, "favourite added");
        Ok(user.favourites)
    }

    #[instrument(skip(self))]
    pub async fn remove_favourite(&self, id: Uuid, fav_id: &str) -> AppResult<Favourites> {
        let user = self
            .store
            .remove_favourite(id, fav_id)
            .await
            .map_err(|e| {
                map_store_error(e, format!("Unable to update favourites for user with id: {id}"))
            })?;
        debug!(count = user.favourites.len(), updated_at = %user.updated_at, "favourite removed");
        Ok(user.favourites)
    }
}

fn map_store_error(e: StoreError, message: String) -> AppError {
    match e {
        StoreError::NotFound => AppError::NotFound(message),
        StoreError::CapacityReached => AppError::Capacity,
        StoreError::Conflict | StoreError::Database(_) => AppError::storage(message, e),
    }
}
