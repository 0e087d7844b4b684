use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::users::memory::MemoryUserStore;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::AccountService;

/// `DATABASE_URL` value selecting the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub accounts: AccountService,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the services.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        if config.database_url == MEMORY_DATABASE_URL {
            tracing::warn!("using in-memory user store; data is lost on restart");
            let store = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
            return Ok(Self::from_parts(config, store));
        }

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let store = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        Self {
            keys: JwtKeys::from_config(&config.jwt),
            accounts: AccountService::new(store),
            config,
        }
    }

    /// Releases the store connection.
    pub async fn shutdown(&self) {
        self.accounts.close().await;
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            database_url: MEMORY_DATABASE_URL.into(),
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
            },
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: Vec::new(),
        });

        Self::from_parts(config, Arc::new(MemoryUserStore::new()))
    }
}
