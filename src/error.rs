use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Failures surfaced by the account service and the auth extractor.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client input malformed, e.g. password mismatch.
    #[error("{0}")]
    Validation(String),

    /// Duplicate user name.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad credentials on login.
    #[error("{0}")]
    Auth(String),

    #[error("Favourites limit reached")]
    Capacity,

    /// Persistence failure. Only `message` reaches the client.
    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Missing, malformed or expired token.
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn storage(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Storage {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Storage { message, source } => {
                error!(error = %source, %message, "storage failure");
            }
            AppError::Internal(source) => {
                error!(error = %source, "internal error");
            }
            _ => {}
        }

        let body = json!({ "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_unprocessable() {
        for err in [
            AppError::Validation("Passwords do not match".into()),
            AppError::Conflict("User Name already taken".into()),
            AppError::NotFound("Unable to find user bob".into()),
            AppError::Auth("Incorrect password for user bob".into()),
            AppError::Capacity,
            AppError::storage("There was an error creating the user", anyhow::anyhow!("boom")),
        ] {
            assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY, "{err:?}");
        }
    }

    #[test]
    fn token_failures_are_unauthorized() {
        let err = AppError::Unauthenticated("Invalid or expired token".into());
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn storage_and_internal_hide_their_source() {
        let err = AppError::storage("Unable to get favourites", anyhow::anyhow!("pool timed out"));
        assert_eq!(err.to_string(), "Unable to get favourites");

        let err = AppError::Internal(anyhow::anyhow!("argon2 exploded"));
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
