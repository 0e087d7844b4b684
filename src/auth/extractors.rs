use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Authorization scheme keyword, matched case-insensitively: `Authorization: JWT <token>`.
pub const AUTH_SCHEME: &str = "JWT";

/// Identity of the caller, taken from a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub user_name: String,
}

fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(AUTH_SCHEME) && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("Missing Authorization header".into()))?;

        let token = token_from_header(header)
            .ok_or_else(|| AppError::Unauthenticated("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Ok(identity) => Ok(AuthUser {
                user_id: identity.user_id,
                user_name: identity.user_name,
            }),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(AppError::Unauthenticated("Invalid or expired token".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::token_from_header;

    #[test]
    fn accepts_jwt_scheme_in_any_case() {
        assert_eq!(token_from_header("JWT abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(token_from_header("jwt abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(token_from_header("Bearer abc.def.ghi"), None);
        assert_eq!(token_from_header("JWT"), None);
        assert_eq!(token_from_header("JWT   "), None);
        assert_eq!(token_from_header("abc.def.ghi"), None);
    }
}
