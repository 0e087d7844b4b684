use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let payload = json_body(payload)?;
    let message = state
        .accounts
        .register(
            &payload.user_name,
            &payload.password,
            &payload.password_confirmation,
        )
        .await?;
    Ok(Json(MessageResponse { message }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let payload = json_body(payload)?;
    let user = state
        .accounts
        .authenticate(&payload.user_name, &payload.password)
        .await?;

    let token = state
        .keys
        .issue(user.id, &user.user_name)
        .map_err(AppError::Internal)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "login successful".into(),
        token,
    }))
}
