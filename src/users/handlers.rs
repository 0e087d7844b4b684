use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::favourites::Favourites;
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn favourites_routes() -> Router<AppState> {
    Router::new()
        .route("/favourites", get(list_favourites))
        .route(
            "/favourites/:id",
            put(add_favourite).delete(remove_favourite),
        )
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, user_name = %user.user_name))]
pub async fn list_favourites(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Favourites>> {
    Ok(Json(state.accounts.get_favourites(user.user_id).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, user_name = %user.user_name))]
pub async fn add_favourite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(fav_id): Path<String>,
) -> AppResult<Json<Favourites>> {
    Ok(Json(state.accounts.add_favourite(user.user_id, &fav_id).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, user_name = %user.user_name))]
pub async fn remove_favourite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(fav_id): Path<String>,
) -> AppResult<Json<Favourites>> {
    Ok(Json(state.accounts.remove_favourite(user.user_id, &fav_id).await?))
}
