use crate::state::AppState;
use axum::Router;

pub mod favourites;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::favourites_routes()
}
