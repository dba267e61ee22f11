use axum::Router;

pub mod cleanup;
pub mod system;

/// Router for the manual cleanup triggers.
pub fn router() -> Router {
    Router::new().nest("/cleanup", cleanup::router())
}
