//! Route definitions, one module per resource.

pub mod code;
pub mod health;
pub mod password;
pub mod session;
pub mod token;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// All versioned API routes, mounted under `/v1` by the entrypoint.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user", user::router())
        .nest("/token", token::router())
        .merge(session::router())
        .nest("/password", password::router())
        .nest("/code", code::router())
}
