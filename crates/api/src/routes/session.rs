//! Route definitions for the `/session` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/session` (all require bearer auth).
///
/// ```text
/// GET    /       -> list
/// DELETE /       -> delete_all (?except_current=bool)
/// DELETE /{uuid} -> delete_one
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session/", get(session::list).delete(session::delete_all))
        .route("/session/{session_uuid}", delete(session::delete_one))
}
