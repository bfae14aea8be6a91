//! Route definitions for the `/token` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::token;
use crate::state::AppState;

/// Routes mounted at `/token`.
///
/// ```text
/// POST /refresh -> refresh
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/refresh", post(token::refresh))
}
