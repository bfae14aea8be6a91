//! Route definitions for the `/password` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::password;
use crate::state::AppState;

/// Routes mounted at `/password`.
///
/// ```text
/// POST /reset   -> reset (start a reset, anti-enumeration)
/// POST /confirm -> confirm (finish with code + new password)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reset", post(password::reset))
        .route("/confirm", post(password::confirm))
}
