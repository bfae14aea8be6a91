//! Route definitions for the `/code` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::code;
use crate::state::AppState;

/// Routes mounted at `/code`.
///
/// ```text
/// POST /confirm -> confirm (redeem an email-activation code)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/confirm", post(code::confirm))
}
