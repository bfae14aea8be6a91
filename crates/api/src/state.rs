use std::sync::Arc;

use crate::codes::CodeStore;
use crate::config::ServerConfig;
use crate::directory::UserDirectory;
use crate::email::EmailSender;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). The external
/// collaborators are trait objects so integration tests can substitute
/// fakes without a Redis instance, directory, or email provider.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: janus_db::DbPool,
    /// Server configuration, loaded once at startup.
    pub config: Arc<ServerConfig>,
    /// Confirmation code store (Redis in production).
    pub codes: Arc<dyn CodeStore>,
    /// External user directory client.
    pub directory: Arc<dyn UserDirectory>,
    /// Outbound email dispatch.
    pub mailer: Arc<dyn EmailSender>,
}
