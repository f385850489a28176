use crate::dialogue::registry::SessionRegistry;
use crate::services::Services;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live dialogue sessions keyed by the id handed out at creation.
    pub sessions: SessionRegistry,
    /// Remote collaborators every new session is wired to.
    pub services: Services,
}
