pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::dialogue::handlers;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_end_session),
        )
        .route("/api/v1/sessions/:id/sign-up", post(handlers::handle_sign_up))
        .route("/api/v1/sessions/:id/sign-in", post(handlers::handle_sign_in))
        .route("/api/v1/sessions/:id/sign-out", post(handlers::handle_sign_out))
        // Chat, actions and panels
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_send_message),
        )
        .route("/api/v1/sessions/:id/actions", post(handlers::handle_action))
        .route("/api/v1/sessions/:id/panel", post(handlers::handle_panel))
        .route(
            "/api/v1/sessions/:id/intake/cancel",
            post(handlers::handle_cancel_intake),
        )
        // Profile
        .route(
            "/api/v1/sessions/:id/profile",
            put(handlers::handle_update_profile),
        )
        .route(
            "/api/v1/sessions/:id/skills",
            put(handlers::handle_update_skills),
        )
        .route(
            "/api/v1/sessions/:id/documents",
            post(handlers::handle_upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/sessions/:id/documents/:doc_id",
            axum::routing::delete(handlers::handle_delete_document),
        )
        .route(
            "/api/v1/sessions/:id/documents/:doc_id/visibility",
            patch(handlers::handle_set_visibility),
        )
        // Candidate search
        .route("/api/v1/sessions/:id/search", post(handlers::handle_search))
        .route(
            "/api/v1/sessions/:id/search/draft",
            post(handlers::handle_search_draft),
        )
        .route(
            "/api/v1/sessions/:id/candidates/:cid/view",
            post(handlers::handle_view_candidate),
        )
        .route(
            "/api/v1/sessions/:id/candidates/:cid/connect",
            post(handlers::handle_open_connect),
        )
        // Conversations
        .route(
            "/api/v1/sessions/:id/connections",
            post(handlers::handle_send_connection),
        )
        .route(
            "/api/v1/sessions/:id/conversations/:conv/approve",
            post(handlers::handle_approve),
        )
        .route(
            "/api/v1/sessions/:id/conversations/:conv/deny",
            post(handlers::handle_deny),
        )
        .route(
            "/api/v1/sessions/:id/conversations/:conv/messages",
            post(handlers::handle_conversation_message),
        )
        // Suggested jobs
        .route(
            "/api/v1/sessions/:id/jobs/suggest",
            post(handlers::handle_suggest_jobs),
        )
        .route(
            "/api/v1/sessions/:id/jobs/:job_id/open",
            post(handlers::handle_open_job),
        )
        .with_state(state)
}
