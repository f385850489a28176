use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dialogue::intake::JobPostDraft;
use crate::dialogue::session::SessionView;
use crate::errors::AppError;
use crate::models::chat::{Action, Panel};
use crate::models::profile::{DocumentVisibility, ProfileUpdate, Skill, UserType};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreatedSession {
    pub session_id: Uuid,
    pub view: SessionView,
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// `panel: null` closes whatever is open.
#[derive(Deserialize)]
pub struct PanelRequest {
    pub panel: Option<Panel>,
}

#[derive(Deserialize)]
pub struct SkillsRequest {
    pub skills: Vec<Skill>,
}

#[derive(Deserialize)]
pub struct VisibilityRequest {
    pub visibility: DocumentVisibility,
}

#[derive(Deserialize)]
pub struct ConnectionRequest {
    pub candidate_id: Uuid,
    pub text: String,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreatedSession>) {
    let (session_id, view) = state.sessions.create(state.services.clone()).await;
    (StatusCode::CREATED, Json(CreatedSession { session_id, view }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    Ok(Json(handle.view()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handle = state.sessions.get(id).await?;
    handle.acquire()?.log_out().await;
    state.sessions.remove(id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/sign-up
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller
        .sign_up(&req.email, &req.password, req.user_type)
        .await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.sign_in(&req.email, &req.password).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.log_out().await;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.send_message(&req.text).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/actions
pub async fn handle_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<Action>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.handle_action(&action).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/panel
pub async fn handle_panel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PanelRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    match req.panel {
        Some(panel) => controller.open_panel(panel)?,
        None => controller.close_panel(),
    }
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/intake/cancel
pub async fn handle_cancel_intake(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.cancel_intake()?;
    Ok(Json(controller.view()))
}

/// PUT /api/v1/sessions/:id/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.update_profile(update).await?;
    Ok(Json(controller.view()))
}

/// PUT /api/v1/sessions/:id/skills
pub async fn handle_update_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SkillsRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.update_skills(req.skills).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/documents
///
/// Multipart form with a single `file` part.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("document").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
        upload = Some((file_name, content_type, body));
    }
    let (file_name, content_type, body) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' part".to_string()))?;

    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller
        .upload_document(&file_name, &content_type, body)
        .await?;
    Ok((StatusCode::CREATED, Json(controller.view())))
}

/// DELETE /api/v1/sessions/:id/documents/:doc_id
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.delete_document(doc_id).await?;
    Ok(Json(controller.view()))
}

/// PATCH /api/v1/sessions/:id/documents/:doc_id/visibility
pub async fn handle_set_visibility(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller
        .set_document_visibility(doc_id, req.visibility)
        .await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/search
pub async fn handle_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<JobPostDraft>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.search_with_draft(draft).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/search/draft
pub async fn handle_search_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.draft_from_text(&req.text).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/candidates/:cid/view
pub async fn handle_view_candidate(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.view_candidate(candidate_id)?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/candidates/:cid/connect
pub async fn handle_open_connect(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.open_connect(candidate_id)?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/connections
pub async fn handle_send_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConnectionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller
        .send_connection_request(req.candidate_id, &req.text)
        .await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/conversations/:conv/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    Path((id, conversation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.approve_conversation(conversation_id).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/conversations/:conv/deny
pub async fn handle_deny(
    State(state): State<AppState>,
    Path((id, conversation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.deny_conversation(conversation_id).await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/conversations/:conv/messages
pub async fn handle_conversation_message(
    State(state): State<AppState>,
    Path((id, conversation_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller
        .send_conversation_message(conversation_id, &req.text)
        .await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/jobs/suggest
pub async fn handle_suggest_jobs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.load_suggested_jobs().await?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/sessions/:id/jobs/:job_id/open
pub async fn handle_open_job(
    State(state): State<AppState>,
    Path((id, job_id)): Path<(Uuid, String)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut controller = handle.acquire()?;
    controller.open_job(&job_id)?;
    Ok(Json(controller.view()))
}
