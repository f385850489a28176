//! Dialogue controller: owns one session's state and turns user intents
//! into remote calls and transcript updates.
//!
//! Every remote call runs under the configured client-side timeout with the
//! `loading` flag raised, and the flag is lowered on every exit path. A
//! future dropped midway cannot lower it itself; `recover_interrupted` does,
//! and the registry's session guard runs it on release. Remote chat, search,
//! extraction and listing failures become assistant messages; only caller
//! mistakes (wrong role, unknown ids, disallowed transitions) surface as
//! `AppError`.

use std::future::Future;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dialogue::actions;
use crate::dialogue::intake::{IntakeStep, JobPostDraft, SearchCriteria};
use crate::dialogue::messages;
use crate::dialogue::session::{SessionState, SessionView};
use crate::errors::AppError;
use crate::models::chat::{Action, ActionKind, ChatMessage, Flow, Panel};
use crate::models::conversation::{sort_by_activity, ConversationStatus};
use crate::models::job::ensure_unique_ids;
use crate::models::profile::{
    Document, DocumentVisibility, Profile, ProfileRecord, ProfileUpdate, Skill, UserType,
};
use crate::services::object_store::document_key;
use crate::services::{AuthSession, NewDocument, Services};

pub struct DialogueController {
    services: Services,
    state: SessionState,
    publisher: watch::Sender<SessionView>,
}

impl DialogueController {
    pub fn new(services: Services) -> Self {
        let state = SessionState::default();
        let (publisher, _) = watch::channel(state.view());
        Self {
            services,
            state,
            publisher,
        }
    }

    /// Snapshots published after every state change, including the moment a
    /// remote call starts.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> SessionView {
        self.state.view()
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.view());
    }

    fn begin(&mut self) -> Result<(), AppError> {
        if self.state.loading {
            return Err(AppError::Conflict(
                "Another operation is still in progress".to_string(),
            ));
        }
        self.state.loading = true;
        self.publish();
        Ok(())
    }

    fn end(&mut self) {
        self.state.loading = false;
        self.publish();
    }

    /// Repairs state left by an operation whose future was dropped before it
    /// finished (client disconnect, request timeout). Only valid while no
    /// call is in flight; a no-op when nothing was interrupted.
    pub fn recover_interrupted(&mut self) {
        if !self.state.loading && !self.state.intake.is_dispatching() {
            return;
        }
        warn!("Recovering session from an interrupted operation");
        if self.state.intake.is_dispatching() {
            self.state.intake.finish();
            self.state
                .recruiter_transcript
                .push(ChatMessage::assistant(messages::SEARCH_FAILED));
        }
        self.end();
    }

    async fn remote<T>(
        &self,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.services.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Remote call exceeded {}s timeout",
                    self.services.request_timeout.as_secs()
                );
                Err(AppError::Timeout)
            }
        }
    }

    fn require_user(&self) -> Result<(Uuid, UserType), AppError> {
        match (self.state.user_id(), self.state.user_type) {
            (Some(id), Some(user_type)) => Ok((id, user_type)),
            _ => Err(AppError::Unauthorized),
        }
    }

    fn require_role(&self, role: UserType) -> Result<Uuid, AppError> {
        let (id, user_type) = self.require_user()?;
        if user_type != role {
            return Err(AppError::Forbidden(format!(
                "Only a {} can do this",
                role.as_str()
            )));
        }
        Ok(id)
    }

    fn assemble(&self, record: ProfileRecord) -> Result<Profile, AppError> {
        Profile::from_record(record, |path| self.services.objects.public_url(path))
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
    }

    // ── Session lifecycle ───────────────────────────────────────────────────

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        user_type: UserType,
    ) -> Result<(), AppError> {
        if !self.credentials_present(email, password) {
            return Ok(());
        }
        self.begin()?;
        let result = self
            .remote(self.services.auth.sign_up(email.trim(), password, user_type))
            .await;
        self.end();

        match result {
            Ok(Some(session)) => self.restore_session(session).await,
            Ok(None) => {
                self.set_auth_error(messages::SIGN_UP_CONFIRM_EMAIL.to_string());
                Ok(())
            }
            Err(e) => {
                self.set_auth_error(auth_message(&e));
                Ok(())
            }
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        if !self.credentials_present(email, password) {
            return Ok(());
        }
        self.begin()?;
        let result = self
            .remote(self.services.auth.sign_in(email.trim(), password))
            .await;
        self.end();

        match result {
            Ok(session) => self.restore_session(session).await,
            Err(e) => {
                self.set_auth_error(auth_message(&e));
                Ok(())
            }
        }
    }

    fn credentials_present(&mut self, email: &str, password: &str) -> bool {
        self.state.auth_error = None;
        if email.trim().is_empty() || password.is_empty() {
            self.set_auth_error("Email and password are required.".to_string());
            return false;
        }
        true
    }

    fn set_auth_error(&mut self, message: String) {
        self.state.auth_error = Some(message);
        self.publish();
    }

    /// Starts a signed-in session: loads the profile and conversations and
    /// greets the user in their transcript.
    pub async fn restore_session(&mut self, session: AuthSession) -> Result<(), AppError> {
        self.begin()?;
        let user_id = session.user_id;
        let loaded = self
            .remote(self.services.profiles.load_profile(user_id))
            .await
            .and_then(|record| self.assemble(record));

        let profile = match loaded {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile load failed for {user_id}: {e}; signing out");
                if let Err(e) = self
                    .remote(self.services.auth.sign_out(&session.access_token))
                    .await
                {
                    warn!("Sign-out after failed profile load also failed: {e}");
                }
                self.state = SessionState {
                    auth_error: Some(messages::PROFILE_LOAD_FAILED.to_string()),
                    ..SessionState::default()
                };
                self.publish();
                return Ok(());
            }
        };

        let user_type = profile.user_type;
        let onboarded = profile.is_onboarded();
        self.state = SessionState {
            auth: Some(session),
            user_type: Some(user_type),
            profile: Some(profile),
            active_panel: None,
            loading: true,
            ..SessionState::default()
        };
        if let Err(e) = self.reload_conversations(user_id).await {
            warn!("Could not load conversations for {user_id}: {e}");
        }

        let greeting = match (user_type, onboarded) {
            (UserType::Candidate, true) => ChatMessage::assistant(messages::CANDIDATE_WELCOME_BACK),
            (UserType::Candidate, false) => ChatMessage::assistant_with(
                messages::CANDIDATE_WELCOME_NEW,
                vec![actions::setup_profile()],
            ),
            (UserType::Recruiter, _) => ChatMessage::assistant(messages::RECRUITER_WELCOME),
        };
        self.state.transcript_mut().push(greeting);
        info!("Session started for {} {user_id}", user_type.as_str());
        self.end();
        Ok(())
    }

    /// Revokes the backend session (best effort) and resets to the initial state.
    pub async fn log_out(&mut self) {
        if let Some(auth) = self.state.auth.take() {
            if let Err(e) = self
                .remote(self.services.auth.sign_out(&auth.access_token))
                .await
            {
                warn!("Sign-out for {} failed: {e}", auth.user_id);
            }
            info!("Session ended for {}", auth.user_id);
        }
        self.state = SessionState::default();
        self.publish();
    }

    // ── Chat and actions ────────────────────────────────────────────────────

    pub async fn send_message(&mut self, text: &str) -> Result<(), AppError> {
        let (_, user_type) = self.require_user()?;
        if self.state.loading {
            return Err(AppError::Conflict(
                "Another operation is still in progress".to_string(),
            ));
        }
        let text = text.trim();

        if user_type == UserType::Recruiter && self.state.intake.is_active() {
            if !text.is_empty() {
                self.state.transcript_mut().push(ChatMessage::user(text));
            }
            match self.state.intake.submit(text) {
                Some(IntakeStep::Prompt(prompt)) => {
                    self.state.transcript_mut().push(ChatMessage::assistant(prompt));
                    self.publish();
                }
                Some(IntakeStep::Dispatch(criteria)) => self.dispatch_search(criteria).await,
                None => {}
            }
            return Ok(());
        }

        if text.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }
        self.state.transcript_mut().push(ChatMessage::user(text));
        self.begin()?;

        let system = match user_type {
            UserType::Candidate => messages::CANDIDATE_SYSTEM,
            UserType::Recruiter => messages::RECRUITER_SYSTEM,
        };
        let reply = self
            .remote(
                self.services
                    .assistant
                    .chat_reply(self.state.transcript().messages(), system),
            )
            .await;

        let message = match reply {
            Ok(reply) => ChatMessage::assistant_with(reply.text, reply.action.into_iter().collect()),
            Err(e) => {
                warn!("Chat reply failed: {e}");
                ChatMessage::assistant(messages::CHAT_UNAVAILABLE)
            }
        };
        self.state.transcript_mut().push(message);
        self.end();
        Ok(())
    }

    /// Performs exactly one thing per action. Rejected while a call is in flight.
    pub async fn handle_action(&mut self, action: &Action) -> Result<(), AppError> {
        if self.state.loading {
            return Err(AppError::Conflict(
                "Actions are disabled while a request is in progress".to_string(),
            ));
        }
        match action.kind {
            ActionKind::OpenPanel { panel } => self.open_panel(panel),
            ActionKind::StartFlow {
                flow: Flow::FindCandidates,
            } => self.start_intake(),
            ActionKind::LogOut => {
                self.log_out().await;
                Ok(())
            }
        }
    }

    pub fn open_panel(&mut self, panel: Panel) -> Result<(), AppError> {
        if panel != Panel::Auth {
            self.require_user()?;
        }
        self.state.active_panel = Some(panel);
        self.publish();
        Ok(())
    }

    /// Closes the open panel and drops whatever selection it was showing.
    pub fn close_panel(&mut self) {
        match self.state.active_panel.take() {
            Some(Panel::PublicProfile) => self.state.selected_candidate = None,
            Some(Panel::ConnectRequest) => self.state.candidate_to_connect = None,
            Some(Panel::JobDetails) => self.state.selected_job = None,
            _ => {}
        }
        self.publish();
    }

    // ── Candidate search ────────────────────────────────────────────────────

    /// Starts the intake flow, restarting it if one is already underway.
    pub fn start_intake(&mut self) -> Result<(), AppError> {
        self.require_role(UserType::Recruiter)?;
        let prompt = self.state.intake.start();
        self.state
            .recruiter_transcript
            .push(ChatMessage::assistant(prompt));
        self.publish();
        Ok(())
    }

    /// Abandons the intake flow, if one is running. Also clears a
    /// `Dispatching` flow left behind by an interrupted search: holding
    /// `&mut self` means no call is in flight.
    pub fn cancel_intake(&mut self) -> Result<(), AppError> {
        self.require_role(UserType::Recruiter)?;
        if self.state.intake.is_active() {
            self.state.intake.cancel();
            self.state.loading = false;
            self.state
                .recruiter_transcript
                .push(ChatMessage::assistant(messages::INTAKE_CANCELLED));
            self.publish();
        }
        Ok(())
    }

    /// Runs one candidate search and reports the outcome in the recruiter
    /// transcript. Always leaves the intake idle and `loading` false.
    async fn dispatch_search(&mut self, criteria: SearchCriteria) {
        self.state.loading = true;
        self.publish();
        info!(
            "Searching candidates: title='{}' skills={:?} location='{}'",
            criteria.title, criteria.skills, criteria.location
        );

        let result = self
            .remote(self.services.profiles.search_candidates(&criteria))
            .await;

        let message = match result {
            Ok(records) => {
                let found: Vec<Profile> = records
                    .into_iter()
                    .filter_map(|record| match self.assemble(record) {
                        Ok(profile) => Some(profile.counterpart_view()),
                        Err(e) => {
                            warn!("Skipping unreadable candidate profile: {e}");
                            None
                        }
                    })
                    .collect();
                let count = found.len();
                self.state.found_candidates = found;
                if count == 0 {
                    ChatMessage::assistant(messages::no_candidates(
                        &criteria.title,
                        &criteria.location,
                    ))
                } else {
                    ChatMessage::assistant_with(
                        messages::candidates_found(count),
                        vec![actions::view_candidates()],
                    )
                }
            }
            Err(e) => {
                warn!("Candidate search failed: {e}");
                ChatMessage::assistant(messages::SEARCH_FAILED)
            }
        };

        self.state.recruiter_transcript.push(message);
        self.state.intake.finish();
        self.end();
    }

    /// Searches with a complete draft submitted from the find-candidates panel.
    /// Supersedes any conversational intake in progress.
    pub async fn search_with_draft(&mut self, draft: JobPostDraft) -> Result<(), AppError> {
        self.require_role(UserType::Recruiter)?;
        if self.state.loading {
            return Err(AppError::Conflict(
                "Another operation is still in progress".to_string(),
            ));
        }
        self.state.job_post_draft = draft.clone();
        let criteria = draft.into_criteria().ok_or_else(|| {
            AppError::Validation(
                "A job title, at least one skill and a location are required".to_string(),
            )
        })?;
        self.state.intake.cancel();
        self.state.active_panel = None;
        self.dispatch_search(criteria).await;
        Ok(())
    }

    /// Prefills the find-candidates panel from a pasted job description.
    /// Newly extracted fields win; the existing draft fills the gaps.
    pub async fn draft_from_text(&mut self, text: &str) -> Result<(), AppError> {
        self.require_role(UserType::Recruiter)?;
        if text.trim().is_empty() {
            return Err(AppError::Validation("Job description cannot be empty".to_string()));
        }
        self.begin()?;
        let result = self
            .remote(self.services.assistant.extract_fields(text))
            .await;
        match result {
            Ok(mut draft) => {
                draft.merge_missing(std::mem::take(&mut self.state.job_post_draft));
                self.state.job_post_draft = draft;
                self.state.active_panel = Some(Panel::FindCandidates);
            }
            Err(e) => {
                warn!("Job post extraction failed: {e}");
                self.state
                    .recruiter_transcript
                    .push(ChatMessage::assistant(messages::DRAFT_EXTRACTION_FAILED));
            }
        }
        self.end();
        Ok(())
    }

    pub fn view_candidate(&mut self, candidate_id: Uuid) -> Result<(), AppError> {
        self.require_role(UserType::Recruiter)?;
        let candidate = self.found_candidate(candidate_id)?;
        self.state.selected_candidate = Some(candidate);
        self.state.active_panel = Some(Panel::PublicProfile);
        self.publish();
        Ok(())
    }

    pub fn open_connect(&mut self, candidate_id: Uuid) -> Result<(), AppError> {
        self.require_role(UserType::Recruiter)?;
        let candidate = self.found_candidate(candidate_id)?;
        self.state.candidate_to_connect = Some(candidate);
        self.state.active_panel = Some(Panel::ConnectRequest);
        self.publish();
        Ok(())
    }

    fn found_candidate(&self, candidate_id: Uuid) -> Result<Profile, AppError> {
        self.state
            .found_candidates
            .iter()
            .find(|c| c.id == candidate_id)
            .map(Profile::counterpart_view)
            .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))
    }

    // ── Profile ─────────────────────────────────────────────────────────────

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<(), AppError> {
        let (user_id, _) = self.require_user()?;
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }
        self.begin()?;
        let result = self
            .remote(self.services.profiles.update_profile(user_id, &update))
            .await;
        if result.is_ok() {
            if let Some(profile) = self.state.profile.as_mut() {
                profile.apply(&update);
            }
        }
        self.end();
        result
    }

    pub async fn update_skills(&mut self, skills: Vec<Skill>) -> Result<(), AppError> {
        let (user_id, _) = self.require_user()?;
        if let Some(bad) = skills.iter().find(|s| !s.is_valid()) {
            return Err(AppError::Validation(format!(
                "Skill '{}' needs a name and a level from 1 to {}",
                bad.name,
                Skill::MAX_LEVEL
            )));
        }
        let mut unique: Vec<Skill> = Vec::with_capacity(skills.len());
        for skill in skills {
            let name = skill.name.trim().to_string();
            if !unique.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
                unique.push(Skill { name, ..skill });
            }
        }

        self.begin()?;
        let result = self
            .remote(self.services.profiles.replace_skills(user_id, &unique))
            .await;
        if result.is_ok() {
            if let Some(profile) = self.state.profile.as_mut() {
                profile.skills = unique;
            }
        }
        self.end();
        result
    }

    pub async fn upload_document(
        &mut self,
        file_name: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<Document, AppError> {
        let (user_id, _) = self.require_user()?;
        let file_name = file_name.trim();
        if file_name.is_empty() || body.is_empty() {
            return Err(AppError::Validation(
                "Upload needs a file name and content".to_string(),
            ));
        }
        self.begin()?;
        let result = self
            .store_document(user_id, file_name, content_type, body)
            .await;
        if let Ok(document) = &result {
            if let Some(profile) = self.state.profile.as_mut() {
                profile.documents.push(document.clone());
            }
        }
        self.end();
        result
    }

    async fn store_document(
        &self,
        user_id: Uuid,
        file_name: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<Document, AppError> {
        let path = document_key(user_id, Utc::now().timestamp_millis(), file_name);
        let size = body.len() as i64;
        self.remote(self.services.objects.upload(&path, body, content_type))
            .await?;

        let new_document = NewDocument {
            user_id,
            file_path: path.clone(),
            name: file_name.to_string(),
            size,
            file_type: file_extension(file_name),
            visibility: DocumentVisibility::Gated,
        };
        match self
            .remote(self.services.profiles.insert_document(&new_document))
            .await
        {
            Ok(row) => Ok(Document::from_row(row, self.services.objects.public_url(&path))),
            Err(e) => {
                if let Err(cleanup) = self.remote(self.services.objects.remove(&path)).await {
                    warn!("Orphaned upload {path} could not be removed: {cleanup}");
                }
                Err(e)
            }
        }
    }

    pub async fn delete_document(&mut self, document_id: Uuid) -> Result<(), AppError> {
        let (user_id, _) = self.require_user()?;
        let path = self.own_document(document_id)?.file_path.clone();
        self.begin()?;
        let result = self
            .remote(self.services.profiles.delete_document(user_id, document_id))
            .await;
        if result.is_ok() {
            if let Err(e) = self.remote(self.services.objects.remove(&path)).await {
                warn!("Document {document_id} deleted but object {path} remains: {e}");
            }
            if let Some(profile) = self.state.profile.as_mut() {
                profile.documents.retain(|d| d.id != document_id);
            }
        }
        self.end();
        result
    }

    pub async fn set_document_visibility(
        &mut self,
        document_id: Uuid,
        visibility: DocumentVisibility,
    ) -> Result<(), AppError> {
        let (user_id, _) = self.require_user()?;
        self.own_document(document_id)?;
        self.begin()?;
        let result = self
            .remote(
                self.services
                    .profiles
                    .set_document_visibility(user_id, document_id, visibility),
            )
            .await;
        if result.is_ok() {
            if let Some(document) = self
                .state
                .profile
                .as_mut()
                .and_then(|p| p.documents.iter_mut().find(|d| d.id == document_id))
            {
                document.visibility = visibility;
            }
        }
        self.end();
        result
    }

    fn own_document(&self, document_id: Uuid) -> Result<&Document, AppError> {
        self.state
            .profile
            .as_ref()
            .and_then(|p| p.documents.iter().find(|d| d.id == document_id))
            .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))
    }

    // ── Conversations ───────────────────────────────────────────────────────

    async fn reload_conversations(&mut self, user_id: Uuid) -> Result<(), AppError> {
        let mut conversations = self
            .remote(self.services.profiles.list_conversations(user_id))
            .await?;
        sort_by_activity(&mut conversations);
        self.state.conversations = conversations;
        Ok(())
    }

    pub async fn send_connection_request(
        &mut self,
        candidate_id: Uuid,
        text: &str,
    ) -> Result<(), AppError> {
        let recruiter_id = self.require_role(UserType::Recruiter)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "A connection request needs a message".to_string(),
            ));
        }
        self.begin()?;
        let result = self
            .remote(
                self.services
                    .profiles
                    .create_connection_request(recruiter_id, candidate_id, text),
            )
            .await;
        if result.is_ok() {
            self.state.candidate_to_connect = None;
            if self.state.active_panel == Some(Panel::ConnectRequest) {
                self.state.active_panel = None;
            }
            if let Err(e) = self.reload_conversations(recruiter_id).await {
                warn!("Could not refresh conversations after connection request: {e}");
            }
        }
        self.end();
        result.map(|_| ())
    }

    pub async fn approve_conversation(&mut self, conversation_id: Uuid) -> Result<(), AppError> {
        self.respond_to_request(conversation_id, ConversationStatus::Accepted)
            .await
    }

    pub async fn deny_conversation(&mut self, conversation_id: Uuid) -> Result<(), AppError> {
        self.respond_to_request(conversation_id, ConversationStatus::Denied)
            .await
    }

    async fn respond_to_request(
        &mut self,
        conversation_id: Uuid,
        next: ConversationStatus,
    ) -> Result<(), AppError> {
        self.require_role(UserType::Candidate)?;
        let current = self.conversation_status(conversation_id)?;
        if !current.can_become(next) {
            return Err(AppError::Conflict(format!(
                "Conversation is already {}",
                current.as_str()
            )));
        }
        self.begin()?;
        let result = self
            .remote(
                self.services
                    .profiles
                    .set_conversation_status(conversation_id, next),
            )
            .await;
        if result.is_ok() {
            if let Some(conversation) = self
                .state
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation_id)
            {
                conversation.status = next;
            }
            info!("Conversation {conversation_id} is now {}", next.as_str());
        }
        self.end();
        result
    }

    pub async fn send_conversation_message(
        &mut self,
        conversation_id: Uuid,
        text: &str,
    ) -> Result<(), AppError> {
        let (user_id, _) = self.require_user()?;
        let status = self.conversation_status(conversation_id)?;
        if status != ConversationStatus::Accepted {
            return Err(AppError::Conflict(
                "Messages can only be sent once the request is accepted".to_string(),
            ));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }
        self.begin()?;
        let result = self
            .remote(
                self.services
                    .profiles
                    .insert_message(conversation_id, user_id, text),
            )
            .await;
        if let Ok(row) = &result {
            if let Some(conversation) = self
                .state
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation_id)
            {
                conversation.push_own(row);
            }
            sort_by_activity(&mut self.state.conversations);
        }
        self.end();
        result.map(|_| ())
    }

    fn conversation_status(&self, conversation_id: Uuid) -> Result<ConversationStatus, AppError> {
        self.state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.status)
            .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))
    }

    // ── Suggested jobs ──────────────────────────────────────────────────────

    /// Generates listings from the candidate's roles (or title) and location.
    /// A generation failure is reported in the transcript, not as an error.
    pub async fn load_suggested_jobs(&mut self) -> Result<(), AppError> {
        self.require_role(UserType::Candidate)?;
        let (roles, location) = match &self.state.profile {
            Some(profile) => {
                let mut roles = profile.roles.clone();
                if roles.is_empty() {
                    roles.extend(profile.title.clone());
                }
                let location = profile
                    .location
                    .clone()
                    .unwrap_or_else(|| "Remote".to_string());
                (roles, location)
            }
            None => return Err(AppError::Unauthorized),
        };
        if roles.is_empty() {
            return Err(AppError::Validation(
                "Add a title or preferred roles to your profile first".to_string(),
            ));
        }

        self.begin()?;
        let result = self
            .remote(self.services.assistant.generate_listings(&roles, &location))
            .await;
        match result {
            Ok(mut jobs) => {
                ensure_unique_ids(&mut jobs, Utc::now().timestamp_millis());
                self.state.suggested_jobs = jobs;
                self.state.active_panel = Some(Panel::SuggestedJobs);
            }
            Err(e) => {
                warn!("Job suggestions failed: {e}");
                self.state.suggested_jobs.clear();
                self.state
                    .candidate_transcript
                    .push(ChatMessage::assistant(messages::JOBS_UNAVAILABLE));
            }
        }
        self.end();
        Ok(())
    }

    pub fn open_job(&mut self, job_id: &str) -> Result<(), AppError> {
        self.require_role(UserType::Candidate)?;
        let job = self
            .state
            .suggested_jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
        self.state.selected_job = Some(job);
        self.state.active_panel = Some(Panel::JobDetails);
        self.publish();
        Ok(())
    }
}

fn auth_message(error: &AppError) -> String {
    match error {
        AppError::Auth(message) => message.clone(),
        _ => messages::AUTH_UNREACHABLE.to_string(),
    }
}

fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "file".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::dialogue::intake::IntakeState;
    use crate::dialogue::testing::{conversation, record, Harness};
    use crate::models::chat::Author;
    use crate::models::job::JobListing;
    use crate::models::profile::DocumentRow;
    use crate::services::AssistantReply;

    async fn signed_in(
        harness: &Harness,
        user_type: UserType,
        name: Option<&str>,
        title: Option<&str>,
    ) -> DialogueController {
        let session = harness.account("user@example.com", record(user_type, name, title));
        let mut controller = DialogueController::new(harness.services());
        controller.restore_session(session).await.unwrap();
        controller
    }

    async fn recruiter(harness: &Harness) -> DialogueController {
        signed_in(harness, UserType::Recruiter, Some("Alex"), Some("Talent Lead")).await
    }

    fn last_text(transcript: &crate::dialogue::session::Transcript) -> &str {
        transcript.last().map(|m| m.text.as_str()).unwrap_or_default()
    }

    fn candidate_with_documents() -> ProfileRecord {
        let mut candidate = record(UserType::Candidate, Some("Jane Doe"), Some("Registered Nurse"));
        let id = candidate.profile.id;
        for (name, visibility) in [("resume.pdf", "public"), ("notes.pdf", "private")] {
            candidate.documents.push(DocumentRow {
                id: Uuid::new_v4(),
                user_id: id,
                file_path: format!("{id}/{name}"),
                name: name.to_string(),
                size: 10,
                file_type: "pdf".to_string(),
                visibility: visibility.to_string(),
                created_at: Utc::now(),
            });
        }
        candidate
    }

    async fn run_intake(controller: &mut DialogueController) {
        controller.start_intake().unwrap();
        controller.send_message("Registered Nurse").await.unwrap();
        controller.send_message("IV Insertion, Patient Care").await.unwrap();
        controller.send_message("New York, NY").await.unwrap();
    }

    #[tokio::test]
    async fn test_new_candidate_is_greeted_with_profile_setup() {
        let harness = Harness::default();
        let controller = signed_in(&harness, UserType::Candidate, Some("Jane"), None).await;
        let state = controller.state();

        assert_eq!(state.active_panel, None);
        assert!(!state.loading);
        let greeting = state.candidate_transcript.last().unwrap();
        assert_eq!(greeting.text, messages::CANDIDATE_WELCOME_NEW);
        assert_eq!(greeting.actions, vec![actions::setup_profile()]);
        assert_eq!(controller.view().quick_actions, actions::candidate_quick_actions());
    }

    #[tokio::test]
    async fn test_returning_candidate_gets_plain_welcome() {
        let harness = Harness::default();
        let controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        let greeting = controller.state().candidate_transcript.last().unwrap();
        assert_eq!(greeting.text, messages::CANDIDATE_WELCOME_BACK);
        assert!(greeting.actions.is_empty());
    }

    #[tokio::test]
    async fn test_recruiter_greeting_lands_in_recruiter_transcript() {
        let harness = Harness::default();
        let controller = recruiter(&harness).await;
        assert_eq!(
            last_text(&controller.state().recruiter_transcript),
            messages::RECRUITER_WELCOME
        );
        assert!(controller.state().candidate_transcript.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_with_bad_credentials_sets_auth_error() {
        let harness = Harness::default();
        let mut controller = DialogueController::new(harness.services());
        controller.sign_in("nobody@example.com", "pw").await.unwrap();

        let state = controller.state();
        assert_eq!(state.auth_error.as_deref(), Some("Invalid login credentials"));
        assert_eq!(state.active_panel, Some(Panel::Auth));
        assert!(state.user_id().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_loads_stored_profile() {
        let harness = Harness::default();
        harness.account(
            "jane@example.com",
            record(UserType::Candidate, Some("Jane"), Some("Nurse")),
        );
        let mut controller = DialogueController::new(harness.services());
        controller.sign_in("jane@example.com", "pw").await.unwrap();

        assert_eq!(controller.state().user_type, Some(UserType::Candidate));
        assert!(controller.state().auth_error.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let harness = Harness::default();
        harness.auth.confirm_pending.store(true, Ordering::SeqCst);
        let mut controller = DialogueController::new(harness.services());
        controller
            .sign_up("new@example.com", "pw", UserType::Candidate)
            .await
            .unwrap();
        assert_eq!(
            controller.state().auth_error.as_deref(),
            Some(messages::SIGN_UP_CONFIRM_EMAIL)
        );
    }

    #[tokio::test]
    async fn test_unreachable_auth_is_reported_generically() {
        let harness = Harness::default();
        harness.auth.unreachable.store(true, Ordering::SeqCst);
        let mut controller = DialogueController::new(harness.services());
        controller.sign_in("a@example.com", "pw").await.unwrap();
        assert_eq!(
            controller.state().auth_error.as_deref(),
            Some(messages::AUTH_UNREACHABLE)
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_never_reach_auth() {
        let harness = Harness::default();
        harness.auth.unreachable.store(true, Ordering::SeqCst);
        let mut controller = DialogueController::new(harness.services());
        controller.sign_in("  ", "").await.unwrap();
        assert_eq!(
            controller.state().auth_error.as_deref(),
            Some("Email and password are required.")
        );
    }

    #[tokio::test]
    async fn test_profile_load_failure_signs_out() {
        let harness = Harness::default();
        let mut controller = DialogueController::new(harness.services());
        let session = AuthSession {
            access_token: "orphan".to_string(),
            user_id: Uuid::new_v4(),
            email: None,
        };
        controller.restore_session(session).await.unwrap();

        let state = controller.state();
        assert!(state.user_id().is_none());
        assert_eq!(state.active_panel, Some(Panel::Auth));
        assert_eq!(state.auth_error.as_deref(), Some(messages::PROFILE_LOAD_FAILED));
        assert_eq!(*harness.auth.signed_out.lock().unwrap(), vec!["orphan".to_string()]);
    }

    #[tokio::test]
    async fn test_log_out_resets_everything() {
        let harness = Harness::default();
        let mut controller = recruiter(&harness).await;
        controller.start_intake().unwrap();
        controller
            .handle_action(&Action::log_out("Logout"))
            .await
            .unwrap();

        let state = controller.state();
        assert!(state.user_id().is_none());
        assert!(state.recruiter_transcript.is_empty());
        assert_eq!(*state.intake.state(), IntakeState::Idle);
        assert_eq!(state.active_panel, Some(Panel::Auth));
        assert_eq!(harness.auth.signed_out.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_intake_dispatches_exactly_one_search() {
        let harness = Harness::default();
        *harness.profiles.search_results.lock().unwrap() = vec![
            candidate_with_documents(),
            record(UserType::Candidate, Some("Sam"), Some("RN")),
        ];
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;

        let calls = harness.profiles.search_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].title, "Registered Nurse");
        assert_eq!(calls[0].skills, vec!["IV Insertion", "Patient Care"]);
        assert_eq!(calls[0].location, "New York, NY");

        let state = controller.state();
        let outcome = state.recruiter_transcript.last().unwrap();
        assert_eq!(outcome.text, messages::candidates_found(2));
        assert_eq!(outcome.actions, vec![actions::view_candidates()]);
        assert_eq!(state.found_candidates.len(), 2);
        assert_eq!(*state.intake.state(), IntakeState::Idle);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_blank_answer_reprompts_without_advancing() {
        let harness = Harness::default();
        let mut controller = recruiter(&harness).await;
        controller.start_intake().unwrap();
        let before = controller.state().recruiter_transcript.len();
        controller.send_message("   ").await.unwrap();

        let state = controller.state();
        assert_eq!(*state.intake.state(), IntakeState::AwaitingTitle);
        assert_eq!(state.recruiter_transcript.len(), before + 1);
        assert_eq!(last_text(&state.recruiter_transcript), messages::INTAKE_REASK_TITLE);
    }

    #[tokio::test]
    async fn test_empty_search_reports_no_matches() {
        let harness = Harness::default();
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;
        assert_eq!(
            last_text(&controller.state().recruiter_transcript),
            messages::no_candidates("Registered Nurse", "New York, NY")
        );
    }

    #[tokio::test]
    async fn test_failed_search_posts_one_apology() {
        let harness = Harness::default();
        harness.profiles.fail_search.store(true, Ordering::SeqCst);
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;

        let state = controller.state();
        assert_eq!(last_text(&state.recruiter_transcript), messages::SEARCH_FAILED);
        let apologies = state
            .recruiter_transcript
            .messages()
            .iter()
            .filter(|m| m.text == messages::SEARCH_FAILED)
            .count();
        assert_eq!(apologies, 1);
        assert_eq!(*state.intake.state(), IntakeState::Idle);
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_search_times_out_as_failure() {
        let harness = Harness::default();
        *harness.profiles.search_delay.lock().unwrap() = Some(Duration::from_secs(60));
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;

        let state = controller.state();
        assert_eq!(last_text(&state.recruiter_transcript), messages::SEARCH_FAILED);
        assert!(!state.loading);
        assert!(controller.view().quick_actions_enabled);
    }

    #[tokio::test]
    async fn test_restarting_intake_discards_answers() {
        let harness = Harness::default();
        let mut controller = recruiter(&harness).await;
        controller.start_intake().unwrap();
        controller.send_message("Registered Nurse").await.unwrap();
        controller
            .handle_action(&Action::start_flow("Search", Flow::FindCandidates))
            .await
            .unwrap();
        assert_eq!(*controller.state().intake.state(), IntakeState::AwaitingTitle);
        assert_eq!(
            last_text(&controller.state().recruiter_transcript),
            messages::INTAKE_ASK_TITLE
        );
    }

    #[tokio::test]
    async fn test_cancel_intake_returns_to_chat() {
        let harness = Harness::default();
        let mut controller = recruiter(&harness).await;
        controller.start_intake().unwrap();
        controller.send_message("Registered Nurse").await.unwrap();
        controller.cancel_intake().unwrap();
        assert_eq!(*controller.state().intake.state(), IntakeState::Idle);

        controller.send_message("Any tips for interviews?").await.unwrap();
        assert_eq!(last_text(&controller.state().recruiter_transcript), "Happy to help.");
        assert!(harness.profiles.search_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_candidates_cannot_start_search() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        let result = controller
            .handle_action(&Action::start_flow("Search", Flow::FindCandidates))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_chat_failure_becomes_apology() {
        let harness = Harness::default();
        harness.assistant.fail.store(true, Ordering::SeqCst);
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        controller.send_message("Hi there").await.unwrap();

        let transcript = &controller.state().candidate_transcript;
        assert_eq!(last_text(transcript), messages::CHAT_UNAVAILABLE);
        assert!(!controller.state().loading);
    }

    #[tokio::test]
    async fn test_chat_reply_carries_offered_action() {
        let harness = Harness::default();
        *harness.assistant.reply.lock().unwrap() = Some(AssistantReply {
            text: "Let's upload your resume.".to_string(),
            action: Some(Action::open_panel("Upload", Panel::DocumentsUpload)),
        });
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        controller.send_message("What next?").await.unwrap();

        let reply = controller.state().candidate_transcript.last().unwrap();
        assert_eq!(reply.author, Author::Assistant);
        assert_eq!(reply.actions.len(), 1);
        // greeting plus the user's message
        assert_eq!(*harness.assistant.transcripts.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_actions_rejected_while_loading() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        controller.state.loading = true;
        let result = controller
            .handle_action(&Action::open_panel("Skills", Panel::SkillsAssessment))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(controller.state().active_panel, None);
        assert!(!controller.view().quick_actions_enabled);
    }

    #[tokio::test]
    async fn test_subscribers_see_final_snapshot() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        let receiver = controller.subscribe();
        controller.open_panel(Panel::SkillsAssessment).unwrap();

        let view = receiver.borrow().clone();
        assert_eq!(view.state.active_panel, Some(Panel::SkillsAssessment));
        assert!(view.quick_actions_enabled);
    }

    #[tokio::test]
    async fn test_incomplete_draft_is_rejected_without_search() {
        let harness = Harness::default();
        let mut controller = recruiter(&harness).await;
        let draft = JobPostDraft {
            title: Some("Registered Nurse".to_string()),
            skills: Some(vec![" ".to_string()]),
            location: Some("Remote".to_string()),
        };
        let result = controller.search_with_draft(draft).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(harness.profiles.search_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_draft_from_text_prefills_panel() {
        let harness = Harness::default();
        *harness.assistant.extraction.lock().unwrap() = JobPostDraft {
            title: Some("ICU Nurse".to_string()),
            skills: None,
            location: Some("Boston, MA".to_string()),
        };
        let mut controller = recruiter(&harness).await;
        controller.state.job_post_draft.skills = Some(vec!["Triage".to_string()]);
        controller
            .draft_from_text("We need an ICU nurse in Boston")
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(state.active_panel, Some(Panel::FindCandidates));
        assert_eq!(state.job_post_draft.title.as_deref(), Some("ICU Nurse"));
        assert_eq!(state.job_post_draft.skills, Some(vec!["Triage".to_string()]));
        assert!(harness.profiles.search_calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_search_can_be_cancelled_and_recovered() {
        let harness = Harness::default();
        *harness.profiles.search_delay.lock().unwrap() = Some(Duration::from_secs(10));
        let mut controller = recruiter(&harness).await;
        controller.start_intake().unwrap();
        controller.send_message("RN").await.unwrap();
        controller.send_message("Triage").await.unwrap();

        let dropped =
            tokio::time::timeout(Duration::from_secs(1), controller.send_message("Austin")).await;
        assert!(dropped.is_err());
        assert!(controller.state().loading);
        assert!(controller.state().intake.is_dispatching());

        controller.cancel_intake().unwrap();
        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(*state.intake.state(), IntakeState::Idle);
        assert_eq!(last_text(&state.recruiter_transcript), messages::INTAKE_CANCELLED);

        controller.send_message("Any sourcing tips?").await.unwrap();
        assert_eq!(last_text(&controller.state().recruiter_transcript), "Happy to help.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_interrupted_reports_search_failure() {
        let harness = Harness::default();
        *harness.profiles.search_delay.lock().unwrap() = Some(Duration::from_secs(10));
        let mut controller = recruiter(&harness).await;
        controller.start_intake().unwrap();
        controller.send_message("RN").await.unwrap();
        controller.send_message("Triage").await.unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(1), controller.send_message("Austin")).await;

        let receiver = controller.subscribe();
        controller.recover_interrupted();
        let view = receiver.borrow().clone();
        assert!(!view.state.loading);
        assert!(view.quick_actions_enabled);
        assert_eq!(*view.state.intake.state(), IntakeState::Idle);
        assert_eq!(
            last_text(&view.state.recruiter_transcript),
            messages::SEARCH_FAILED
        );

        let before = controller.state().recruiter_transcript.len();
        controller.recover_interrupted();
        assert_eq!(controller.state().recruiter_transcript.len(), before);
    }

    #[tokio::test]
    async fn test_found_candidates_never_expose_email_or_private_documents() {
        let harness = Harness::default();
        *harness.profiles.search_results.lock().unwrap() = vec![candidate_with_documents()];
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;

        let json = serde_json::to_value(controller.view()).unwrap();
        let found = &json["found_candidates"][0];
        assert!(found["email"].is_null());
        assert_eq!(found["documents"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_becomes_apology() {
        let harness = Harness::default();
        harness.assistant.fail.store(true, Ordering::SeqCst);
        let mut controller = recruiter(&harness).await;
        controller
            .draft_from_text("We need an ICU nurse in Boston")
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(
            last_text(&state.recruiter_transcript),
            messages::DRAFT_EXTRACTION_FAILED
        );
        assert!(!state.loading);
        assert_eq!(state.active_panel, None);
        assert_eq!(state.job_post_draft, JobPostDraft::default());
    }

    #[tokio::test]
    async fn test_malformed_extraction_keeps_existing_draft() {
        let harness = Harness::default();
        harness
            .assistant
            .malformed_extraction
            .store(true, Ordering::SeqCst);
        let mut controller = recruiter(&harness).await;
        controller.state.job_post_draft.title = Some("ICU Nurse".to_string());
        controller.draft_from_text("???").await.unwrap();

        let state = controller.state();
        assert_eq!(state.job_post_draft.title.as_deref(), Some("ICU Nurse"));
        assert_eq!(
            last_text(&state.recruiter_transcript),
            messages::DRAFT_EXTRACTION_FAILED
        );
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_viewing_candidate_hides_private_documents() {
        let harness = Harness::default();
        let candidate = candidate_with_documents();
        let candidate_id = candidate.profile.id;
        *harness.profiles.search_results.lock().unwrap() = vec![candidate];
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;

        controller.view_candidate(candidate_id).unwrap();
        let selected = controller.state().selected_candidate.clone().unwrap();
        assert_eq!(selected.documents.len(), 1);
        assert_eq!(selected.documents[0].name, "resume.pdf");
        assert_eq!(controller.state().active_panel, Some(Panel::PublicProfile));

        controller.close_panel();
        assert!(controller.state().selected_candidate.is_none());
        assert!(matches!(
            controller.view_candidate(Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_request_closes_panel_and_reloads() {
        let harness = Harness::default();
        let candidate = candidate_with_documents();
        let candidate_id = candidate.profile.id;
        *harness.profiles.search_results.lock().unwrap() = vec![candidate];
        let mut controller = recruiter(&harness).await;
        run_intake(&mut controller).await;
        controller.open_connect(candidate_id).unwrap();

        controller
            .send_connection_request(candidate_id, "Hi Jane, are you open to new roles?")
            .await
            .unwrap();
        let state = controller.state();
        assert_eq!(state.active_panel, None);
        assert!(state.candidate_to_connect.is_none());
        assert_eq!(state.conversations.len(), 1);
        assert_eq!(state.conversations[0].status, ConversationStatus::Pending);
    }

    #[tokio::test]
    async fn test_request_can_be_answered_once() {
        let harness = Harness::default();
        let pending = conversation(Uuid::new_v4(), ConversationStatus::Pending);
        let id = pending.id;
        harness.profiles.conversations.lock().unwrap().push(pending);
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;

        controller.approve_conversation(id).await.unwrap();
        assert_eq!(controller.state().conversations[0].status, ConversationStatus::Accepted);
        assert!(matches!(
            controller.deny_conversation(id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_messages_require_accepted_conversation() {
        let harness = Harness::default();
        let pending = conversation(Uuid::new_v4(), ConversationStatus::Pending);
        let accepted = conversation(Uuid::new_v4(), ConversationStatus::Accepted);
        let (pending_id, accepted_id) = (pending.id, accepted.id);
        harness
            .profiles
            .conversations
            .lock()
            .unwrap()
            .extend([pending, accepted]);
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;

        assert!(matches!(
            controller.send_conversation_message(pending_id, "Hello").await,
            Err(AppError::Conflict(_))
        ));
        controller
            .send_conversation_message(accepted_id, "Thanks for reaching out!")
            .await
            .unwrap();
        let first = &controller.state().conversations[0];
        assert_eq!(first.id, accepted_id);
        assert_eq!(first.messages.last().unwrap().author, Author::User);
    }

    #[tokio::test]
    async fn test_suggested_jobs_get_unique_ids() {
        let harness = Harness::default();
        let job = |id: &str| JobListing {
            id: id.to_string(),
            title: "Registered Nurse".to_string(),
            company: "HealthCorp".to_string(),
            location: "Austin, TX".to_string(),
            description: String::new(),
            apply_url: String::new(),
        };
        *harness.assistant.listings.lock().unwrap() = vec![job("a"), job("a"), job("")];
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        controller.load_suggested_jobs().await.unwrap();

        let jobs = &controller.state().suggested_jobs;
        let mut ids: Vec<_> = jobs.iter().map(|j| j.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert_eq!(controller.state().active_panel, Some(Panel::SuggestedJobs));

        let first = jobs[0].id.clone();
        controller.open_job(&first).unwrap();
        assert_eq!(controller.state().active_panel, Some(Panel::JobDetails));
    }

    #[tokio::test]
    async fn test_job_generation_failure_is_reported_in_chat() {
        let harness = Harness::default();
        harness.assistant.fail.store(true, Ordering::SeqCst);
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        controller.load_suggested_jobs().await.unwrap();
        assert_eq!(
            last_text(&controller.state().candidate_transcript),
            messages::JOBS_UNAVAILABLE
        );
        assert!(controller.state().suggested_jobs.is_empty());
    }

    #[tokio::test]
    async fn test_upload_then_delete_document() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        let document = controller
            .upload_document("Resume.PDF", "application/pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        assert_eq!(document.visibility, DocumentVisibility::Gated);
        assert_eq!(document.file_type, "pdf");
        assert!(document.url.starts_with("https://files.test/documents/"));
        assert_eq!(controller.state().profile.as_ref().unwrap().documents.len(), 1);

        controller.delete_document(document.id).await.unwrap();
        assert!(controller.state().profile.as_ref().unwrap().documents.is_empty());
        assert_eq!(*harness.objects.removed.lock().unwrap(), vec![document.file_path]);
    }

    #[tokio::test]
    async fn test_failed_metadata_write_removes_upload() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        harness.profiles.fail_writes.store(true, Ordering::SeqCst);
        let result = controller
            .upload_document("cv.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await;

        assert!(result.is_err());
        assert_eq!(
            *harness.objects.uploaded.lock().unwrap(),
            *harness.objects.removed.lock().unwrap()
        );
        assert!(controller.state().profile.as_ref().unwrap().documents.is_empty());
    }

    #[tokio::test]
    async fn test_profile_snapshot_changes_only_after_save() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        let update = ProfileUpdate {
            title: Some("Charge Nurse".to_string()),
            ..Default::default()
        };

        harness.profiles.fail_writes.store(true, Ordering::SeqCst);
        assert!(controller.update_profile(update.clone()).await.is_err());
        assert_eq!(
            controller.state().profile.as_ref().unwrap().title.as_deref(),
            Some("Nurse")
        );

        harness.profiles.fail_writes.store(false, Ordering::SeqCst);
        controller.update_profile(update).await.unwrap();
        assert_eq!(
            controller.state().profile.as_ref().unwrap().title.as_deref(),
            Some("Charge Nurse")
        );
    }

    #[tokio::test]
    async fn test_skills_are_validated_and_deduplicated() {
        let harness = Harness::default();
        let mut controller =
            signed_in(&harness, UserType::Candidate, Some("Jane"), Some("Nurse")).await;
        let skill = |name: &str, level| Skill {
            name: name.to_string(),
            level,
        };

        assert!(matches!(
            controller.update_skills(vec![skill("Triage", 7)]).await,
            Err(AppError::Validation(_))
        ));
        controller
            .update_skills(vec![skill("Triage", 3), skill(" triage ", 1), skill("Phlebotomy", 2)])
            .await
            .unwrap();
        let saved = harness.profiles.skills.lock().unwrap().clone();
        assert_eq!(saved, vec![skill("Triage", 3), skill("Phlebotomy", 2)]);
    }
}
