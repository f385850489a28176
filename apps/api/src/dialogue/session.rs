//! The single per-session application state value.
//!
//! `SessionState::default()` is the logged-out state. Logging out replaces
//! the whole value with it; nothing is cleared field by field.

use serde::Serialize;
use uuid::Uuid;

use crate::dialogue::actions::quick_actions_for;
use crate::dialogue::intake::{IntakeFlow, JobPostDraft};
use crate::models::chat::{Action, ChatMessage, Panel};
use crate::models::conversation::Conversation;
use crate::models::job::JobListing;
use crate::models::profile::{Profile, UserType};
use crate::services::AuthSession;

/// Ordered message history for one side of the assistant chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript(Vec<ChatMessage>);

impl Transcript {
    pub fn push(&mut self, message: ChatMessage) {
        self.0.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.0.last()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    #[serde(skip)]
    pub auth: Option<AuthSession>,
    pub user_type: Option<UserType>,
    pub profile: Option<Profile>,
    pub candidate_transcript: Transcript,
    pub recruiter_transcript: Transcript,
    pub active_panel: Option<Panel>,
    pub intake: IntakeFlow,
    pub loading: bool,
    pub auth_error: Option<String>,
    pub conversations: Vec<Conversation>,
    pub found_candidates: Vec<Profile>,
    pub selected_candidate: Option<Profile>,
    pub candidate_to_connect: Option<Profile>,
    pub suggested_jobs: Vec<JobListing>,
    pub selected_job: Option<JobListing>,
    /// Prefill for the find-candidates panel form.
    pub job_post_draft: JobPostDraft,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth: None,
            user_type: None,
            profile: None,
            candidate_transcript: Transcript::default(),
            recruiter_transcript: Transcript::default(),
            active_panel: Some(Panel::Auth),
            intake: IntakeFlow::default(),
            loading: false,
            auth_error: None,
            conversations: Vec::new(),
            found_candidates: Vec::new(),
            selected_candidate: None,
            candidate_to_connect: None,
            suggested_jobs: Vec::new(),
            selected_job: None,
            job_post_draft: JobPostDraft::default(),
        }
    }
}

impl SessionState {
    pub fn user_id(&self) -> Option<Uuid> {
        self.auth.as_ref().map(|a| a.user_id)
    }

    /// The transcript the signed-in role chats in.
    pub fn transcript(&self) -> &Transcript {
        match self.user_type {
            Some(UserType::Recruiter) => &self.recruiter_transcript,
            _ => &self.candidate_transcript,
        }
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        match self.user_type {
            Some(UserType::Recruiter) => &mut self.recruiter_transcript,
            _ => &mut self.candidate_transcript,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            quick_actions: quick_actions_for(self.user_type),
            quick_actions_enabled: !self.loading,
            state: self.clone(),
        }
    }
}

/// Render-ready snapshot handed to the view layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub state: SessionState,
    pub quick_actions: Vec<Action>,
    /// Quick actions are disabled while a remote call is outstanding.
    pub quick_actions_enabled: bool,
}
