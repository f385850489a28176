//! Contracts for the remote collaborators the dialogue controller talks to.
//!
//! Every collaborator sits behind an async trait carried as `Arc<dyn _>`, so
//! the controller never knows whether it is talking to Postgres, S3, the
//! Anthropic API, or an in-memory fake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dialogue::intake::{JobPostDraft, SearchCriteria};
use crate::errors::AppError;
use crate::models::chat::{Action, ChatMessage};
use crate::models::conversation::{Conversation, ConversationStatus, MessageRow};
use crate::models::job::JobListing;
use crate::models::profile::{
    DocumentRow, DocumentVisibility, ProfileRecord, ProfileUpdate, Skill, UserType,
};

pub mod assistant;
pub mod auth;
pub mod object_store;
pub mod profile_store;
pub mod prompts;

/// A chat reply, optionally offering the user one follow-up action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub text: String,
    #[serde(default)]
    pub action: Option<Action>,
}

/// Generative text: chat replies, field extraction, listing generation.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn chat_reply(
        &self,
        transcript: &[ChatMessage],
        system: &str,
    ) -> Result<AssistantReply, AppError>;

    /// Best effort; fields not stated in the text are left `None`.
    async fn extract_fields(&self, free_text: &str) -> Result<JobPostDraft, AppError>;

    async fn generate_listings(
        &self,
        roles: &[String],
        location: &str,
    ) -> Result<Vec<JobListing>, AppError>;
}

/// Metadata for a freshly uploaded document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub file_path: String,
    pub name: String,
    pub size: i64,
    pub file_type: String,
    pub visibility: DocumentVisibility,
}

/// Record-oriented access to profiles, skills, documents and conversations.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, user_id: Uuid) -> Result<ProfileRecord, AppError>;

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<(), AppError>;

    async fn replace_skills(&self, user_id: Uuid, skills: &[Skill]) -> Result<(), AppError>;

    async fn insert_document(&self, document: &NewDocument) -> Result<DocumentRow, AppError>;

    async fn delete_document(&self, user_id: Uuid, document_id: Uuid) -> Result<(), AppError>;

    async fn set_document_visibility(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        visibility: DocumentVisibility,
    ) -> Result<(), AppError>;

    /// Zero or more candidates for the criteria; matching policy is the store's.
    /// Returned documents exclude private ones.
    async fn search_candidates(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<ProfileRecord>, AppError>;

    /// Conversations the user participates in, from the user's side.
    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError>;

    /// Opens a pending conversation carrying the recruiter's first message.
    async fn create_connection_request(
        &self,
        recruiter_id: Uuid,
        candidate_id: Uuid,
        text: &str,
    ) -> Result<Uuid, AppError>;

    async fn set_conversation_status(
        &self,
        conversation_id: Uuid,
        status: ConversationStatus,
    ) -> Result<(), AppError>;

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> Result<MessageRow, AppError>;
}

/// Binary file storage with retrievable URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), AppError>;

    fn public_url(&self, path: &str) -> String;

    async fn remove(&self, path: &str) -> Result<(), AppError>;
}

/// A signed-in session issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Hosted identity: sign-up, sign-in, sign-out.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `Ok(None)` means the account exists but must be confirmed by email first.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_type: UserType,
    ) -> Result<Option<AuthSession>, AppError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

/// Everything a dialogue controller needs from the outside world.
#[derive(Clone)]
pub struct Services {
    pub assistant: Arc<dyn Assistant>,
    pub profiles: Arc<dyn ProfileStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn AuthProvider>,
    /// Applied by the controller to every remote call; expiry counts as failure.
    pub request_timeout: Duration,
}
