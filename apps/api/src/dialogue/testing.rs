//! In-memory collaborators for controller and handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::dialogue::intake::{JobPostDraft, SearchCriteria};
use crate::errors::AppError;
use crate::models::chat::ChatMessage;
use crate::models::conversation::{Conversation, ConversationStatus, MessageRow, Participant};
use crate::models::job::JobListing;
use crate::models::profile::{
    DocumentRow, DocumentVisibility, ProfileRecord, ProfileRow, ProfileUpdate, Skill, UserType,
};
use crate::services::{
    Assistant, AssistantReply, AuthProvider, AuthSession, NewDocument, ObjectStore, ProfileStore,
    Services,
};

fn unavailable(what: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!("{what} unavailable"))
}

#[derive(Default)]
pub struct FakeAssistant {
    pub fail: AtomicBool,
    pub reply: Mutex<Option<AssistantReply>>,
    pub extraction: Mutex<JobPostDraft>,
    /// Makes `extract_fields` fail the way an unparseable model reply does.
    pub malformed_extraction: AtomicBool,
    pub listings: Mutex<Vec<JobListing>>,
    /// Transcript lengths seen by `chat_reply`.
    pub transcripts: Mutex<Vec<usize>>,
}

#[async_trait]
impl Assistant for FakeAssistant {
    async fn chat_reply(
        &self,
        transcript: &[ChatMessage],
        _system: &str,
    ) -> Result<AssistantReply, AppError> {
        self.transcripts.lock().unwrap().push(transcript.len());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Llm("model overloaded".to_string()));
        }
        Ok(self.reply.lock().unwrap().clone().unwrap_or(AssistantReply {
            text: "Happy to help.".to_string(),
            action: None,
        }))
    }

    async fn extract_fields(&self, _free_text: &str) -> Result<JobPostDraft, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Llm("model overloaded".to_string()));
        }
        if self.malformed_extraction.load(Ordering::SeqCst) {
            return Err(AppError::Llm(
                "Field extraction failed: Failed to parse JSON: expected value at line 1 column 1"
                    .to_string(),
            ));
        }
        Ok(self.extraction.lock().unwrap().clone())
    }

    async fn generate_listings(
        &self,
        _roles: &[String],
        _location: &str,
    ) -> Result<Vec<JobListing>, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Llm("model overloaded".to_string()));
        }
        Ok(self.listings.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeProfileStore {
    pub profiles: Mutex<HashMap<Uuid, ProfileRecord>>,
    pub search_results: Mutex<Vec<ProfileRecord>>,
    pub search_calls: Mutex<Vec<SearchCriteria>>,
    pub search_delay: Mutex<Option<Duration>>,
    pub fail_search: AtomicBool,
    pub fail_writes: AtomicBool,
    pub conversations: Mutex<Vec<Conversation>>,
    pub documents: Mutex<Vec<DocumentRow>>,
    pub skills: Mutex<Vec<Skill>>,
}

impl FakeProfileStore {
    fn write(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn load_profile(&self, user_id: Uuid) -> Result<ProfileRecord, AppError> {
        self.profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))
    }

    async fn update_profile(&self, _user_id: Uuid, _update: &ProfileUpdate) -> Result<(), AppError> {
        self.write()
    }

    async fn replace_skills(&self, _user_id: Uuid, skills: &[Skill]) -> Result<(), AppError> {
        self.write()?;
        *self.skills.lock().unwrap() = skills.to_vec();
        Ok(())
    }

    async fn insert_document(&self, document: &NewDocument) -> Result<DocumentRow, AppError> {
        self.write()?;
        let row = DocumentRow {
            id: Uuid::new_v4(),
            user_id: document.user_id,
            file_path: document.file_path.clone(),
            name: document.name.clone(),
            size: document.size,
            file_type: document.file_type.clone(),
            visibility: document.visibility.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.documents.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn delete_document(&self, _user_id: Uuid, document_id: Uuid) -> Result<(), AppError> {
        self.write()?;
        self.documents.lock().unwrap().retain(|d| d.id != document_id);
        Ok(())
    }

    async fn set_document_visibility(
        &self,
        _user_id: Uuid,
        _document_id: Uuid,
        _visibility: DocumentVisibility,
    ) -> Result<(), AppError> {
        self.write()
    }

    async fn search_candidates(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<ProfileRecord>, AppError> {
        self.search_calls.lock().unwrap().push(criteria.clone());
        let delay = *self.search_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn list_conversations(&self, _user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn create_connection_request(
        &self,
        _recruiter_id: Uuid,
        candidate_id: Uuid,
        text: &str,
    ) -> Result<Uuid, AppError> {
        self.write()?;
        let mut conversation = conversation(candidate_id, ConversationStatus::Pending);
        conversation.messages.push(ChatMessage::user(text));
        let id = conversation.id;
        self.conversations.lock().unwrap().push(conversation);
        Ok(id)
    }

    async fn set_conversation_status(
        &self,
        conversation_id: Uuid,
        status: ConversationStatus,
    ) -> Result<(), AppError> {
        self.write()?;
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| AppError::NotFound("conversation".to_string()))?;
        conversation.status = status;
        Ok(())
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> Result<MessageRow, AppError> {
        self.write()?;
        Ok(MessageRow {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            text: text.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Default)]
pub struct FakeObjectStore {
    pub fail: AtomicBool,
    pub uploaded: Mutex<Vec<String>>,
    pub removed: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(&self, path: &str, _body: Bytes, _content_type: &str) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }
        self.uploaded.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://files.test/documents/{path}")
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAuth {
    /// Email → user id for accounts that can sign in.
    pub accounts: Mutex<HashMap<String, Uuid>>,
    pub confirm_pending: AtomicBool,
    pub unreachable: AtomicBool,
    pub signed_out: Mutex<Vec<String>>,
}

impl FakeAuth {
    fn session(email: &str, user_id: Uuid) -> AuthSession {
        AuthSession {
            access_token: format!("token-{user_id}"),
            user_id,
            email: Some(email.to_string()),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _user_type: UserType,
    ) -> Result<Option<AuthSession>, AppError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(unavailable("auth"));
        }
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AppError::Auth("User already registered".to_string()));
        }
        let user_id = Uuid::new_v4();
        accounts.insert(email.to_string(), user_id);
        if self.confirm_pending.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Self::session(email, user_id)))
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession, AppError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(unavailable("auth"));
        }
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|id| Self::session(email, *id))
            .ok_or_else(|| AppError::Auth("Invalid login credentials".to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }
}

/// Fakes plus the `Services` bundle built over them.
#[derive(Clone, Default)]
pub struct Harness {
    pub assistant: Arc<FakeAssistant>,
    pub profiles: Arc<FakeProfileStore>,
    pub objects: Arc<FakeObjectStore>,
    pub auth: Arc<FakeAuth>,
}

impl Harness {
    pub fn services(&self) -> Services {
        Services {
            assistant: self.assistant.clone(),
            profiles: self.profiles.clone(),
            objects: self.objects.clone(),
            auth: self.auth.clone(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Registers an account with a stored profile and returns its session.
    pub fn account(&self, email: &str, record: ProfileRecord) -> AuthSession {
        let user_id = record.profile.id;
        self.auth
            .accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), user_id);
        self.profiles.profiles.lock().unwrap().insert(user_id, record);
        FakeAuth::session(email, user_id)
    }
}

pub fn record(user_type: UserType, name: Option<&str>, title: Option<&str>) -> ProfileRecord {
    ProfileRecord {
        profile: ProfileRow {
            id: Uuid::new_v4(),
            email: Some("someone@example.com".to_string()),
            user_type: user_type.as_str().to_string(),
            name: name.map(str::to_string),
            title: title.map(str::to_string),
            profile_photo_url: None,
            roles: None,
            shift: None,
            location: Some("Austin, TX".to_string()),
            pay_expectations: None,
            contact_methods: None,
            time_zone: None,
            working_hours: None,
            call_available_hours: None,
            updated_at: None,
        },
        skills: Vec::new(),
        documents: Vec::new(),
    }
}

pub fn conversation(other: Uuid, status: ConversationStatus) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: Uuid::new_v4(),
        status,
        created_at: now,
        other_participant: Participant {
            id: other,
            name: Some("Alex Recruiter".to_string()),
            profile_photo_url: None,
        },
        messages: Vec::new(),
        last_message_at: now,
    }
}
