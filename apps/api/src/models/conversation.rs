use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::chat::{Author, ChatMessage};

/// Lifecycle of a recruiter↔candidate thread. Only `Pending` may change,
/// and only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Pending,
    Accepted,
    Denied,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Pending => "pending",
            ConversationStatus::Accepted => "accepted",
            ConversationStatus::Denied => "denied",
        }
    }

    pub fn can_become(&self, next: ConversationStatus) -> bool {
        matches!(
            (self, next),
            (
                ConversationStatus::Pending,
                ConversationStatus::Accepted | ConversationStatus::Denied
            )
        )
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConversationStatus::Pending),
            "accepted" => Ok(ConversationStatus::Accepted),
            "denied" => Ok(ConversationStatus::Denied),
            other => Err(format!("unknown conversation status '{other}'")),
        }
    }
}

/// A conversation joined with the participant who is not the viewer.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub other_id: Uuid,
    pub other_name: Option<String>,
    pub other_photo_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: Option<String>,
    pub profile_photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub other_participant: Participant,
    pub messages: Vec<ChatMessage>,
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    /// Builds the viewer's side of a thread. `messages` must belong to `row`
    /// and be ordered oldest first.
    pub fn from_rows(row: ConversationRow, messages: &[MessageRow], viewer: Uuid) -> Self {
        let last_message_at = messages
            .last()
            .map(|m| m.created_at)
            .unwrap_or(row.created_at);
        let status = row.status.parse().unwrap_or_else(|e| {
            tracing::warn!("Conversation {}: {e}; treating as pending", row.id);
            ConversationStatus::Pending
        });
        Self {
            id: row.id,
            status,
            created_at: row.created_at,
            other_participant: Participant {
                id: row.other_id,
                name: row.other_name,
                profile_photo_url: row.other_photo_url,
            },
            messages: messages
                .iter()
                .map(|m| message_for_viewer(m, viewer))
                .collect(),
            last_message_at,
        }
    }

    /// Appends a message the viewer just sent.
    pub fn push_own(&mut self, row: &MessageRow) {
        self.messages.push(ChatMessage {
            id: row.id,
            author: Author::User,
            text: row.text.clone(),
            actions: Vec::new(),
        });
        self.last_message_at = row.created_at;
    }
}

fn message_for_viewer(row: &MessageRow, viewer: Uuid) -> ChatMessage {
    let author = if row.sender_id == viewer {
        Author::User
    } else {
        Author::OtherParty
    };
    ChatMessage {
        id: row.id,
        author,
        text: row.text.clone(),
        actions: Vec::new(),
    }
}

/// Most recently active conversation first.
pub fn sort_by_activity(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
}
