use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
    /// The counterpart in a recruiter↔candidate conversation.
    OtherParty,
}

/// A single transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub author: Author,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Author::User, text, Vec::new())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Author::Assistant, text, Vec::new())
    }

    pub fn assistant_with(text: impl Into<String>, actions: Vec<Action>) -> Self {
        Self::new(Author::Assistant, text, actions)
    }

    pub fn new(author: Author, text: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            text: text.into(),
            actions,
        }
    }
}

/// UI panels the view layer can show over the chat window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Auth,
    OnboardingProfile,
    DocumentsUpload,
    JobPreferences,
    SkillsAssessment,
    Availability,
    RecruiterRequests,
    SuggestedJobs,
    PublicProfile,
    RecruiterMessages,
    FoundCandidates,
    ConnectRequest,
    CandidateMessages,
    FindCandidates,
    JobDetails,
}

/// Multi-turn flows an action can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    FindCandidates,
}

/// What activating an action does. Each kind carries only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    OpenPanel { panel: Panel },
    StartFlow { flow: Flow },
    LogOut,
}

/// A button offered to the user, either attached to an assistant message
/// or listed in the quick-action bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn open_panel(label: &str, panel: Panel) -> Self {
        Self {
            label: Some(label.to_string()),
            kind: ActionKind::OpenPanel { panel },
        }
    }

    pub fn start_flow(label: &str, flow: Flow) -> Self {
        Self {
            label: Some(label.to_string()),
            kind: ActionKind::StartFlow { flow },
        }
    }

    pub fn log_out(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            kind: ActionKind::LogOut,
        }
    }
}
