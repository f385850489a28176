//! `Assistant` backed by the LLM client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::dialogue::intake::{parse_skills, JobPostDraft};
use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_GUESSING_INSTRUCTION};
use crate::llm_client::{parse_json_text, strip_json_fences, LlmClient, LlmError, TurnMessage};
use crate::models::chat::{Author, ChatMessage};
use crate::models::job::JobListing;
use crate::services::prompts::{
    FIELD_EXTRACTION_PROMPT, FIELD_EXTRACTION_SYSTEM, LISTINGS_PROMPT, LISTINGS_SYSTEM,
    REPLY_ENVELOPE_INSTRUCTION,
};
use crate::services::{Assistant, AssistantReply};

pub struct LlmAssistant {
    llm: LlmClient,
}

impl LlmAssistant {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Assistant for LlmAssistant {
    async fn chat_reply(
        &self,
        transcript: &[ChatMessage],
        system: &str,
    ) -> Result<AssistantReply, AppError> {
        let turns = to_turns(transcript);
        let system = format!("{system}\n{REPLY_ENVELOPE_INSTRUCTION}");
        let text = self
            .llm
            .call_messages_text(&turns, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Chat reply failed: {e}")))?;
        parse_reply(&text).map_err(|e| AppError::Llm(format!("Malformed chat reply: {e}")))
    }

    async fn extract_fields(&self, free_text: &str) -> Result<JobPostDraft, AppError> {
        let prompt = FIELD_EXTRACTION_PROMPT.replace("{free_text}", free_text);
        let system = format!("{FIELD_EXTRACTION_SYSTEM} {NO_GUESSING_INSTRUCTION}");
        let raw: RawExtraction = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Field extraction failed: {e}")))?;
        let draft = raw.into_draft();
        debug!("Extracted job post fields: {:?}", draft);
        Ok(draft)
    }

    async fn generate_listings(
        &self,
        roles: &[String],
        location: &str,
    ) -> Result<Vec<JobListing>, AppError> {
        let prompt = LISTINGS_PROMPT
            .replace("{roles}", &roles.join(", "))
            .replace("{location}", location);
        let system = format!("{LISTINGS_SYSTEM} {JSON_ONLY_SYSTEM}");
        let envelope: ListingsEnvelope = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Listing generation failed: {e}")))?;
        info!("Generated {} job listings", envelope.jobs.len());
        Ok(envelope.jobs)
    }
}

/// Maps a transcript onto model turns. Counterpart messages are not part of
/// the assistant conversation, and the model's history must open with a
/// user turn, so leading assistant greetings are dropped.
fn to_turns(transcript: &[ChatMessage]) -> Vec<TurnMessage> {
    transcript
        .iter()
        .skip_while(|m| m.author != Author::User)
        .filter_map(|m| match m.author {
            Author::User => Some(TurnMessage::user(m.text.clone())),
            Author::Assistant => Some(TurnMessage::assistant(m.text.clone())),
            Author::OtherParty => None,
        })
        .collect()
}

/// Accepts the JSON envelope, or plain prose when the model ignores the
/// envelope instruction. Text that looks like JSON but does not parse is an error.
fn parse_reply(text: &str) -> Result<AssistantReply, LlmError> {
    let body = strip_json_fences(text);
    let reply = if body.starts_with('{') {
        parse_json_text::<AssistantReply>(body)?
    } else {
        AssistantReply {
            text: body.to_string(),
            action: None,
        }
    };
    if reply.text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(reply)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    skills: Option<OneOrMany>,
    #[serde(default)]
    location: Option<OneOrMany>,
}

impl RawExtraction {
    fn into_draft(self) -> JobPostDraft {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let skills = self
            .skills
            .map(|s| parse_skills(&s.into_vec().join(",")))
            .filter(|s| !s.is_empty());
        let location = self
            .location
            .map(|l| {
                l.into_vec()
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" / ")
            })
            .filter(|l| !l.is_empty());
        JobPostDraft {
            title,
            skills,
            location,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingsEnvelope {
    #[serde(default)]
    jobs: Vec<JobListing>,
}
