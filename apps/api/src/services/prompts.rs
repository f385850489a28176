// Prompt templates for the LLM-backed assistant.

/// Appended to the role-specific chat system instruction.
pub const REPLY_ENVELOPE_INSTRUCTION: &str = r#"
Respond with a single JSON object and nothing else:
{"text": "<your reply to the user>", "action": <optional action or null>}

Only include an action when it clearly helps the user take the next step. Allowed actions:
{"label": "<button text>", "type": "open_panel", "panel": "<panel>"}
  where <panel> is one of: onboarding_profile, documents_upload, job_preferences,
  skills_assessment, availability, recruiter_requests, suggested_jobs, public_profile,
  recruiter_messages, candidate_messages, find_candidates
{"label": "<button text>", "type": "start_flow", "flow": "find_candidates"}"#;

pub const FIELD_EXTRACTION_SYSTEM: &str = "\
You extract hiring criteria from a recruiter's free-text job description. \
You MUST respond with valid JSON only. No markdown fences, no explanations.";

pub const FIELD_EXTRACTION_PROMPT: &str = r#"Extract the hiring criteria from the text below.

INPUT TEXT:
{free_text}

OUTPUT SCHEMA (omit any key the text does not state):
{
  "title": "job title or primary role",
  "skills": ["skill", "..."],
  "location": "city and state, or Remote"
}"#;

pub const LISTINGS_SYSTEM: &str = "\
You suggest realistic, currently plausible job listings for a job seeker. \
You MUST respond with valid JSON only. No markdown fences, no explanations.";

pub const LISTINGS_PROMPT: &str = r#"Suggest up to 6 job listings for the following roles: "{roles}" in or near "{location}".
For each job, provide a unique id, title, company name, location, a brief 2-3 sentence description, and a URL to apply.

OUTPUT SCHEMA:
{"jobs": [{"id": "string", "title": "string", "company": "string", "location": "string", "description": "string", "apply_url": "string"}]}"#;
