//! Intake flow: collects job title, skills and location from a recruiter,
//! one field per turn, before a candidate search is dispatched.
//!
//! Idle → AwaitingTitle → AwaitingSkills → AwaitingLocation → Dispatching → Idle
//!
//! Answers are trimmed of surrounding whitespace; the title and location are
//! otherwise kept verbatim (no case folding or rewording). Blank answers
//! re-prompt without advancing. `start` always restarts from scratch, and
//! `cancel` discards whatever was collected.

use serde::{Deserialize, Serialize};

use crate::dialogue::messages;

/// Complete criteria handed to the candidate search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub title: String,
    pub skills: Vec<String>,
    pub location: String,
}

/// A possibly partial job post, as extracted from free text or edited in
/// the find-candidates panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPostDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl JobPostDraft {
    /// Fills only the fields this draft is still missing.
    pub fn merge_missing(&mut self, other: JobPostDraft) {
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.skills.is_none() {
            self.skills = other.skills;
        }
        if self.location.is_none() {
            self.location = other.location;
        }
    }

    /// Normalizes the draft and returns criteria if every field is present.
    pub fn into_criteria(self) -> Option<SearchCriteria> {
        let title = non_blank(self.title.as_deref()?)?;
        let skills = parse_skills(&self.skills?.join(","));
        let location = non_blank(self.location.as_deref()?)?;
        if skills.is_empty() {
            return None;
        }
        Some(SearchCriteria {
            title,
            skills,
            location,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IntakeState {
    #[default]
    Idle,
    AwaitingTitle,
    AwaitingSkills {
        title: String,
    },
    AwaitingLocation {
        title: String,
        skills: Vec<String>,
    },
    Dispatching {
        criteria: SearchCriteria,
    },
}

/// What the controller must do after feeding input to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeStep {
    /// Emit this assistant prompt and wait for the next answer.
    Prompt(&'static str),
    /// Run the candidate search, then call `IntakeFlow::finish`.
    Dispatch(SearchCriteria),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeFlow {
    #[serde(flatten)]
    state: IntakeState,
}

impl IntakeFlow {
    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    /// True while the flow owns the recruiter's free-text input.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, IntakeState::Idle)
    }

    pub fn is_dispatching(&self) -> bool {
        matches!(self.state, IntakeState::Dispatching { .. })
    }

    /// Starts (or restarts) the flow and returns the opening prompt.
    pub fn start(&mut self) -> &'static str {
        self.state = IntakeState::AwaitingTitle;
        messages::INTAKE_ASK_TITLE
    }

    pub fn cancel(&mut self) {
        self.state = IntakeState::Idle;
    }

    /// Marks the dispatched search as completed, whatever its outcome.
    pub fn finish(&mut self) {
        self.state = IntakeState::Idle;
    }

    /// Feeds one recruiter answer. Returns `None` when the flow is not
    /// waiting for input (idle, or a search is already dispatched).
    pub fn submit(&mut self, input: &str) -> Option<IntakeStep> {
        let state = std::mem::take(&mut self.state);
        let (next, step) = match state {
            IntakeState::AwaitingTitle => match non_blank(input) {
                Some(title) => (
                    IntakeState::AwaitingSkills { title },
                    IntakeStep::Prompt(messages::INTAKE_ASK_SKILLS),
                ),
                None => (
                    IntakeState::AwaitingTitle,
                    IntakeStep::Prompt(messages::INTAKE_REASK_TITLE),
                ),
            },
            IntakeState::AwaitingSkills { title } => {
                let skills = parse_skills(input);
                if skills.is_empty() {
                    (
                        IntakeState::AwaitingSkills { title },
                        IntakeStep::Prompt(messages::INTAKE_REASK_SKILLS),
                    )
                } else {
                    (
                        IntakeState::AwaitingLocation { title, skills },
                        IntakeStep::Prompt(messages::INTAKE_ASK_LOCATION),
                    )
                }
            }
            IntakeState::AwaitingLocation { title, skills } => match non_blank(input) {
                Some(location) => {
                    let criteria = SearchCriteria {
                        title,
                        skills,
                        location,
                    };
                    (
                        IntakeState::Dispatching {
                            criteria: criteria.clone(),
                        },
                        IntakeStep::Dispatch(criteria),
                    )
                }
                None => (
                    IntakeState::AwaitingLocation { title, skills },
                    IntakeStep::Prompt(messages::INTAKE_REASK_LOCATION),
                ),
            },
            idle_or_dispatching => {
                self.state = idle_or_dispatching;
                return None;
            }
        };
        self.state = next;
        Some(step)
    }
}

/// Splits a comma-separated answer into skills: trimmed, blanks dropped,
/// case-insensitive duplicates removed keeping the first spelling.
pub fn parse_skills(input: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let lowered = token.to_lowercase();
        if !skills.iter().any(|s| s.to_lowercase() == lowered) {
            skills.push(token.to_string());
        }
    }
    skills
}

fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria_after(answers: &[&str]) -> (IntakeFlow, Vec<IntakeStep>) {
        let mut flow = IntakeFlow::default();
        flow.start();
        let steps = answers.iter().filter_map(|a| flow.submit(a)).collect();
        (flow, steps)
    }

    #[test]
    fn test_parse_skills_dedups_case_insensitively() {
        assert_eq!(
            parse_skills("IV Insertion, iv insertion, Patient Care"),
            vec!["IV Insertion".to_string(), "Patient Care".to_string()]
        );
    }

    #[test]
    fn test_parse_skills_drops_blank_tokens() {
        assert_eq!(parse_skills(" , Triage,, "), vec!["Triage".to_string()]);
        assert!(parse_skills("   ").is_empty());
    }

    #[test]
    fn test_three_answers_dispatch_once_with_collected_values() {
        let (flow, steps) =
            criteria_after(&["Senior Registered Nurse", "IV Insertion, Patient Care", "Austin, TX"]);
        let dispatches: Vec<_> = steps
            .iter()
            .filter_map(|s| match s {
                IntakeStep::Dispatch(c) => Some(c.clone()),
                IntakeStep::Prompt(_) => None,
            })
            .collect();
        assert_eq!(
            dispatches,
            vec![SearchCriteria {
                title: "Senior Registered Nurse".to_string(),
                skills: vec!["IV Insertion".to_string(), "Patient Care".to_string()],
                location: "Austin, TX".to_string(),
            }]
        );
        assert!(flow.is_dispatching());
    }

    #[test]
    fn test_answers_are_trimmed_but_otherwise_verbatim() {
        let mut flow = IntakeFlow::default();
        flow.start();
        flow.submit("  senior ICU nurse (nights) ");
        assert_eq!(
            *flow.state(),
            IntakeState::AwaitingSkills {
                title: "senior ICU nurse (nights)".to_string()
            }
        );
    }

    #[test]
    fn test_blank_title_reprompts_without_advancing() {
        let mut flow = IntakeFlow::default();
        flow.start();
        assert_eq!(
            flow.submit("   \t"),
            Some(IntakeStep::Prompt(messages::INTAKE_REASK_TITLE))
        );
        assert_eq!(flow.state(), &IntakeState::AwaitingTitle);
    }

    #[test]
    fn test_blank_skills_and_location_reprompt() {
        let mut flow = IntakeFlow::default();
        flow.start();
        flow.submit("Charge Nurse");
        assert_eq!(
            flow.submit(" , "),
            Some(IntakeStep::Prompt(messages::INTAKE_REASK_SKILLS))
        );
        flow.submit("Triage");
        assert_eq!(
            flow.submit(""),
            Some(IntakeStep::Prompt(messages::INTAKE_REASK_LOCATION))
        );
        assert!(matches!(flow.state(), IntakeState::AwaitingLocation { .. }));
    }

    #[test]
    fn test_no_input_accepted_while_dispatching_or_idle() {
        let (mut flow, _) = criteria_after(&["RN", "Triage", "Remote"]);
        assert_eq!(flow.submit("Remote"), None);
        assert!(flow.is_dispatching());
        flow.finish();
        assert_eq!(flow.submit("anything"), None);
        assert!(!flow.is_active());
    }

    #[test]
    fn test_cancel_discards_fields_and_restart_is_fresh() {
        let mut flow = IntakeFlow::default();
        flow.start();
        flow.submit("Charge Nurse");
        assert!(matches!(flow.state(), IntakeState::AwaitingSkills { .. }));
        flow.cancel();
        assert_eq!(flow.state(), &IntakeState::Idle);
        flow.start();
        assert_eq!(flow.state(), &IntakeState::AwaitingTitle);
    }

    #[test]
    fn test_start_while_active_restarts() {
        let mut flow = IntakeFlow::default();
        flow.start();
        flow.submit("Charge Nurse");
        flow.submit("Triage");
        assert_eq!(flow.start(), messages::INTAKE_ASK_TITLE);
        assert_eq!(flow.state(), &IntakeState::AwaitingTitle);
    }

    #[test]
    fn test_draft_merge_keeps_existing_fields() {
        let mut draft = JobPostDraft {
            title: Some("ICU Nurse".to_string()),
            ..Default::default()
        };
        draft.merge_missing(JobPostDraft {
            title: Some("Other".to_string()),
            skills: Some(vec!["Triage".to_string()]),
            location: None,
        });
        assert_eq!(draft.title.as_deref(), Some("ICU Nurse"));
        assert_eq!(draft.skills, Some(vec!["Triage".to_string()]));
        assert_eq!(draft.location, None);
    }

    #[test]
    fn test_draft_into_criteria_requires_every_field() {
        let partial = JobPostDraft {
            title: Some("ICU Nurse".to_string()),
            skills: Some(vec![" ".to_string()]),
            location: Some("Denver, CO".to_string()),
        };
        assert_eq!(partial.into_criteria(), None);

        let full = JobPostDraft {
            title: Some(" ICU Nurse ".to_string()),
            skills: Some(vec!["Triage".to_string(), "triage".to_string()]),
            location: Some("Denver, CO".to_string()),
        };
        assert_eq!(
            full.into_criteria(),
            Some(SearchCriteria {
                title: "ICU Nurse".to_string(),
                skills: vec!["Triage".to_string()],
                location: "Denver, CO".to_string(),
            })
        );
    }
}
