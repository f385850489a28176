//! Static quick-action menus and the actions attached to assistant messages.

use crate::models::chat::{Action, Flow, Panel};
use crate::models::profile::UserType;

pub fn candidate_quick_actions() -> Vec<Action> {
    vec![
        Action::open_panel("View Public Profile", Panel::PublicProfile),
        Action::open_panel("Messages", Panel::CandidateMessages),
        Action::open_panel("Recruiter Requests", Panel::RecruiterRequests),
        Action::open_panel("Jobs", Panel::SuggestedJobs),
        Action::open_panel("Documents", Panel::DocumentsUpload),
        Action::open_panel("Skills", Panel::SkillsAssessment),
        Action::open_panel("Set Availability", Panel::Availability),
        Action::open_panel("Job Preferences", Panel::JobPreferences),
        Action::log_out("Logout"),
    ]
}

pub fn recruiter_quick_actions() -> Vec<Action> {
    vec![
        Action::start_flow("Search for Candidates", Flow::FindCandidates),
        Action::open_panel("View Messages", Panel::RecruiterMessages),
        Action::log_out("Logout"),
    ]
}

/// The menu for whoever is signed in; guests get none.
pub fn quick_actions_for(user_type: Option<UserType>) -> Vec<Action> {
    match user_type {
        Some(UserType::Candidate) => candidate_quick_actions(),
        Some(UserType::Recruiter) => recruiter_quick_actions(),
        None => Vec::new(),
    }
}

pub fn setup_profile() -> Action {
    Action::open_panel("Setup Profile", Panel::OnboardingProfile)
}

pub fn view_candidates() -> Action {
    Action::open_panel("View Candidates", Panel::FoundCandidates)
}
