// Assistant copy shown in the transcripts, plus the chat system instructions.

pub const INTAKE_ASK_TITLE: &str = "I can help with that. Let's create a job profile. \
    First, what is the job title or primary role?";
pub const INTAKE_REASK_TITLE: &str =
    "I didn't catch a job title. What role are you hiring for?";
pub const INTAKE_ASK_SKILLS: &str = "Got it. Now, what are the most important skills for this role? \
    Please list them, separated by commas.";
pub const INTAKE_REASK_SKILLS: &str =
    "Please list at least one skill, separated by commas (e.g., 'IV Insertion, Patient Care').";
pub const INTAKE_ASK_LOCATION: &str = "Perfect. Lastly, what is the work location for this position? \
    (e.g., 'New York, NY', 'Remote')";
pub const INTAKE_REASK_LOCATION: &str =
    "Where is this position based? A city or 'Remote' is fine.";

pub const INTAKE_CANCELLED: &str =
    "No problem, I've cancelled that candidate search. Start a new one any time.";

pub const SEARCH_FAILED: &str =
    "Sorry, I encountered an error while searching for candidates. Please try again in a moment.";
pub const DRAFT_EXTRACTION_FAILED: &str =
    "Sorry, I couldn't read that job description. Please try again or fill in the fields yourself.";
pub const CHAT_UNAVAILABLE: &str =
    "Sorry, I am unable to process your request at the moment. Please try again.";
pub const JOBS_UNAVAILABLE: &str =
    "Sorry, I couldn't load job suggestions right now. Please try again later.";

pub const CANDIDATE_WELCOME_NEW: &str = "Welcome to ThatsMyRecruiter! I'm your personal AI recruiter. \
    My goal is to streamline your job search and give you full control. \
    To start, let's build your professional profile.";
pub const CANDIDATE_WELCOME_BACK: &str =
    "Welcome back! It's great to see you again. What would you like to do today?";
pub const RECRUITER_WELCOME: &str =
    "Welcome back to your Recruiter Dashboard. How can I help you today?";

pub const SIGN_UP_CONFIRM_EMAIL: &str = "Please check your email to confirm registration.";
pub const AUTH_UNREACHABLE: &str =
    "We couldn't reach the sign-in service. Please try again.";
pub const PROFILE_LOAD_FAILED: &str =
    "We couldn't load your profile. Please sign in again.";

pub const CANDIDATE_SYSTEM: &str = "You are an AI assistant for 'ThatsMyRecruiter'. \
    Guide candidates through setting up their profile and managing their job search. \
    Be encouraging and concise.";
pub const RECRUITER_SYSTEM: &str = "You are an AI assistant for a recruiter on 'ThatsMyRecruiter'. \
    Help them find candidates and manage communications. \
    You can ask them to clarify job requirements. \
    Keep responses brief and professional.";

pub fn candidates_found(count: usize) -> String {
    let noun = if count == 1 { "candidate" } else { "candidates" };
    format!("Based on your criteria, I've found {count} strong {noun} for you to review.")
}

pub fn no_candidates(title: &str, location: &str) -> String {
    format!(
        "I couldn't find any candidates matching \"{title}\" in {location} yet. \
         Try broadening the skills or location."
    )
}
