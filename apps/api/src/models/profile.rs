use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Candidate,
    Recruiter,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Candidate => "candidate",
            UserType::Recruiter => "recruiter",
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "candidate" => Ok(UserType::Candidate),
            "recruiter" => Ok(UserType::Recruiter),
            other => Err(format!("unknown user type '{other}'")),
        }
    }
}

/// Who may retrieve an uploaded document's URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentVisibility {
    Public,
    /// Visible to an authenticated counterpart, never to the general public.
    Gated,
    Private,
}

impl DocumentVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentVisibility::Public => "public",
            DocumentVisibility::Gated => "gated",
            DocumentVisibility::Private => "private",
        }
    }

    pub fn visible_to_counterpart(&self) -> bool {
        !matches!(self, DocumentVisibility::Private)
    }
}

impl FromStr for DocumentVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(DocumentVisibility::Public),
            "gated" => Ok(DocumentVisibility::Gated),
            "private" => Ok(DocumentVisibility::Private),
            other => Err(format!("unknown document visibility '{other}'")),
        }
    }
}

impl fmt::Display for DocumentVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub user_type: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub profile_photo_url: Option<String>,
    pub roles: Option<Vec<String>>,
    pub shift: Option<String>,
    pub location: Option<String>,
    pub pay_expectations: Option<String>,
    pub contact_methods: Option<Vec<String>>,
    pub time_zone: Option<String>,
    pub working_hours: Option<String>,
    pub call_available_hours: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SkillRow {
    pub name: String,
    pub level: i16,
}

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_path: String,
    pub name: String,
    pub size: i64,
    #[sqlx(rename = "type")]
    pub file_type: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
}

/// A profile row with its joined skills and documents, as the store returns it.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub profile: ProfileRow,
    pub skills: Vec<SkillRow>,
    pub documents: Vec<DocumentRow>,
}

/// A self-assessed skill, rated 1 (familiar) to 4 (expert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: u8,
}

impl Skill {
    pub const MAX_LEVEL: u8 = 4;

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && (1..=Self::MAX_LEVEL).contains(&self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub file_path: String,
    pub name: String,
    pub size: i64,
    pub file_type: String,
    pub visibility: DocumentVisibility,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

impl Document {
    /// Builds a document from its row, resolving the retrievable URL.
    /// Rows carrying an unknown visibility tag are treated as private.
    pub fn from_row(row: DocumentRow, url: String) -> Self {
        let visibility = row
            .visibility
            .parse()
            .unwrap_or(DocumentVisibility::Private);
        Self {
            id: row.id,
            file_path: row.file_path,
            name: row.name,
            size: row.size,
            file_type: row.file_type,
            visibility,
            created_at: row.created_at,
            url,
        }
    }
}

/// The authenticated user's profile snapshot (or a found candidate's).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub user_type: UserType,
    pub name: Option<String>,
    pub title: Option<String>,
    pub profile_photo_url: Option<String>,
    pub roles: Vec<String>,
    pub shift: Option<String>,
    pub location: Option<String>,
    pub pay_expectations: Option<String>,
    pub contact_methods: Vec<String>,
    pub time_zone: Option<String>,
    pub working_hours: Option<String>,
    pub call_available_hours: Option<String>,
    pub skills: Vec<Skill>,
    pub documents: Vec<Document>,
}

impl Profile {
    /// Assembles a profile from a store record. `resolve_url` maps a storage
    /// path to its retrievable URL.
    pub fn from_record(
        record: ProfileRecord,
        resolve_url: impl Fn(&str) -> String,
    ) -> Result<Self, String> {
        let row = record.profile;
        let user_type = row.user_type.parse()?;
        let documents = record
            .documents
            .into_iter()
            .map(|d| {
                let url = resolve_url(&d.file_path);
                Document::from_row(d, url)
            })
            .collect();
        Ok(Self {
            id: row.id,
            email: row.email,
            user_type,
            name: row.name,
            title: row.title,
            profile_photo_url: row.profile_photo_url,
            roles: row.roles.unwrap_or_default(),
            shift: row.shift,
            location: row.location,
            pay_expectations: row.pay_expectations,
            contact_methods: row.contact_methods.unwrap_or_default(),
            time_zone: row.time_zone,
            working_hours: row.working_hours,
            call_available_hours: row.call_available_hours,
            skills: record
                .skills
                .into_iter()
                .map(|s| Skill {
                    name: s.name,
                    level: s.level.clamp(1, Skill::MAX_LEVEL as i16) as u8,
                })
                .collect(),
            documents,
        })
    }

    /// A candidate who has not yet set a name and title still needs onboarding.
    pub fn is_onboarded(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.name) && present(&self.title)
    }

    /// The profile as a non-owning, authenticated viewer sees it.
    pub fn counterpart_view(&self) -> Profile {
        let mut view = self.clone();
        view.documents
            .retain(|d| d.visibility.visible_to_counterpart());
        view.email = None;
        view
    }

    /// Applies a confirmed update; every supplied field replaces the old value.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        fn replace<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn replace_opt(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
        replace_opt(&mut self.name, &update.name);
        replace_opt(&mut self.title, &update.title);
        replace_opt(&mut self.profile_photo_url, &update.profile_photo_url);
        replace(&mut self.roles, &update.roles);
        replace_opt(&mut self.shift, &update.shift);
        replace_opt(&mut self.location, &update.location);
        replace_opt(&mut self.pay_expectations, &update.pay_expectations);
        replace(&mut self.contact_methods, &update.contact_methods);
        replace_opt(&mut self.time_zone, &update.time_zone);
        replace_opt(&mut self.working_hours, &update.working_hours);
        replace_opt(&mut self.call_available_hours, &update.call_available_hours);
    }
}

/// Fields a panel may save. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub profile_photo_url: Option<String>,
    pub roles: Option<Vec<String>>,
    pub shift: Option<String>,
    pub location: Option<String>,
    pub pay_expectations: Option<String>,
    pub contact_methods: Option<Vec<String>>,
    pub time_zone: Option<String>,
    pub working_hours: Option<String>,
    pub call_available_hours: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}
