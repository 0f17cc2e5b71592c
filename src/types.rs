use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Deserializer};

use crate::path::QueryParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum AuthLevel {
    Student,
    CourseAssistant,
    Instructor,
    Administrator,
}

impl AuthLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthLevel::Student => "student",
            AuthLevel::CourseAssistant => "course_assistant",
            AuthLevel::Instructor => "instructor",
            AuthLevel::Administrator => "administrator",
        }
    }
}

// anything unrecognised is treated as the lowest level
impl From<String> for AuthLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "administrator" => AuthLevel::Administrator,
            "instructor" => AuthLevel::Instructor,
            "course_assistant" => AuthLevel::CourseAssistant,
            _ => AuthLevel::Student,
        }
    }
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AttachmentFormat {
    None,
    Url,
    File,
}

impl From<String> for AttachmentFormat {
    fn from(value: String) -> Self {
        match value.as_str() {
            "url" => AttachmentFormat::Url,
            "file" => AttachmentFormat::File,
            _ => AttachmentFormat::None,
        }
    }
}

/// Result of a handout or writeup download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attachment {
    None,
    Url(String),
    File(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Course {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub late_slack: i64,
    #[serde(default)]
    pub grace_days: i64,
    pub auth_level: AuthLevel,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Assessment {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub start_at: Timestamp,
    pub due_at: Timestamp,
    pub end_at: Timestamp,
    #[serde(default)]
    pub grading_deadline: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssessmentDetails {
    #[serde(flatten)]
    pub assessment: Assessment,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "unlimited")]
    pub max_grace_days: i64,
    #[serde(default = "unlimited")]
    pub max_submissions: i64,
    #[serde(default = "unlimited")]
    pub max_unpenalized_submissions: i64,
    #[serde(default = "single")]
    pub group_size: i64,
    #[serde(default)]
    pub disable_handins: bool,
    #[serde(default)]
    pub has_scoreboard: bool,
    #[serde(default)]
    pub has_autograder: bool,
    pub handout_format: AttachmentFormat,
    pub writeup_format: AttachmentFormat,
}

fn unlimited() -> i64 {
    -1
}

fn single() -> i64 {
    1
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Problem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Submission {
    pub version: u32,
    pub created_at: Timestamp,
    #[serde(default)]
    pub filename: Option<String>,
    /// `None` marks a score that has not been released.
    #[serde(deserialize_with = "released_scores")]
    pub scores: BTreeMap<String, Option<f64>>,
}

fn released_scores<'de, D>(deserializer: D) -> Result<BTreeMap<String, Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(problem, score)| (problem, score.as_f64()))
        .collect())
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Enrollment {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub lecture: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub grade_policy: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub dropped: bool,
    pub auth_level: AuthLevel,
}

/// Fields to set when creating or updating an enrollment. Unset fields are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrollmentOptions {
    pub lecture: Option<String>,
    pub section: Option<String>,
    pub grade_policy: Option<String>,
    pub nickname: Option<String>,
    pub dropped: Option<bool>,
    pub auth_level: Option<AuthLevel>,
}

impl EnrollmentOptions {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        let text_fields = [
            ("lecture", &self.lecture),
            ("section", &self.section),
            ("grade_policy", &self.grade_policy),
            ("nickname", &self.nickname),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                params.push(key, value.as_str());
            }
        }
        if let Some(dropped) = self.dropped {
            params.push("dropped", dropped.to_string());
        }
        if let Some(level) = self.auth_level {
            params.push("auth_level", level.as_str());
        }
        params
    }
}
