//! Activity data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of accepted activity kinds. Incoming values are lowercased
/// before validation, so "RUNNING" and "running" are the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Meditation,
    Breathing,
    Exercise,
    Running,
    Walking,
    Journaling,
    Reading,
    Therapy,
    Other,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActivityType::Meditation => "meditation",
            ActivityType::Breathing => "breathing",
            ActivityType::Exercise => "exercise",
            ActivityType::Running => "running",
            ActivityType::Walking => "walking",
            ActivityType::Journaling => "journaling",
            ActivityType::Reading => "reading",
            ActivityType::Therapy => "therapy",
            ActivityType::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meditation" => Ok(ActivityType::Meditation),
            "breathing" => Ok(ActivityType::Breathing),
            "exercise" => Ok(ActivityType::Exercise),
            "running" => Ok(ActivityType::Running),
            "walking" => Ok(ActivityType::Walking),
            "journaling" => Ok(ActivityType::Journaling),
            "reading" => Ok(ActivityType::Reading),
            "therapy" => Ok(ActivityType::Therapy),
            "other" => Ok(ActivityType::Other),
            _ => Err(format!("unknown activity type: {}", s)),
        }
    }
}

/// A logged wellness action. Immutable once written; the timestamp is
/// assigned server-side at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Duration in minutes.
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Request body for logging an activity. The type arrives as a raw string
/// so casing can be normalized before validation; any caller-supplied
/// timestamp field is simply not modeled and therefore ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActivityRequest {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: i64,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Response envelope for a logged activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogActivityResponse {
    pub success: bool,
    pub data: Activity,
}
