use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A waste submission as the backend reports it.
///
/// `not_verified` and `points_awarded` belong to the backend; the client
/// only ever flips `not_verified` locally after a confirmed approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub centre_id: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Kilograms.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub points_awarded: Option<i64>,
    #[serde(default = "default_not_verified")]
    pub not_verified: bool,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub upload_date: Option<DateTime<Utc>>,
}

fn default_not_verified() -> bool {
    true
}

impl Submission {
    /// Points for display; unset means zero.
    pub fn points(&self) -> i64 {
        self.points_awarded.unwrap_or(0)
    }

    pub fn is_verified(&self) -> bool {
        !self.not_verified
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    /// In `[0, 1]` when the model reported one.
    pub confidence: Option<f64>,
}

impl ClassificationResult {
    pub fn confidence_percent(&self) -> Option<f64> {
        self.confidence.map(|c| c * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub time_open: Option<String>,
    #[serde(default)]
    pub location_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Civilian,
    Corporative,
    Other(String),
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "civilian" => Role::Civilian,
            "corporative" => Role::Corporative,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Civilian => "civilian".to_string(),
            Role::Corporative => "corporative".to_string(),
            Role::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Civilian => "civilian",
            Role::Corporative => "corporative",
            Role::Other(raw) => raw,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub point_score: Option<i64>,
}

// ── Response envelopes ──

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewEnvelope {
    pub upload: Option<PreviewPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedEnvelope {
    pub upload: Submission,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadsEnvelope {
    #[serde(default)]
    pub uploads: Vec<Submission>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: Option<User>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PreviewPayload {
    pub category: Option<String>,
    pub confidence: Option<f64>,
}

impl From<PreviewPayload> for ClassificationResult {
    fn from(p: PreviewPayload) -> Self {
        Self {
            category: p.category.unwrap_or_else(|| "unknown".to_string()),
            confidence: p.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Accepts RFC 3339 timestamps and the naive ISO form the backend emits,
/// reading the latter as UTC.
fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
