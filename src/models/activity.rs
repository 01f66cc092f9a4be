//! Catalog entity
//!
//! An `Activity` is owned by the backing store; the cache only ever holds
//! copies. `ageMin <= ageMax` and a non-negative price are checked on write
//! and not enforced by these types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Text in the two catalog languages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, fr: impl Into<String>) -> Self {
        Self {
            en: Some(en.into()),
            fr: Some(fr.into()),
        }
    }

    pub fn is_blank(&self) -> bool {
        [&self.en, &self.fr]
            .iter()
            .all(|text| text.as_deref().map_or(true, |t| t.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Moderation state. Listings without one count as approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Approved,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(deserialize_with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Reads `2026-03-01` as well as RFC 3339 timestamps such as
/// `2026-03-01T10:00:00Z`, keeping only the calendar day.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    raw.parse::<NaiveDate>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw)))
}

// == Activity ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Builds a new listing from client input with a fresh id and timestamps.
    pub fn from_patch(id: String, patch: ActivityPatch, now: DateTime<Utc>) -> Self {
        let mut activity = Self {
            id,
            title: LocalizedText::default(),
            description: LocalizedText::default(),
            categories: Vec::new(),
            age_min: None,
            age_max: None,
            price: None,
            neighborhood: None,
            approval_status: None,
            schedule: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        activity.apply(patch);
        activity.updated_at = now;
        activity
    }

    /// Overwrites every field the patch carries.
    pub fn apply(&mut self, patch: ActivityPatch) {
        let ActivityPatch {
            title,
            description,
            categories,
            age_min,
            age_max,
            price,
            neighborhood,
            approval_status,
            schedule,
            updated_at,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(categories) = categories {
            self.categories = categories;
        }
        if age_min.is_some() {
            self.age_min = age_min;
        }
        if age_max.is_some() {
            self.age_max = age_max;
        }
        if price.is_some() {
            self.price = price;
        }
        if neighborhood.is_some() {
            self.neighborhood = neighborhood;
        }
        if approval_status.is_some() {
            self.approval_status = approval_status;
        }
        if let Some(schedule) = schedule {
            self.schedule = schedule;
        }
        if let Some(updated_at) = updated_at {
            self.updated_at = updated_at;
        }
    }

    /// Visible to everyone unless moderation holds it back.
    pub fn is_publicly_visible(&self) -> bool {
        !matches!(
            self.approval_status,
            Some(ApprovalStatus::Pending) | Some(ApprovalStatus::Rejected)
        )
    }

    pub fn price_amount(&self) -> f64 {
        self.price.as_ref().map_or(0.0, |p| p.amount)
    }

    /// Lowercased concatenation of both titles and descriptions.
    pub fn search_text(&self) -> String {
        [
            &self.title.en,
            &self.title.fr,
            &self.description.en,
            &self.description.fr,
        ]
        .iter()
        .filter_map(|text| text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

// == Activity Patch ==
/// Client-supplied fields for create and partial update.
///
/// Absent fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<ScheduleEntry>>,
    /// Stamped by the service, never taken from the client
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
