//! Request DTOs for the catalog API
//!
//! Defines the structure of incoming query strings.
//!
//! Query values arrive as text, and HTML forms send untouched inputs as
//! `minAge=`. Blank values read as absent so the matching predicate is
//! skipped.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

use crate::models::activity::parse_calendar_date;
use crate::models::{FilterSet, PageRequest};

/// Query string of `GET /activities`.
///
/// Kept flat: urlencoded bodies do not survive `#[serde(flatten)]` for
/// numeric fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_age: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub max_age: Option<u32>,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub max_price: Option<f64>,
    pub neighborhood: Option<String>,
    pub q: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub offset: Option<i64>,
    /// Bypass the list cache
    #[serde(default, deserialize_with = "flag")]
    pub refresh: bool,
}

impl ListQuery {
    pub fn into_parts(self) -> (FilterSet, PageRequest, bool) {
        let filters = FilterSet {
            category: self.category,
            min_age: self.min_age,
            max_age: self.max_age,
            start_date: self.start_date,
            end_date: self.end_date,
            min_price: self.min_price,
            max_price: self.max_price,
            neighborhood: self.neighborhood,
            q: self.q,
        };
        let page = PageRequest {
            limit: self.limit,
            offset: self.offset,
        };
        (filters.normalized(), page, self.refresh)
    }
}

/// Query string of `GET /activities/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQuery {
    #[serde(default, deserialize_with = "flag")]
    pub refresh: bool,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid value {:?}: {}", raw, e))),
    }
}

fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_calendar_date(raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date {:?}", raw))),
    }
}

/// `true`/`1` set the flag; blank, `false` and `0` clear it.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(de::Error::custom(format!("invalid flag {:?}", other))),
    }
}
