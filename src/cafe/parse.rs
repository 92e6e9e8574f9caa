use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::RecordError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawCafe {
    #[serde(default, alias = "_id", deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub affiliation: Option<RawAffiliation>,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<Vec<RawOpeningHours>>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub health_score: Option<i64>,
    #[serde(default)]
    pub contact: Option<RawContact>,
    #[serde(default)]
    pub social_media: Option<Vec<RawSocialLink>>,
    #[serde(default)]
    pub payment_details: Option<Vec<RawPaymentDetail>>,
    #[serde(default, alias = "image_url")]
    pub logo: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawAffiliation {
    #[serde(default)]
    pub faculty: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawOpeningHours {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub blocks: Vec<RawTimeBlock>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawTimeBlock {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub pavillon: Option<String>,
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawGeometry {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl RawGeometry {
    /// GeoJSON point order is `[lng, lat]`. An untyped geometry is read as
    /// a point; any other GeoJSON type has no single position.
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        if !self.kind.is_empty() && !self.kind.eq_ignore_ascii_case("point") {
            return None;
        }
        match self.coordinates.as_slice() {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some((*lat, *lng)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawContact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSocialLink {
    #[serde(default, alias = "platform")]
    pub platform_name: String,
    #[serde(default, alias = "url")]
    pub link: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPaymentDetail {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub minimum: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawEvent {
    #[serde(default, alias = "_id", deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default, rename = "cafeId", alias = "cafe_id", deserialize_with = "string_or_number")]
    cafe_id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    attendance: u32,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub cafe_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub attendance: u32,
    pub color: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Accepts either a bare JSON array or an object wrapping the array under `key`.
pub(super) fn split_records(raw: &str, key: &str) -> Result<Vec<Value>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON dataset")?;
    match parsed {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(anyhow!("`{key}` is not an array")),
            None => Err(anyhow!("dataset object has no `{key}` array")),
        },
        _ => Err(anyhow!("unexpected JSON type for `{key}` dataset")),
    }
}

pub(super) fn parse_cafe(index: usize, value: Value) -> Result<RawCafe, RecordError> {
    let mut cafe = RawCafe::deserialize(value).map_err(|error| RecordError::Malformed {
        kind: "café",
        index,
        reason: error.to_string(),
    })?;

    let id = non_blank(cafe.id.take()).ok_or(RecordError::MissingId {
        kind: "café",
        index,
    })?;
    let name = non_blank(cafe.name.take()).ok_or_else(|| RecordError::MissingName {
        id: id.clone(),
    })?;

    cafe.id = Some(id);
    cafe.name = Some(name);
    Ok(cafe)
}

pub(super) fn parse_event(index: usize, value: Value) -> Result<EventRecord, RecordError> {
    let raw = RawEvent::deserialize(value).map_err(|error| RecordError::Malformed {
        kind: "event",
        index,
        reason: error.to_string(),
    })?;

    let id = non_blank(raw.id).ok_or(RecordError::MissingId {
        kind: "event",
        index,
    })?;
    let cafe_id =
        non_blank(raw.cafe_id).ok_or_else(|| RecordError::MissingCafe { id: id.clone() })?;
    let start = parse_event_time(&raw.time).ok_or_else(|| RecordError::InvalidTime {
        id: id.clone(),
        time: raw.time.clone(),
    })?;

    Ok(EventRecord {
        id,
        cafe_id,
        title: raw.title.trim().to_string(),
        start,
        attendance: raw.attendance,
        color: non_blank(raw.color),
    })
}

pub(super) fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
