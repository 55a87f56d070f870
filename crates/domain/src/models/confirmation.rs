//! Confirmation (RSVP) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::invitation::InvitationKind;

/// Literal answer meaning the guest will attend.
pub const ANSWER_YES: &str = "sí";

/// Literal answer meaning the guest will not attend.
pub const ANSWER_NO: &str = "no";

/// Attendance value as it arrives on the wire.
///
/// Older clients sent booleans, the form sends text. Anything else is kept
/// verbatim and never counts as an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttendanceValue {
    Flag(bool),
    Text(String),
    Other(Value),
}

/// Recognised attendance answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceAnswer {
    Yes,
    No,
}

impl AttendanceValue {
    /// Interprets the value; anything other than `"sí"`/`"no"`/booleans is unrecognised.
    pub fn answer(&self) -> Option<AttendanceAnswer> {
        match self {
            AttendanceValue::Flag(true) => Some(AttendanceAnswer::Yes),
            AttendanceValue::Flag(false) => Some(AttendanceAnswer::No),
            AttendanceValue::Text(text) if text == ANSWER_YES => Some(AttendanceAnswer::Yes),
            AttendanceValue::Text(text) if text == ANSWER_NO => Some(AttendanceAnswer::No),
            AttendanceValue::Text(_) | AttendanceValue::Other(_) => None,
        }
    }

    /// The value as the form control holds it; booleans become the literal answers.
    pub fn as_text(&self) -> &str {
        match self {
            AttendanceValue::Flag(true) => ANSWER_YES,
            AttendanceValue::Flag(false) => ANSWER_NO,
            AttendanceValue::Text(text) => text,
            AttendanceValue::Other(_) => "",
        }
    }
}

impl From<&str> for AttendanceValue {
    fn from(value: &str) -> Self {
        AttendanceValue::Text(value.to_string())
    }
}

impl From<String> for AttendanceValue {
    fn from(value: String) -> Self {
        AttendanceValue::Text(value)
    }
}

impl From<bool> for AttendanceValue {
    fn from(value: bool) -> Self {
        AttendanceValue::Flag(value)
    }
}

/// Raw submission handed to the gateway, before any validation.
///
/// Deserialization never rejects a field's type. A required field that is not
/// a string reads as absent, so the gateway refuses it the usual way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub seafood_preference: Option<String>,
    #[serde(default)]
    pub attending: Option<AttendanceValue>,
    #[serde(default)]
    pub companion_attending: Option<AttendanceValue>,
    #[serde(default, deserialize_with = "any_as_text")]
    pub two_day_attendance: Option<String>,
    #[serde(default, deserialize_with = "kind_or_undefined")]
    pub invitation_kind: InvitationKind,
    #[serde(default, deserialize_with = "code_or_empty")]
    pub invitation_code: String,
}

fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn any_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

fn kind_or_undefined<'de, D>(deserializer: D) -> Result<InvitationKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(kind) => kind.parse().unwrap_or_default(),
        _ => InvitationKind::Undefined,
    })
}

fn code_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(any_as_text(deserializer)?.unwrap_or_default())
}

/// Field the gateway insists on before persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Phone,
    SeafoodPreference,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Phone => "phone",
            RequiredField::SeafoodPreference => "seafoodPreference",
        }
    }
}

impl ConfirmationPayload {
    /// Value of one of the gateway-required fields.
    pub fn required_value(&self, field: RequiredField) -> Option<&str> {
        match field {
            RequiredField::Name => self.name.as_deref(),
            RequiredField::Phone => self.phone.as_deref(),
            RequiredField::SeafoodPreference => self.seafood_preference.as_deref(),
        }
    }
}

/// Accepted confirmation, ready to be appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRecord {
    pub name: String,
    pub phone: String,
    pub seafood_preference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attending: Option<AttendanceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion_attending: Option<AttendanceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_day_attendance: Option<String>,
    pub invitation_kind: InvitationKind,
    pub invitation_code: String,
    /// Wall clock observed when the gateway accepted the submission.
    pub submitted_at: DateTime<Utc>,
    /// Same instant as epoch milliseconds; ordering key for the dashboard.
    pub timestamp: i64,
}

impl ConfirmationRecord {
    /// Attendance answer from the field that applies to this record's kind.
    pub fn active_attendance(&self) -> Option<&AttendanceValue> {
        match self.invitation_kind {
            InvitationKind::Couple => self.companion_attending.as_ref(),
            InvitationKind::Individual | InvitationKind::Undefined => self.attending.as_ref(),
        }
    }
}

/// A record as persisted, with the identifiers the store assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfirmation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: ConfirmationRecord,
}
