/// Event catalog
///
/// Events carry their registration window, team-size bounds, and an ordered
/// list of dynamic form-field definitions collected at registration time.

mod manager;

pub use manager::EventManager;

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(ApiError::Validation(format!("Invalid event status: {}", s))),
        }
    }

    /// Forward lifecycle: draft -> published -> ongoing -> completed, with
    /// cancellation allowed from any other state
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Draft, EventStatus::Published)
                | (EventStatus::Published, EventStatus::Ongoing)
                | (EventStatus::Ongoing, EventStatus::Completed)
        ) || (next == EventStatus::Cancelled && *self != EventStatus::Cancelled)
    }
}

/// Registration mode for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
    Individual,
    Team,
}

impl RegistrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationMode::Individual => "individual",
            RegistrationMode::Team => "team",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(RegistrationMode::Individual),
            "team" => Ok(RegistrationMode::Team),
            _ => Err(ApiError::Validation(format!(
                "Invalid registration mode: {}",
                s
            ))),
        }
    }
}

/// Closed set of form-field kinds; options only exist on choice kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Select { options: Vec<String> },
    Checkbox { options: Vec<String> },
}

impl FieldKind {
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::Select { .. } | FieldKind::Checkbox { .. })
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            FieldKind::Select { options } | FieldKind::Checkbox { options } => Some(options),
            _ => None,
        }
    }
}

/// One form-field definition; the identifier is generated at creation and
/// stable for the lifetime of the event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub venue: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub organization_id: Option<String>,
    pub organizer_id: String,
    pub status: EventStatus,
    pub registration_open: bool,
    pub registration_start_at: DateTime<Utc>,
    pub registration_end_at: DateTime<Utc>,
    pub mode: RegistrationMode,
    pub min_team_size: Option<u32>,
    pub max_team_size: Option<u32>,
    pub max_teams: Option<u32>,
    pub form_fields: Vec<FormField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Team-size bounds; only meaningful in team mode
    pub fn team_bounds(&self) -> (u32, u32) {
        (
            self.min_team_size.unwrap_or(1),
            self.max_team_size.unwrap_or(u32::MAX),
        )
    }

    pub fn field(&self, field_id: &str) -> Option<&FormField> {
        self.form_fields.iter().find(|f| f.id == field_id)
    }
}

/// Form-field definition as submitted by an organizer; an id is present only
/// when updating an existing field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFieldSpec {
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Event creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub venue: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub organization_id: Option<String>,
    pub registration_start_at: DateTime<Utc>,
    pub registration_end_at: DateTime<Utc>,
    #[serde(default = "default_mode")]
    pub mode: RegistrationMode,
    pub min_team_size: Option<u32>,
    pub max_team_size: Option<u32>,
    pub max_teams: Option<u32>,
    #[serde(default)]
    pub form_fields: Vec<FormFieldSpec>,
}

fn default_mode() -> RegistrationMode {
    RegistrationMode::Individual
}

/// Event update request; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub venue: Option<String>,
    pub organizer_id: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub registration_open: Option<bool>,
    pub registration_start_at: Option<DateTime<Utc>>,
    pub registration_end_at: Option<DateTime<Utc>>,
    pub max_teams: Option<u32>,
    pub form_fields: Option<Vec<FormFieldSpec>>,
}

/// Lifecycle transition request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: EventStatus,
}

/// Event listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub category: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub mine: bool,
}
