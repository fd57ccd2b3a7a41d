/// Registration ledger
///
/// One registration per (event, leader) pair. Team registrations embed an
/// ordered member list with per-member invite state; submitted form answers
/// are embedded alongside with a denormalized label snapshot.

mod manager;

pub use manager::RegistrationManager;

use crate::error::{ApiError, ApiResult};
use crate::event::RegistrationMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Waitlisted,
    Cancelled,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RegistrationStatus::Pending),
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "waitlisted" => Ok(RegistrationStatus::Waitlisted),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "rejected" => Ok(RegistrationStatus::Rejected),
            _ => Err(ApiError::Validation(format!(
                "Invalid registration status: {}",
                s
            ))),
        }
    }

    /// No transitions leave cancelled or rejected
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationStatus::Cancelled | RegistrationStatus::Rejected)
    }
}

/// Per-member invite state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// The leader's own entry; assigned at creation, never changes
    AutoAdded,
    Invited,
    Accepted,
    Declined,
    /// Invitee with no account yet; never advanced by this subsystem
    PendingRegistration,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::AutoAdded => "auto_added",
            InviteStatus::Invited => "invited",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Declined => "declined",
            InviteStatus::PendingRegistration => "pending_registration",
        }
    }

    /// Counts toward the accepted team size
    pub fn is_accepted(&self) -> bool {
        matches!(self, InviteStatus::Accepted | InviteStatus::AutoAdded)
    }
}

/// Member role within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Leader,
    Member,
}

/// Who a member slot refers to: a resolved account, or a provisional
/// invitee known only by email and name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "identity", rename_all = "snake_case")]
pub enum MemberIdentity {
    Resolved {
        account_id: String,
        name: String,
        email: String,
    },
    Pending {
        name: String,
        email: String,
    },
}

impl MemberIdentity {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            MemberIdentity::Resolved { account_id, .. } => Some(account_id),
            MemberIdentity::Pending { .. } => None,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            MemberIdentity::Resolved { email, .. } => email,
            MemberIdentity::Pending { email, .. } => email,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MemberIdentity::Resolved { name, .. } => name,
            MemberIdentity::Pending { name, .. } => name,
        }
    }
}

/// Member sub-record, owned by its registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(flatten)]
    pub identity: MemberIdentity,
    pub role: MemberRole,
    pub invite_status: InviteStatus,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Typed answer value, one slot per declared field kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

/// Answer sub-record with a label snapshot taken at submission time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub field_id: String,
    pub label: String,
    #[serde(flatten)]
    pub value: AnswerValue,
}

/// Registration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub event_id: String,
    pub leader_id: String,
    pub mode: RegistrationMode,
    pub team_name: Option<String>,
    pub status: RegistrationStatus,
    pub members: Vec<Member>,
    pub answers: Vec<Answer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Members counting toward the confirmed team size
    pub fn accepted_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.invite_status.is_accepted())
            .count()
    }

    pub fn member_for_account(&self, account_id: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.identity.account_id() == Some(account_id))
    }

    pub fn is_accepted_member(&self, account_id: &str) -> bool {
        self.member_for_account(account_id)
            .is_some_and(|m| m.invite_status.is_accepted())
    }
}

/// Member invitation by email for people who may not have an account yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInvite {
    pub email: String,
    pub name: String,
}

/// Raw answer as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub field_id: String,
    pub value: serde_json::Value,
}

/// Registration creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub team_name: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub member_invites: Vec<MemberInvite>,
    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
}

/// Invitation response action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteAction {
    Accept,
    Decline,
}

/// Invitation response request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRequest {
    pub action: InviteAction,
}

/// Member addition request (leader only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddMembersRequest {
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub member_invites: Vec<MemberInvite>,
}

/// Registration listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationFilter {
    pub event_id: Option<String>,
    pub status: Option<RegistrationStatus>,
}
