//! API request and response models.
//!
//! Wire shapes are kept separate from the domain types in `sigil-core` so
//! the storage and API representations can evolve independently. Response
//! types implement `From` over their domain counterparts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sigil_core::types::{
    Holder, HolderId, Invitation, InvitationId, LinkAction, LinkEvent, LinkEventId, NumberId,
    Role, UniqueNumber, User, UserId,
};
use sigil_store::Page;

/// Largest accepted page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_LIMIT: i64 = 500;

fn default_limit() -> i64 {
    100
}

/// Offset/limit pagination query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// Rows to skip.
    #[serde(default)]
    pub offset: i64,
    /// Maximum rows to return (clamped to [`MAX_PAGE_LIMIT`]).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl PageQuery {
    /// Convert to a store page, clamping out-of-range values.
    pub fn page(&self) -> Page {
        Page {
            offset: self.offset.max(0),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// OAuth2 password-grant login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Login email.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed JWT.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    /// Wrap a signed token.
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Registration request completing an invitation.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    /// The invite token received out of band.
    pub token: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Chosen password.
    pub password: String,
}

/// Account profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// Account ID.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Account role.
    pub role: Role,
    /// Whether the account can log in.
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

// ============================================================================
// Invitations
// ============================================================================

/// Invitation request.
#[derive(Debug, Deserialize)]
pub struct InvitePayload {
    /// Email to invite.
    pub email: String,
}

/// Issued (or reissued) invitation.
///
/// Carries the invite token directly; delivery to the invitee is the
/// caller's concern.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationResponse {
    /// Invitation ID.
    pub id: InvitationId,
    /// Invited email.
    pub email: String,
    /// Issuing superadmin.
    pub invited_by: UserId,
    /// Issue (or last reissue) time.
    pub created_at: DateTime<Utc>,
    /// Whether the invitation has been used.
    pub accepted: bool,
    /// Signed invite token for the invitee.
    pub invite_token: String,
}

impl InvitationResponse {
    /// Combine the stored invitation with its freshly signed token.
    pub fn with_token(invitation: Invitation, invite_token: String) -> Self {
        Self {
            id: invitation.id,
            email: invitation.email,
            invited_by: invitation.invited_by,
            created_at: invitation.created_at,
            accepted: invitation.accepted,
            invite_token,
        }
    }
}

// ============================================================================
// Holders
// ============================================================================

/// Create/update payload for a holder.
#[derive(Debug, Deserialize)]
pub struct HolderPayload {
    /// Holder display name.
    pub name: String,
    /// Optional contact email.
    pub contact_email: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Holder record.
#[derive(Debug, Serialize, Deserialize)]
pub struct HolderResponse {
    /// Holder ID.
    pub id: HolderId,
    /// Holder display name.
    pub name: String,
    /// Optional contact email.
    pub contact_email: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Holder> for HolderResponse {
    fn from(holder: Holder) -> Self {
        Self {
            id: holder.id,
            name: holder.name,
            contact_email: holder.contact_email,
            notes: holder.notes,
            created_at: holder.created_at,
        }
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Create payload for a unique number.
#[derive(Debug, Deserialize)]
pub struct NumberPayload {
    /// The number to register.
    pub number: String,
}

/// Unique number record.
#[derive(Debug, Serialize, Deserialize)]
pub struct NumberResponse {
    /// Number ID.
    pub id: NumberId,
    /// The registered number (normalized).
    pub number: String,
    /// Holder currently linked, if any.
    pub holder_id: Option<HolderId>,
    /// When the current link was made.
    pub assigned_at: Option<DateTime<Utc>>,
}

impl From<UniqueNumber> for NumberResponse {
    fn from(num: UniqueNumber) -> Self {
        Self {
            id: num.id,
            number: num.number,
            holder_id: num.holder_id,
            assigned_at: num.assigned_at,
        }
    }
}

/// Number listing query: pagination plus an optional holder filter.
///
/// Pagination fields are repeated rather than flattened; `serde(flatten)`
/// does not survive the urlencoded deserializer for numeric fields.
#[derive(Debug, Deserialize)]
pub struct NumberListQuery {
    /// Rows to skip.
    #[serde(default)]
    pub offset: i64,
    /// Maximum rows to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Restrict to numbers linked to this holder.
    pub holder_id: Option<i64>,
}

impl NumberListQuery {
    /// Convert to a store page, clamping out-of-range values.
    pub fn page(&self) -> Page {
        PageQuery {
            offset: self.offset,
            limit: self.limit,
        }
        .page()
    }
}

// ============================================================================
// History
// ============================================================================

/// Audit listing query: pagination plus optional exact-match filters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Rows to skip.
    #[serde(default)]
    pub offset: i64,
    /// Maximum rows to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Restrict to one holder.
    pub holder_id: Option<i64>,
    /// Restrict to one number.
    pub number_id: Option<i64>,
    /// Restrict to one acting admin.
    pub admin_id: Option<i64>,
}

impl HistoryQuery {
    /// Convert to a store page, clamping out-of-range values.
    pub fn page(&self) -> Page {
        PageQuery {
            offset: self.offset,
            limit: self.limit,
        }
        .page()
    }
}

/// One audit-trail entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    /// Event ID.
    pub id: LinkEventId,
    /// Holder side of the change.
    pub holder_id: HolderId,
    /// Number side of the change.
    pub number_id: NumberId,
    /// Admin who performed the change.
    pub admin_id: UserId,
    /// Link or unlink.
    pub action: LinkAction,
    /// When the change was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl From<LinkEvent> for EventResponse {
    fn from(event: LinkEvent) -> Self {
        Self {
            id: event.id,
            holder_id: event.holder_id,
            number_id: event.number_id,
            admin_id: event.admin_id,
            action: event.action,
            recorded_at: event.recorded_at,
        }
    }
}
