//! Registry domain types.
//!
//! These types are shared by the storage, auth, and API layers. They carry
//! no persistence or transport concerns; the store assigns every ID and the
//! API layer owns the JSON request/response shapes built from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database ID.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw ID value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Identifier of an admin or superadmin account.
    UserId
);
id_type!(
    /// Identifier of a digital ID holder.
    HolderId
);
id_type!(
    /// Identifier of a unique number.
    NumberId
);
id_type!(
    /// Identifier of a pending or accepted invitation.
    InvitationId
);
id_type!(
    /// Identifier of a link/unlink audit event.
    LinkEventId
);

// ============================================================================
// Roles
// ============================================================================

/// Role of a registry account.
///
/// Serialized form is stable ("superadmin" / "admin") — it is embedded in
/// access-token claims and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can do everything an admin can, plus invite admins and list them.
    Superadmin,
    /// Day-to-day registry operator.
    Admin,
}

impl Role {
    /// Whether this role may invite and list admin accounts.
    pub fn can_manage_admins(self) -> bool {
        matches!(self, Role::Superadmin)
    }

    /// Stable string form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "superadmin" => Some(Role::Superadmin),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Accounts and invitations
// ============================================================================

/// An admin or superadmin account.
///
/// The password hash is deliberately not part of this type; it stays inside
/// the store's credential record and never crosses the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account ID.
    pub id: UserId,
    /// Login email (normalized lowercase).
    pub email: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Inactive accounts cannot log in or use tokens issued earlier.
    pub is_active: bool,
    /// Whether the account was created through an invitation.
    pub is_invited: bool,
    /// Account role.
    pub role: Role,
    /// Who invited this account, if anyone.
    pub invited_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A pending or accepted admin invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Invitation ID.
    pub id: InvitationId,
    /// Invited email (normalized lowercase).
    pub email: String,
    /// Superadmin who issued (or last reissued) the invitation.
    pub invited_by: UserId,
    /// Issue (or last reissue) timestamp.
    pub created_at: DateTime<Utc>,
    /// Whether the invitation has been used to register.
    pub accepted: bool,
    /// The account created from this invitation, once accepted.
    pub accepted_by: Option<UserId>,
}

// ============================================================================
// Holders and numbers
// ============================================================================

/// A digital ID holder — the identity record the registry manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holder {
    /// Holder ID.
    pub id: HolderId,
    /// Holder display name.
    pub name: String,
    /// Optional contact email.
    pub contact_email: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A unique number that can be linked to at most one holder at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueNumber {
    /// Number ID.
    pub id: NumberId,
    /// The number itself (normalized; unique across the registry).
    pub number: String,
    /// Holder currently linked, if any.
    pub holder_id: Option<HolderId>,
    /// When the current link was made; `None` while unlinked.
    pub assigned_at: Option<DateTime<Utc>>,
}

impl UniqueNumber {
    /// Whether the number is currently linked to a holder.
    pub fn is_linked(&self) -> bool {
        self.holder_id.is_some()
    }
}

// ============================================================================
// Link audit trail
// ============================================================================

/// Direction of a linkage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAction {
    /// Number was assigned to a holder.
    Link,
    /// Number was released from a holder.
    Unlink,
}

impl LinkAction {
    /// Stable string form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkAction::Link => "link",
            LinkAction::Unlink => "unlink",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "link" => Some(LinkAction::Link),
            "unlink" => Some(LinkAction::Unlink),
            _ => None,
        }
    }
}

impl fmt::Display for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the link/unlink audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEvent {
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
