//! Storage abstraction.
//!
//! [`Store`] is the single seam between the API layer and persistence.
//! Backends must keep identical semantics; the in-memory backend is the
//! executable reference the router tests run against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sigil_core::types::{
    Holder, HolderId, Invitation, InvitationId, LinkEvent, NumberId, Role, UniqueNumber, User,
    UserId,
};

use crate::error::Result;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email (already normalized).
    pub email: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Account role.
    pub role: Role,
    /// Whether the account came from an invitation.
    pub is_invited: bool,
    /// Inviting superadmin, if any.
    pub invited_by: Option<UserId>,
}

/// Login credential record: the account plus its password hash.
///
/// Only the login path sees this; the hash never leaves the auth flow.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The account.
    pub user: User,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Input for creating or fully updating a holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderDraft {
    /// Holder display name.
    pub name: String,
    /// Optional contact email (already normalized).
    pub contact_email: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Offset/limit pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Rows to skip.
    pub offset: i64,
    /// Maximum rows to return.
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

/// Filters for the link/unlink audit listing.
///
/// `Some(id)` filters for an exact match; `None` means unfiltered. An ID of
/// zero is a valid filter value, not "absent".
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFilter {
    /// Restrict to one holder.
    pub holder_id: Option<HolderId>,
    /// Restrict to one number.
    pub number_id: Option<NumberId>,
    /// Restrict to one acting admin.
    pub admin_id: Option<UserId>,
}

/// The storage trait every backend implements.
#[async_trait]
pub trait Store: Send + Sync {
    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Create an account. Fails with `DuplicateEmail` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Fetch an account by ID.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Fetch an account by normalized email.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fetch the login credential record for an email.
    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>>;

    /// List all admin-role accounts (not superadmins).
    async fn list_admins(&self) -> Result<Vec<User>>;

    /// Whether any superadmin account exists.
    async fn superadmin_exists(&self) -> Result<bool>;

    // ------------------------------------------------------------------
    // Invitations
    // ------------------------------------------------------------------

    /// Create an invitation, or refresh the pending one for this email.
    ///
    /// Fails with `DuplicateEmail` if the email already has an account or
    /// an accepted invitation.
    async fn upsert_invitation(&self, email: &str, invited_by: UserId) -> Result<Invitation>;

    /// Fetch the pending (unaccepted) invitation for an email, if any.
    async fn pending_invitation_by_email(&self, email: &str) -> Result<Option<Invitation>>;

    /// Mark an invitation accepted by the given new account.
    async fn mark_invitation_accepted(&self, id: InvitationId, user: UserId) -> Result<()>;

    // ------------------------------------------------------------------
    // Holders
    // ------------------------------------------------------------------

    /// Create a holder.
    async fn create_holder(&self, draft: HolderDraft) -> Result<Holder>;

    /// Fetch a holder by ID.
    async fn holder_by_id(&self, id: HolderId) -> Result<Option<Holder>>;

    /// List holders, oldest first.
    async fn list_holders(&self, page: Page) -> Result<Vec<Holder>>;

    /// Replace a holder's fields. Fails with `NotFound` for unknown IDs.
    async fn update_holder(&self, id: HolderId, draft: HolderDraft) -> Result<Holder>;

    /// Delete a holder.
    ///
    /// Fails with `HolderInUse` while any number is linked to it, so every
    /// release passes through the audited unlink path first. The holder's
    /// link events are removed with it.
    async fn delete_holder(&self, id: HolderId) -> Result<()>;

    // ------------------------------------------------------------------
    // Numbers
    // ------------------------------------------------------------------

    /// Create an unlinked number. Fails with `DuplicateNumber` if taken.
    async fn create_number(&self, number: &str) -> Result<UniqueNumber>;

    /// Fetch a number by ID.
    async fn number_by_id(&self, id: NumberId) -> Result<Option<UniqueNumber>>;

    /// List numbers, oldest first, optionally restricted to one holder.
    async fn list_numbers(&self, page: Page, holder: Option<HolderId>)
    -> Result<Vec<UniqueNumber>>;

    /// Link a number to a holder and record the audit event atomically.
    ///
    /// Fails with `NotFound` if either side is missing and `AlreadyLinked`
    /// if the number has any current holder.
    async fn link_number(
        &self,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
    ) -> Result<UniqueNumber>;

    /// Unlink a number from a holder and record the audit event atomically.
    ///
    /// Fails with `NotFound` if either side is missing and `NotLinked`
    /// unless the number is currently linked to that holder.
    async fn unlink_number(
        &self,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
    ) -> Result<UniqueNumber>;

    // ------------------------------------------------------------------
    // Audit trail
    // ------------------------------------------------------------------

    /// List link/unlink events, newest first.
    async fn list_history(&self, filter: HistoryFilter, page: Page) -> Result<Vec<LinkEvent>>;
}
