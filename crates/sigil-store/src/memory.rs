//! In-memory storage backend.
//!
//! Keeps everything in vectors behind one `RwLock`. The API test suite runs
//! against this backend, so it is the executable reference for [`Store`]
//! semantics. Not intended for production load.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use sigil_core::types::{
    Holder, HolderId, Invitation, InvitationId, LinkAction, LinkEvent, LinkEventId, NumberId,
    Role, UniqueNumber, User, UserId,
};

use crate::error::{Error, Result};
use crate::traits::{Credentials, HistoryFilter, HolderDraft, NewUser, Page, Store};

#[derive(Debug, Clone)]
struct UserRec {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<UserRec>,
    invitations: Vec<Invitation>,
    holders: Vec<Holder>,
    numbers: Vec<UniqueNumber>,
    events: Vec<LinkEvent>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`Store`] backend.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn paginate<T: Clone>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.write();
        if inner.users.iter().any(|r| r.user.email == user.email) {
            return Err(Error::DuplicateEmail(user.email));
        }
        let id = inner.next_id();
        let rec = UserRec {
            user: User {
                id: UserId::new(id),
                email: user.email,
                full_name: user.full_name,
                is_active: true,
                is_invited: user.is_invited,
                role: user.role,
                invited_by: user.invited_by,
                created_at: Utc::now(),
            },
            password_hash: user.password_hash,
        };
        inner.users.push(rec.clone());
        Ok(rec.user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone()))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| r.user.clone()))
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| Credentials {
                user: r.user.clone(),
                password_hash: r.password_hash.clone(),
            }))
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .filter(|r| r.user.role == Role::Admin)
            .map(|r| r.user.clone())
            .collect())
    }

    async fn superadmin_exists(&self) -> Result<bool> {
        Ok(self
            .read()
            .users
            .iter()
            .any(|r| r.user.role == Role::Superadmin))
    }

    async fn upsert_invitation(&self, email: &str, invited_by: UserId) -> Result<Invitation> {
        let mut inner = self.write();
        if inner.users.iter().any(|r| r.user.email == email) {
            return Err(Error::DuplicateEmail(email.to_string()));
        }
        if let Some(inv) = inner.invitations.iter_mut().find(|i| i.email == email) {
            if inv.accepted {
                return Err(Error::DuplicateEmail(email.to_string()));
            }
            // Reissue: refresh issuer and timestamp, keep the row.
            inv.invited_by = invited_by;
            inv.created_at = Utc::now();
            return Ok(inv.clone());
        }
        let id = inner.next_id();
        let inv = Invitation {
            id: InvitationId::new(id),
            email: email.to_string(),
            invited_by,
            created_at: Utc::now(),
            accepted: false,
            accepted_by: None,
        };
        inner.invitations.push(inv.clone());
        Ok(inv)
    }

    async fn pending_invitation_by_email(&self, email: &str) -> Result<Option<Invitation>> {
        Ok(self
            .read()
            .invitations
            .iter()
            .find(|i| i.email == email && !i.accepted)
            .cloned())
    }

    async fn mark_invitation_accepted(&self, id: InvitationId, user: UserId) -> Result<()> {
        let mut inner = self.write();
        let inv = inner
            .invitations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::not_found("invitation", id.get()))?;
        inv.accepted = true;
        inv.accepted_by = Some(user);
        Ok(())
    }

    async fn create_holder(&self, draft: HolderDraft) -> Result<Holder> {
        let mut inner = self.write();
        let id = inner.next_id();
        let holder = Holder {
            id: HolderId::new(id),
            name: draft.name,
            contact_email: draft.contact_email,
            notes: draft.notes,
            created_at: Utc::now(),
        };
        inner.holders.push(holder.clone());
        Ok(holder)
    }

    async fn holder_by_id(&self, id: HolderId) -> Result<Option<Holder>> {
        Ok(self.read().holders.iter().find(|h| h.id == id).cloned())
    }

    async fn list_holders(&self, page: Page) -> Result<Vec<Holder>> {
        Ok(paginate(self.read().holders.iter().cloned(), page))
    }

    async fn update_holder(&self, id: HolderId, draft: HolderDraft) -> Result<Holder> {
        let mut inner = self.write();
        let holder = inner
            .holders
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| Error::not_found("holder", id.get()))?;
        holder.name = draft.name;
        holder.contact_email = draft.contact_email;
        holder.notes = draft.notes;
        Ok(holder.clone())
    }

    async fn delete_holder(&self, id: HolderId) -> Result<()> {
        let mut inner = self.write();
        if !inner.holders.iter().any(|h| h.id == id) {
            return Err(Error::not_found("holder", id.get()));
        }
        if inner.numbers.iter().any(|n| n.holder_id == Some(id)) {
            return Err(Error::HolderInUse(id.get()));
        }
        inner.holders.retain(|h| h.id != id);
        inner.events.retain(|e| e.holder_id != id);
        Ok(())
    }

    async fn create_number(&self, number: &str) -> Result<UniqueNumber> {
        let mut inner = self.write();
        if inner.numbers.iter().any(|n| n.number == number) {
            return Err(Error::DuplicateNumber(number.to_string()));
        }
        let id = inner.next_id();
        let num = UniqueNumber {
            id: NumberId::new(id),
            number: number.to_string(),
            holder_id: None,
            assigned_at: None,
        };
        inner.numbers.push(num.clone());
        Ok(num)
    }

    async fn number_by_id(&self, id: NumberId) -> Result<Option<UniqueNumber>> {
        Ok(self.read().numbers.iter().find(|n| n.id == id).cloned())
    }

    async fn list_numbers(
        &self,
        page: Page,
        holder: Option<HolderId>,
    ) -> Result<Vec<UniqueNumber>> {
        let inner = self.read();
        let filtered = inner
            .numbers
            .iter()
            .filter(|n| holder.is_none_or(|h| n.holder_id == Some(h)))
            .cloned();
        Ok(paginate(filtered, page))
    }

    async fn link_number(
        &self,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
    ) -> Result<UniqueNumber> {
        let mut inner = self.write();
        if !inner.holders.iter().any(|h| h.id == holder) {
            return Err(Error::not_found("holder", holder.get()));
        }
        let event_id = inner.next_id();
        let num = inner
            .numbers
            .iter_mut()
            .find(|n| n.id == number)
            .ok_or_else(|| Error::not_found("number", number.get()))?;
        if num.holder_id.is_some() {
            return Err(Error::AlreadyLinked { number: number.get() });
        }
        let now = Utc::now();
        num.holder_id = Some(holder);
        num.assigned_at = Some(now);
        let updated = num.clone();
        inner.events.push(LinkEvent {
            id: LinkEventId::new(event_id),
            holder_id: holder,
            number_id: number,
            admin_id: admin,
            action: LinkAction::Link,
            recorded_at: now,
        });
        Ok(updated)
    }

    async fn unlink_number(
        &self,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
    ) -> Result<UniqueNumber> {
        let mut inner = self.write();
        if !inner.holders.iter().any(|h| h.id == holder) {
            return Err(Error::not_found("holder", holder.get()));
        }
        let event_id = inner.next_id();
        let num = inner
            .numbers
            .iter_mut()
            .find(|n| n.id == number)
            .ok_or_else(|| Error::not_found("number", number.get()))?;
        if num.holder_id != Some(holder) {
            return Err(Error::NotLinked {
                number: number.get(),
                holder: holder.get(),
            });
        }
        num.holder_id = None;
        num.assigned_at = None;
        let updated = num.clone();
        inner.events.push(LinkEvent {
            id: LinkEventId::new(event_id),
            holder_id: holder,
            number_id: number,
            admin_id: admin,
            action: LinkAction::Unlink,
            recorded_at: Utc::now(),
        });
        Ok(updated)
    }

    async fn list_history(&self, filter: HistoryFilter, page: Page) -> Result<Vec<LinkEvent>> {
        let inner = self.read();
        // Events are appended chronologically; newest first means reverse
        // insertion order.
        let filtered = inner
            .events
            .iter()
            .rev()
            .filter(|e| {
                filter.holder_id.is_none_or(|h| e.holder_id == h)
                    && filter.number_id.is_none_or(|n| e.number_id == n)
                    && filter.admin_id.is_none_or(|a| e.admin_id == a)
            })
            .cloned();
        Ok(paginate(filtered, page))
    }
}
