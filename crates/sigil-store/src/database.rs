//! PostgreSQL storage backend.
//!
//! Schema lives in [`SCHEMA`] and is applied idempotently at startup.
//! Link/unlink run in a transaction with the number row locked, so the
//! one-holder-per-number invariant holds under concurrent admins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use sigil_core::types::{
    Holder, HolderId, Invitation, InvitationId, LinkAction, LinkEvent, LinkEventId, NumberId,
    Role, UniqueNumber, User, UserId,
};

use crate::error::{Error, Result};
use crate::traits::{Credentials, HistoryFilter, HolderDraft, NewUser, Page, Store};

/// Idempotent schema for the registry tables.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    full_name     TEXT,
    is_active     BOOLEAN NOT NULL DEFAULT TRUE,
    is_invited    BOOLEAN NOT NULL DEFAULT FALSE,
    role          TEXT NOT NULL,
    invited_by    BIGINT REFERENCES users(id),
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS invitations (
    id          BIGSERIAL PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    invited_by  BIGINT NOT NULL REFERENCES users(id),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    accepted    BOOLEAN NOT NULL DEFAULT FALSE,
    accepted_by BIGINT REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS holders (
    id            BIGSERIAL PRIMARY KEY,
    name          TEXT NOT NULL,
    contact_email TEXT,
    notes         TEXT,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS unique_numbers (
    id          BIGSERIAL PRIMARY KEY,
    number      TEXT NOT NULL UNIQUE,
    holder_id   BIGINT REFERENCES holders(id) ON DELETE RESTRICT,
    assigned_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS link_events (
    id          BIGSERIAL PRIMARY KEY,
    holder_id   BIGINT NOT NULL REFERENCES holders(id) ON DELETE CASCADE,
    number_id   BIGINT NOT NULL REFERENCES unique_numbers(id) ON DELETE CASCADE,
    admin_id    BIGINT NOT NULL REFERENCES users(id),
    action      TEXT NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS unique_numbers_holder_idx ON unique_numbers (holder_id);
CREATE INDEX IF NOT EXISTS link_events_recency_idx ON link_events (recorded_at DESC, id DESC);
"#;

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    is_active: bool,
    is_invited: bool,
    role: String,
    invited_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| Error::Corrupt(format!("unknown role '{}'", self.role)))?;
        Ok(User {
            id: UserId::new(self.id),
            email: self.email,
            full_name: self.full_name,
            is_active: self.is_active,
            is_invited: self.is_invited,
            role,
            invited_by: self.invited_by.map(UserId::new),
            created_at: self.created_at,
        })
    }

    fn into_credentials(self) -> Result<Credentials> {
        let password_hash = self.password_hash.clone();
        Ok(Credentials {
            user: self.into_user()?,
            password_hash,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvitationRow {
    id: i64,
    email: String,
    invited_by: i64,
    created_at: DateTime<Utc>,
    accepted: bool,
    accepted_by: Option<i64>,
}

impl From<InvitationRow> for Invitation {
    fn from(row: InvitationRow) -> Self {
        Invitation {
            id: InvitationId::new(row.id),
            email: row.email,
            invited_by: UserId::new(row.invited_by),
            created_at: row.created_at,
            accepted: row.accepted,
            accepted_by: row.accepted_by.map(UserId::new),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HolderRow {
    id: i64,
    name: String,
    contact_email: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<HolderRow> for Holder {
    fn from(row: HolderRow) -> Self {
        Holder {
            id: HolderId::new(row.id),
            name: row.name,
            contact_email: row.contact_email,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NumberRow {
    id: i64,
    number: String,
    holder_id: Option<i64>,
    assigned_at: Option<DateTime<Utc>>,
}

impl From<NumberRow> for UniqueNumber {
    fn from(row: NumberRow) -> Self {
        UniqueNumber {
            id: NumberId::new(row.id),
            number: row.number,
            holder_id: row.holder_id.map(HolderId::new),
            assigned_at: row.assigned_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    holder_id: i64,
    number_id: i64,
    admin_id: i64,
    action: String,
    recorded_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<LinkEvent> {
        let action = LinkAction::parse(&self.action)
            .ok_or_else(|| Error::Corrupt(format!("unknown link action '{}'", self.action)))?;
        Ok(LinkEvent {
            id: LinkEventId::new(self.id),
            holder_id: HolderId::new(self.holder_id),
            number_id: NumberId::new(self.number_id),
            admin_id: UserId::new(self.admin_id),
            action,
            recorded_at: self.recorded_at,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// PgStore
// ============================================================================

/// PostgreSQL [`Store`] backend.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database with a small pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the registry schema (idempotent).
    pub async fn run_migrations(&self) -> Result<()> {
        log::info!("applying registry schema");
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn holder_exists(tx: &mut Transaction<'_, Postgres>, id: HolderId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM holders WHERE id = $1)")
            .bind(id.get())
            .fetch_one(&mut **tx)
            .await?;
        Ok(exists)
    }

    /// Fetch a number row inside a transaction with the row locked.
    async fn number_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: NumberId,
    ) -> Result<NumberRow> {
        sqlx::query_as::<_, NumberRow>(
            "SELECT id, number, holder_id, assigned_at FROM unique_numbers WHERE id = $1 FOR UPDATE",
        )
        .bind(id.get())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| Error::not_found("number", id.get()))
    }

    async fn record_event(
        tx: &mut Transaction<'_, Postgres>,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
        action: LinkAction,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO link_events (holder_id, number_id, admin_id, action) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(holder.get())
        .bind(number.get())
        .bind(admin.get())
        .bind(action.as_str())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, password_hash, full_name, is_invited, role, invited_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, email, password_hash, full_name, is_active, is_invited, role, \
                       invited_by, created_at",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.is_invited)
        .bind(user.role.as_str())
        .bind(user.invited_by.map(UserId::get))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateEmail(user.email.clone())
            } else {
                e.into()
            }
        })?;
        row.into_user()
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, full_name, is_active, is_invited, role, \
                    invited_by, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, full_name, is_active, is_invited, role, \
                    invited_by, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, full_name, is_active, is_invited, role, \
                    invited_by, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_credentials).transpose()
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, full_name, is_active, is_invited, role, \
                    invited_by, created_at \
             FROM users WHERE role = $1 ORDER BY id",
        )
        .bind(Role::Admin.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn superadmin_exists(&self) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
                .bind(Role::Superadmin.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn upsert_invitation(&self, email: &str, invited_by: UserId) -> Result<Invitation> {
        let mut tx = self.pool.begin().await?;

        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut *tx)
            .await?;
        if taken {
            return Err(Error::DuplicateEmail(email.to_string()));
        }

        let existing = sqlx::query_as::<_, InvitationRow>(
            "SELECT id, email, invited_by, created_at, accepted, accepted_by \
             FROM invitations WHERE email = $1 FOR UPDATE",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match existing {
            Some(inv) if inv.accepted => {
                return Err(Error::DuplicateEmail(email.to_string()));
            }
            Some(inv) => {
                sqlx::query_as::<_, InvitationRow>(
                    "UPDATE invitations SET invited_by = $1, created_at = now() WHERE id = $2 \
                     RETURNING id, email, invited_by, created_at, accepted, accepted_by",
                )
                .bind(invited_by.get())
                .bind(inv.id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, InvitationRow>(
                    "INSERT INTO invitations (email, invited_by) VALUES ($1, $2) \
                     RETURNING id, email, invited_by, created_at, accepted, accepted_by",
                )
                .bind(email)
                .bind(invited_by.get())
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(row.into())
    }

    async fn pending_invitation_by_email(&self, email: &str) -> Result<Option<Invitation>> {
        let row = sqlx::query_as::<_, InvitationRow>(
            "SELECT id, email, invited_by, created_at, accepted, accepted_by \
             FROM invitations WHERE email = $1 AND NOT accepted",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Invitation::from))
    }

    async fn mark_invitation_accepted(&self, id: InvitationId, user: UserId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE invitations SET accepted = TRUE, accepted_by = $2 WHERE id = $1",
        )
        .bind(id.get())
        .bind(user.get())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("invitation", id.get()));
        }
        Ok(())
    }

    async fn create_holder(&self, draft: HolderDraft) -> Result<Holder> {
        let row = sqlx::query_as::<_, HolderRow>(
            "INSERT INTO holders (name, contact_email, notes) VALUES ($1, $2, $3) \
             RETURNING id, name, contact_email, notes, created_at",
        )
        .bind(&draft.name)
        .bind(&draft.contact_email)
        .bind(&draft.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn holder_by_id(&self, id: HolderId) -> Result<Option<Holder>> {
        let row = sqlx::query_as::<_, HolderRow>(
            "SELECT id, name, contact_email, notes, created_at FROM holders WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Holder::from))
    }

    async fn list_holders(&self, page: Page) -> Result<Vec<Holder>> {
        let rows = sqlx::query_as::<_, HolderRow>(
            "SELECT id, name, contact_email, notes, created_at FROM holders \
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Holder::from).collect())
    }

    async fn update_holder(&self, id: HolderId, draft: HolderDraft) -> Result<Holder> {
        let row = sqlx::query_as::<_, HolderRow>(
            "UPDATE holders SET name = $2, contact_email = $3, notes = $4 WHERE id = $1 \
             RETURNING id, name, contact_email, notes, created_at",
        )
        .bind(id.get())
        .bind(&draft.name)
        .bind(&draft.contact_email)
        .bind(&draft.notes)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Holder::from)
            .ok_or_else(|| Error::not_found("holder", id.get()))
    }

    async fn delete_holder(&self, id: HolderId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::holder_exists(&mut tx, id).await? {
            return Err(Error::not_found("holder", id.get()));
        }

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM unique_numbers WHERE holder_id = $1)",
        )
        .bind(id.get())
        .fetch_one(&mut *tx)
        .await?;
        if in_use {
            return Err(Error::HolderInUse(id.get()));
        }

        sqlx::query("DELETE FROM holders WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_number(&self, number: &str) -> Result<UniqueNumber> {
        let row = sqlx::query_as::<_, NumberRow>(
            "INSERT INTO unique_numbers (number) VALUES ($1) \
             RETURNING id, number, holder_id, assigned_at",
        )
        .bind(number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateNumber(number.to_string())
            } else {
                e.into()
            }
        })?;
        Ok(row.into())
    }

    async fn number_by_id(&self, id: NumberId) -> Result<Option<UniqueNumber>> {
        let row = sqlx::query_as::<_, NumberRow>(
            "SELECT id, number, holder_id, assigned_at FROM unique_numbers WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UniqueNumber::from))
    }

    async fn list_numbers(
        &self,
        page: Page,
        holder: Option<HolderId>,
    ) -> Result<Vec<UniqueNumber>> {
        let rows = sqlx::query_as::<_, NumberRow>(
            "SELECT id, number, holder_id, assigned_at FROM unique_numbers \
             WHERE ($1::BIGINT IS NULL OR holder_id = $1) \
             ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(holder.map(HolderId::get))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UniqueNumber::from).collect())
    }

    async fn link_number(
        &self,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
    ) -> Result<UniqueNumber> {
        let mut tx = self.pool.begin().await?;

        if !Self::holder_exists(&mut tx, holder).await? {
            return Err(Error::not_found("holder", holder.get()));
        }
        let current = Self::number_for_update(&mut tx, number).await?;
        if current.holder_id.is_some() {
            return Err(Error::AlreadyLinked { number: number.get() });
        }

        let row = sqlx::query_as::<_, NumberRow>(
            "UPDATE unique_numbers SET holder_id = $1, assigned_at = now() WHERE id = $2 \
             RETURNING id, number, holder_id, assigned_at",
        )
        .bind(holder.get())
        .bind(number.get())
        .fetch_one(&mut *tx)
        .await?;

        Self::record_event(&mut tx, holder, number, admin, LinkAction::Link).await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn unlink_number(
        &self,
        holder: HolderId,
        number: NumberId,
        admin: UserId,
    ) -> Result<UniqueNumber> {
        let mut tx = self.pool.begin().await?;

        if !Self::holder_exists(&mut tx, holder).await? {
            return Err(Error::not_found("holder", holder.get()));
        }
        let current = Self::number_for_update(&mut tx, number).await?;
        if current.holder_id != Some(holder.get()) {
            return Err(Error::NotLinked {
                number: number.get(),
                holder: holder.get(),
            });
        }

        let row = sqlx::query_as::<_, NumberRow>(
            "UPDATE unique_numbers SET holder_id = NULL, assigned_at = NULL WHERE id = $1 \
             RETURNING id, number, holder_id, assigned_at",
        )
        .bind(number.get())
        .fetch_one(&mut *tx)
        .await?;

        Self::record_event(&mut tx, holder, number, admin, LinkAction::Unlink).await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn list_history(&self, filter: HistoryFilter, page: Page) -> Result<Vec<LinkEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, holder_id, number_id, admin_id, action, recorded_at FROM link_events \
             WHERE ($1::BIGINT IS NULL OR holder_id = $1) \
               AND ($2::BIGINT IS NULL OR number_id = $2) \
               AND ($3::BIGINT IS NULL OR admin_id = $3) \
             ORDER BY recorded_at DESC, id DESC LIMIT $4 OFFSET $5",
        )
        .bind(filter.holder_id.map(HolderId::get))
        .bind(filter.number_id.map(NumberId::get))
        .bind(filter.admin_id.map(UserId::get))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EventRow::into_event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_covers_all_tables() {
        for table in [
            "users",
            "invitations",
            "holders",
            "unique_numbers",
            "link_events",
        ] {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "schema missing table {table}"
            );
        }
    }

    #[test]
    fn test_row_conversions_reject_corrupt_values() {
        let user = UserRow {
            id: 1,
            email: "a@b.co".to_string(),
            password_hash: String::new(),
            full_name: None,
            is_active: true,
            is_invited: false,
            role: "owner".to_string(),
            invited_by: None,
            created_at: Utc::now(),
        };
        assert!(matches!(user.into_user(), Err(Error::Corrupt(_))));

        let event = EventRow {
            id: 1,
            holder_id: 1,
            number_id: 1,
            admin_id: 1,
            action: "relink".to_string(),
            recorded_at: Utc::now(),
        };
        assert!(matches!(event.into_event(), Err(Error::Corrupt(_))));
    }
}
