//! Admin-backend records needed by the authorization core.
//!
//! Deliberately minimal: just enough of the users/companies/profiles model
//! to exercise tenant scoping, soft deletes, and the session lifecycle.
//! Capability tags mirror the original data model — users, companies, and
//! profiles are soft-deletable; profiles and user-company memberships are
//! tenant-scoped; refresh tokens and login history are neither (refresh
//! tokens are kept forever for forensics, scoped by subject).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gestor_core::{TenantId, UserId};

use crate::entity::Entity;
use crate::filter::FieldValue;

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// A user account (soft-deletable, not tenant-scoped: one account may belong
/// to many tenants).
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(id: UserId, email: impl Into<String>, name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            active: true,
            deleted_at: None,
        }
    }
}

/// Field changes applicable to a user row.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

impl Entity for UserRecord {
    const KIND: &'static str = "user";
    const SOFT_DELETE: bool = true;

    type Key = UserId;
    type Update = UserUpdate;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn apply_update(&mut self, update: &Self::Update) {
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(hash) = &update.password_hash {
            self.password_hash = hash.clone();
        }
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.active = false;
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "email" => Some(FieldValue::Str(self.email.clone())),
            "active" => Some(FieldValue::Bool(self.active)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Companies (tenants)
// ─────────────────────────────────────────────────────────────────────────────

/// A company — the tenant itself (soft-deletable; not tenant-scoped, it IS
/// the partition key).
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub id: TenantId,
    pub name: String,
    pub active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CompanyRecord {
    pub fn new(id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
}

impl Entity for CompanyRecord {
    const KIND: &'static str = "company";
    const SOFT_DELETE: bool = true;

    type Key = TenantId;
    type Update = CompanyUpdate;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn apply_update(&mut self, update: &Self::Update) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.active = false;
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(FieldValue::Str(self.name.clone())),
            "active" => Some(FieldValue::Bool(self.active)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profiles (roles)
// ─────────────────────────────────────────────────────────────────────────────

/// A profile ("perfil") — a named permission bundle within one tenant.
/// Tenant-scoped AND soft-deletable. Permission codes are denormalized onto
/// the profile; the permission catalog itself is out of the core's scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub tenant_id: Option<TenantId>,
    pub code: String,
    pub name: String,
    pub permission_codes: Vec<String>,
    pub active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    pub fn new(
        id: Uuid,
        tenant_id: TenantId,
        code: impl Into<String>,
        name: impl Into<String>,
        permission_codes: Vec<String>,
    ) -> Self {
        Self {
            id,
            tenant_id: Some(tenant_id),
            code: code.into(),
            name: name.into(),
            permission_codes,
            active: true,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub permission_codes: Option<Vec<String>>,
}

impl Entity for ProfileRecord {
    const KIND: &'static str = "profile";
    const TENANT_SCOPED: bool = true;
    const SOFT_DELETE: bool = true;

    type Key = Uuid;
    type Update = ProfileUpdate;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn apply_update(&mut self, update: &Self::Update) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(codes) = &update.permission_codes {
            self.permission_codes = codes.clone();
        }
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    fn assign_tenant(&mut self, tenant_id: TenantId) {
        self.tenant_id = Some(tenant_id);
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.active = false;
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "code" => Some(FieldValue::Str(self.code.clone())),
            "active" => Some(FieldValue::Bool(self.active)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User-company memberships
// ─────────────────────────────────────────────────────────────────────────────

/// Links a user to a tenant with the profiles held there (tenant-scoped,
/// not soft-deletable — removal is a hard unlink).
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub profile_ids: Vec<Uuid>,
}

impl MembershipRecord {
    pub fn new(id: Uuid, user_id: UserId, tenant_id: TenantId, profile_ids: Vec<Uuid>) -> Self {
        Self {
            id,
            user_id,
            tenant_id: Some(tenant_id),
            profile_ids,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MembershipUpdate {
    pub profile_ids: Option<Vec<Uuid>>,
}

impl Entity for MembershipRecord {
    const KIND: &'static str = "membership";
    const TENANT_SCOPED: bool = true;

    type Key = Uuid;
    type Update = MembershipUpdate;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn apply_update(&mut self, update: &Self::Update) {
        if let Some(ids) = &update.profile_ids {
            self.profile_ids = ids.clone();
        }
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    fn assign_tenant(&mut self, tenant_id: TenantId) {
        self.tenant_id = Some(tenant_id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "user_id" => Some(FieldValue::Int(self.user_id.as_i64())),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh tokens
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted refresh token. Never physically deleted; revocation is a
/// timestamp so the row remains for audit/forensics.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub token: String,
    pub subject_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// The only mutation a refresh token ever sees: revocation.
#[derive(Debug, Clone)]
pub struct RefreshTokenUpdate {
    pub revoked_at: DateTime<Utc>,
}

impl Entity for RefreshTokenRecord {
    const KIND: &'static str = "refresh_token";

    type Key = Uuid;
    type Update = RefreshTokenUpdate;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn apply_update(&mut self, update: &Self::Update) {
        self.revoked_at = Some(update.revoked_at);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "token" => Some(FieldValue::Str(self.token.clone())),
            "subject_id" => Some(FieldValue::Int(self.subject_id.as_i64())),
            "revoked_at" => Some(
                self.revoked_at
                    .map(FieldValue::Time)
                    .unwrap_or(FieldValue::Null),
            ),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Login history
// ─────────────────────────────────────────────────────────────────────────────

/// One successful login (append-only).
#[derive(Debug, Clone, PartialEq)]
pub struct LoginHistoryRecord {
    pub id: Uuid,
    pub subject_id: UserId,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub at: DateTime<Utc>,
}

impl Entity for LoginHistoryRecord {
    const KIND: &'static str = "login_history";

    type Key = Uuid;
    type Update = ();

    fn key(&self) -> Self::Key {
        self.id
    }

    fn apply_update(&mut self, _update: &Self::Update) {}

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "subject_id" => Some(FieldValue::Int(self.subject_id.as_i64())),
            _ => None,
        }
    }
}
