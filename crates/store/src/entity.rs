//! Entity model and compile-time capability tags.

use chrono::{DateTime, Utc};

use gestor_core::TenantId;

use crate::filter::FieldValue;

/// A persistable record.
///
/// Capabilities are associated consts, so "is this entity tenant-scoped /
/// soft-deletable" is answered at compile time and monomorphized into the
/// interceptor — there is no runtime list of model names to keep in sync.
///
/// An impl that sets `TENANT_SCOPED = true` must override the tenant
/// accessors; one that sets `SOFT_DELETE = true` must override the
/// soft-delete accessors and keep its `active` flag in sync with
/// `deleted_at` inside `mark_deleted`.
pub trait Entity: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Stable entity-kind name (used in logs and table keys).
    const KIND: &'static str;

    /// Rows of this entity are partitioned by tenant.
    const TENANT_SCOPED: bool = false;

    /// "Delete" means `deleted_at = now, active = false`, never row removal.
    const SOFT_DELETE: bool = false;

    /// Unique key type for direct lookups.
    type Key: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static;

    /// Field-update payload applied by update operations.
    type Update: Clone + Send + Sync + std::fmt::Debug + 'static;

    fn key(&self) -> Self::Key;

    fn apply_update(&mut self, update: &Self::Update);

    /// Tenant owning this row (tenant-scoped entities only).
    fn tenant_id(&self) -> Option<TenantId> {
        None
    }

    /// Overwrite the owning tenant (create-time injection).
    fn assign_tenant(&mut self, _tenant_id: TenantId) {}

    /// Soft-delete timestamp (soft-deletable entities only).
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Soft-delete this row: set `deleted_at` and clear `active`.
    fn mark_deleted(&mut self, _at: DateTime<Utc>) {}

    /// Named-field access for filter matching. `Some(FieldValue::Null)`
    /// means "present but null"; `None` means the entity has no such field
    /// (and the filter clause will not match).
    fn field(&self, _name: &str) -> Option<FieldValue> {
        None
    }
}
