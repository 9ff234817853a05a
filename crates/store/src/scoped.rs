//! The data-access interceptor.
//!
//! Wraps any [`DataStore`] and rewrites every operation before it reaches
//! the backend, in this order:
//!
//! 1. tenant scoping (when the entity is tenant-scoped AND the ambient
//!    request context has a tenant selected);
//! 2. soft-delete rules (default live-rows-only visibility, and the
//!    delete-to-update rewrite).
//!
//! With no tenant in context, tenant-scoped operations pass through
//! unscoped. That is the deliberate escape hatch for system/background work
//! that legitimately crosses tenants; request-handling code gets its tenant
//! set by the propagation middleware before any of this runs.

use async_trait::async_trait;
use chrono::Utc;

use gestor_context::RequestScope;
use gestor_core::TenantId;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::filter::{DeletedAtClause, Filter};
use crate::op::{DataStore, Operation, Outcome, Patch};

/// Tenant-scoping + soft-delete decorator over a backend store.
#[derive(Debug, Clone)]
pub struct ScopedStore<S> {
    inner: S,
}

impl<S> ScopedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn apply_tenant_scope<E: Entity>(op: Operation<E>, tenant_id: TenantId) -> Operation<E> {
    match op {
        // A unique-key lookup with an extra tenant clause is no longer a
        // key lookup; downgrade to a filtered first-match capped at one.
        Operation::FindUnique { key } => Operation::FindFirst {
            filter: Filter::by_key(key).with_tenant(tenant_id),
        },
        Operation::FindFirst { filter } => Operation::FindFirst {
            filter: filter.with_tenant(tenant_id),
        },
        Operation::FindMany { filter } => Operation::FindMany {
            filter: filter.with_tenant(tenant_id),
        },
        Operation::Count { filter } => Operation::Count {
            filter: filter.with_tenant(tenant_id),
        },
        // The active tenant always wins over whatever the caller put in
        // the row.
        Operation::Create { mut row } => {
            row.assign_tenant(tenant_id);
            Operation::Create { row }
        }
        Operation::Update { filter, patch } => Operation::Update {
            filter: filter.with_tenant(tenant_id),
            patch,
        },
        Operation::UpdateMany { filter, patch } => Operation::UpdateMany {
            filter: filter.with_tenant(tenant_id),
            patch,
        },
        Operation::Delete { filter } => Operation::Delete {
            filter: filter.with_tenant(tenant_id),
        },
        Operation::DeleteMany { filter } => Operation::DeleteMany {
            filter: filter.with_tenant(tenant_id),
        },
    }
}

fn apply_soft_delete<E: Entity>(op: Operation<E>) -> Operation<E> {
    fn default_live<E: Entity>(filter: Filter<E>) -> Filter<E> {
        // An explicit deleted_at clause from the caller always wins.
        if filter.deleted_at == DeletedAtClause::Unspecified {
            filter.with_deleted(DeletedAtClause::IsNull)
        } else {
            filter
        }
    }

    match op {
        Operation::FindUnique { key } => Operation::FindFirst {
            filter: Filter::by_key(key).with_deleted(DeletedAtClause::IsNull),
        },
        Operation::FindFirst { filter } => Operation::FindFirst {
            filter: default_live(filter),
        },
        Operation::FindMany { filter } => Operation::FindMany {
            filter: default_live(filter),
        },
        Operation::Count { filter } => Operation::Count {
            filter: default_live(filter),
        },
        // Deletes become updates; rows are never physically removed.
        Operation::Delete { filter } => Operation::Update {
            filter,
            patch: Patch::SoftDelete { at: Utc::now() },
        },
        Operation::DeleteMany { filter } => Operation::UpdateMany {
            filter,
            patch: Patch::SoftDelete { at: Utc::now() },
        },
        other => other,
    }
}

#[async_trait]
impl<S: DataStore> DataStore for ScopedStore<S> {
    async fn execute<E: Entity>(&self, op: Operation<E>) -> Result<Outcome<E>, StoreError> {
        let op = if E::TENANT_SCOPED {
            match RequestScope::tenant_hint() {
                Some(tenant_id) => apply_tenant_scope(op, tenant_id),
                None => {
                    tracing::debug!(
                        entity = E::KIND,
                        operation = op.kind(),
                        "tenant-scoped entity accessed without tenant context; \
                         passing through unscoped"
                    );
                    op
                }
            }
        } else {
            op
        };

        let op = if E::SOFT_DELETE { apply_soft_delete(op) } else { op };

        self.inner.execute(op).await
    }
}
