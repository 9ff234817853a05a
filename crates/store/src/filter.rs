//! Inspectable conjunctive filters.
//!
//! Filters stay structured (not opaque closures) so the scoping decorator
//! can both add clauses and see what the caller already asked for — the
//! "explicit `deleted_at` wins over the default" rule depends on that.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gestor_core::TenantId;

use crate::entity::Entity;

/// A comparable field value for equality clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Str(String),
    Uuid(Uuid),
    Bool(bool),
    Time(DateTime<Utc>),
    Null,
}

/// Caller intent about soft-deleted rows.
///
/// `Unspecified` lets the interceptor apply the default (live rows only);
/// anything explicit is honored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedAtClause {
    #[default]
    Unspecified,
    IsNull,
    IsNotNull,
}

/// Conjunction of clauses selecting rows of `E`.
#[derive(Debug, Clone)]
pub struct Filter<E: Entity> {
    pub key: Option<E::Key>,
    pub tenant_id: Option<TenantId>,
    pub deleted_at: DeletedAtClause,
    pub equals: Vec<(&'static str, FieldValue)>,
}

impl<E: Entity> Default for Filter<E> {
    fn default() -> Self {
        Self {
            key: None,
            tenant_id: None,
            deleted_at: DeletedAtClause::Unspecified,
            equals: Vec::new(),
        }
    }
}

impl<E: Entity> Filter<E> {
    /// Match every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_key(key: E::Key) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_deleted(mut self, clause: DeletedAtClause) -> Self {
        self.deleted_at = clause;
        self
    }

    pub fn with_equals(mut self, field: &'static str, value: FieldValue) -> Self {
        self.equals.push((field, value));
        self
    }

    /// Whether `row` satisfies every clause.
    pub fn matches(&self, row: &E) -> bool {
        if let Some(key) = &self.key {
            if &row.key() != key {
                return false;
            }
        }

        if let Some(tenant_id) = self.tenant_id {
            if row.tenant_id() != Some(tenant_id) {
                return false;
            }
        }

        match self.deleted_at {
            DeletedAtClause::Unspecified => {}
            DeletedAtClause::IsNull => {
                if row.deleted_at().is_some() {
                    return false;
                }
            }
            DeletedAtClause::IsNotNull => {
                if row.deleted_at().is_none() {
                    return false;
                }
            }
        }

        self.equals
            .iter()
            .all(|(name, want)| row.field(name).as_ref() == Some(want))
    }
}
