use serde::{Deserialize, Serialize};

use gestor_core::{TenantId, UserId};

use crate::roles::RoleGrant;

/// A principal's membership in a tenant.
///
/// This is an authorization boundary object: it states *which tenant* the
/// principal may act within and which roles (with their permission
/// snapshots) are granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<RoleGrant>,
}

impl TenantMembership {
    pub fn new(tenant_id: TenantId, roles: Vec<RoleGrant>) -> Self {
        Self { tenant_id, roles }
    }
}

/// The verified identity derived from an access token.
///
/// Immutable for the lifetime of the token: the memberships are the snapshot
/// embedded at issuance, not a live view of the database. Role or permission
/// changes only become visible after the token is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: UserId,
    pub email: String,
    pub memberships: Vec<TenantMembership>,
}

impl Principal {
    pub fn new(subject_id: UserId, email: impl Into<String>, memberships: Vec<TenantMembership>) -> Self {
        Self {
            subject_id,
            email: email.into(),
            memberships,
        }
    }

    /// The membership for `tenant_id`, if the principal belongs to it.
    pub fn membership_for(&self, tenant_id: TenantId) -> Option<&TenantMembership> {
        self.memberships.iter().find(|m| m.tenant_id == tenant_id)
    }
}
