//! Permission authorization guard.
//!
//! Runs after authentication and after the context-propagation middleware:
//! given a verified principal, the tenant the request selected, and the
//! permission codes an operation requires, it either resolves the tenant
//! membership to act under or denies with a cause-specific error.
//!
//! Authentication failures are a different layer (401, not here); every
//! denial from this guard is a Forbidden.

use thiserror::Error;

use gestor_core::TenantId;

use crate::permissions::PermissionCode;
use crate::principal::{Principal, TenantMembership};

/// Permission codes an operation requires, with ANY-of semantics:
/// holding at least one of the listed codes is enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPermissions(Vec<PermissionCode>);

impl RequiredPermissions {
    pub fn one(code: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        Self(vec![PermissionCode::new(code)])
    }

    pub fn any_of<I, C>(codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<std::borrow::Cow<'static, str>>,
    {
        Self(codes.into_iter().map(PermissionCode::new).collect())
    }

    pub fn codes(&self) -> &[PermissionCode] {
        &self.0
    }
}

/// Why the guard refused the request. Each cause maps to a distinct
/// Forbidden message; they are intentionally not collapsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    /// The principal has no tenant memberships at all.
    #[error("user has no tenant memberships or permissions")]
    NoMemberships,

    /// The request did not say which tenant it is acting on. Ambiguity is
    /// never resolved silently.
    #[error("the tenant id (x-empresa-id) must be sent in the header to validate permissions")]
    MissingTenantSelector,

    /// The principal does not belong to the selected tenant.
    #[error("user has no access to this tenant")]
    NoTenantAccess,

    /// The principal belongs to the tenant but no role there carries any of
    /// the required permission codes.
    #[error("user lacks the required permission for this resource in this tenant")]
    MissingPermission,
}

/// Decide whether `principal` may perform an operation requiring any of
/// `required` within `selected_tenant`.
///
/// On success the resolved membership is returned so the request can carry
/// it downstream. A principal with zero roles in the matched tenant fails
/// the same way as one whose roles lack the permission.
pub fn check_access<'a>(
    principal: &'a Principal,
    selected_tenant: Option<TenantId>,
    required: &RequiredPermissions,
) -> Result<&'a TenantMembership, AccessDenied> {
    if principal.memberships.is_empty() {
        return Err(AccessDenied::NoMemberships);
    }

    let tenant_id = selected_tenant.ok_or(AccessDenied::MissingTenantSelector)?;

    let membership = principal
        .membership_for(tenant_id)
        .ok_or(AccessDenied::NoTenantAccess)?;

    let granted = membership
        .roles
        .iter()
        .any(|role| required.codes().iter().any(|code| role.grants(code)));

    if granted {
        Ok(membership)
    } else {
        Err(AccessDenied::MissingPermission)
    }
}
