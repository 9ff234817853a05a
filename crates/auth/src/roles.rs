use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::permissions::PermissionCode;

/// A role ("perfil") held within one tenant, with its permission snapshot.
///
/// The permission list is the set that was granted at token issuance; it is
/// a snapshot, not a live view of the role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub code: Cow<'static, str>,
    pub permissions: Vec<PermissionCode>,
}

impl RoleGrant {
    pub fn new(code: impl Into<Cow<'static, str>>, permissions: Vec<PermissionCode>) -> Self {
        Self {
            code: code.into(),
            permissions,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn grants(&self, permission: &PermissionCode) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
