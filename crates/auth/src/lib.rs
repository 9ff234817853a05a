//! `gestor-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! principals, token claims, and the permission guard as pure logic, plus
//! the password-verification capability behind a trait.

pub mod claims;
pub mod guard;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use claims::{AccessClaims, TokenConfig, TokenError, TokenSigner};
pub use guard::{AccessDenied, RequiredPermissions, check_access};
pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
pub use permissions::PermissionCode;
pub use principal::{Principal, TenantMembership};
pub use roles::RoleGrant;
