//! Access-token claims: the signed snapshot of who the subject is and which
//! tenant/role/permission codes they held at issuance.
//!
//! Wire field names (`empresas`, `perfis`, `permissoes`, `codigo`) are kept
//! from the original API so existing clients can decode the payload.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gestor_core::{TenantId, UserId};

use crate::permissions::PermissionCode;
use crate::principal::{Principal, TenantMembership};
use crate::roles::RoleGrant;

/// Token signing/lifetime configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 signing secret.
    pub secret: String,
    /// Access token lifetime (short — minutes).
    pub access_ttl: Duration,
    /// Refresh token lifetime (long — days).
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("access token expired")]
    Expired,

    #[error("invalid access token: {0}")]
    Invalid(String),
}

/// Permission entry inside a role claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionClaim {
    pub codigo: String,
}

/// Role ("perfil") entry inside a membership claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleClaim {
    pub codigo: String,
    #[serde(default)]
    pub permissoes: Vec<PermissionClaim>,
}

/// Tenant membership entry inside the claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipClaim {
    pub id: TenantId,
    #[serde(default)]
    pub perfis: Vec<RoleClaim>,
}

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id).
    pub sub: i64,
    pub email: String,
    /// Tenant membership snapshot at issuance time.
    #[serde(default)]
    pub empresas: Vec<MembershipClaim>,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl AccessClaims {
    /// Build claims from a membership snapshot.
    pub fn snapshot(
        subject_id: UserId,
        email: &str,
        memberships: &[TenantMembership],
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let empresas = memberships
            .iter()
            .map(|m| MembershipClaim {
                id: m.tenant_id,
                perfis: m
                    .roles
                    .iter()
                    .map(|r| RoleClaim {
                        codigo: r.code().to_string(),
                        permissoes: r
                            .permissions
                            .iter()
                            .map(|p| PermissionClaim {
                                codigo: p.as_str().to_string(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            sub: subject_id.as_i64(),
            email: email.to_string(),
            empresas,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// Reconstruct the verified principal from decoded claims.
    pub fn into_principal(self) -> Principal {
        let memberships = self
            .empresas
            .into_iter()
            .map(|m| TenantMembership {
                tenant_id: m.id,
                roles: m
                    .perfis
                    .into_iter()
                    .map(|r| RoleGrant::new(
                        r.codigo,
                        r.permissoes
                            .into_iter()
                            .map(|p| PermissionCode::new(p.codigo))
                            .collect(),
                    ))
                    .collect(),
            })
            .collect();

        Principal {
            subject_id: UserId::new(self.sub),
            email: self.email,
            memberships,
        }
    }
}

/// HS256 signer/verifier for access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    config: TokenConfig,
}

impl core::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never print the secret.
        f.debug_struct("TokenSigner")
            .field("access_ttl", &self.config.access_ttl)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Sign an access token embedding the membership snapshot.
    pub fn sign(
        &self,
        subject_id: UserId,
        email: &str,
        memberships: &[TenantMembership],
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims::snapshot(
            subject_id,
            email,
            memberships,
            now,
            self.config.access_ttl,
        );
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Decode and verify an access token (signature + expiry).
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        jsonwebtoken::decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
    }
}
