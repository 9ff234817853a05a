//! Request/response DTOs. Wire field names keep the Portuguese contract
//! existing clients already speak (`senha`, `empresas`, `perfis`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gestor_auth::Principal;
use gestor_core::TenantId;
use gestor_session::TokenPair;
use gestor_store::records::{CompanyRecord, ProfileRecord};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipView {
    pub id: TenantId,
    pub perfis: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub sub: i64,
    pub email: String,
    pub empresas: Vec<MembershipView>,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            sub: principal.subject_id.as_i64(),
            email: principal.email,
            empresas: principal
                .memberships
                .into_iter()
                .map(|m| MembershipView {
                    id: m.tenant_id,
                    perfis: m.roles.iter().map(|r| r.code().to_string()).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyView {
    pub id: TenantId,
    pub nome: String,
}

impl From<CompanyRecord> for CompanyView {
    fn from(row: CompanyRecord) -> Self {
        Self {
            id: row.id,
            nome: row.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub codigo: String,
    pub nome: String,
    pub permissoes: Vec<String>,
}

impl From<ProfileRecord> for ProfileView {
    fn from(row: ProfileRecord) -> Self {
        Self {
            id: row.id,
            codigo: row.code,
            nome: row.name,
            permissoes: row.permission_codes,
        }
    }
}
