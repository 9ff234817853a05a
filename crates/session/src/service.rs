//! The session lifecycle service: login, refresh (rotation), revocation.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use gestor_context::RequestScope;
use gestor_core::UserId;
use gestor_auth::{PasswordHasher, TokenSigner};
use gestor_store::records::{
    LoginHistoryRecord, RefreshTokenRecord, RefreshTokenUpdate, UserRecord,
};
use gestor_store::{DataStore, FieldValue, Filter, Operation, Patch};

use crate::audit::{AuditEvent, AuditEventKind, AuditSink};
use crate::error::SessionError;
use crate::snapshot::load_memberships;

/// The credential pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Signed JWT carrying the membership snapshot; minutes-lived.
    pub access_token: String,
    /// Opaque single-use rotation handle; days-lived.
    pub refresh_token: String,
}

/// Request metadata recorded with a successful login.
#[derive(Debug, Clone, Default)]
pub struct LoginMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Orchestrates credential verification and the refresh-token family.
///
/// Generic over the storage backend, the password algorithm, and the audit
/// sink; production wires the scoped store, Argon2, and a persistent sink.
#[derive(Debug)]
pub struct SessionService<S, H, A> {
    store: Arc<S>,
    signer: TokenSigner,
    hasher: H,
    audit: Arc<A>,
}

impl<S, H, A> SessionService<S, H, A>
where
    S: DataStore,
    H: PasswordHasher,
    A: AuditSink,
{
    pub fn new(store: Arc<S>, signer: TokenSigner, hasher: H, audit: Arc<A>) -> Self {
        Self {
            store,
            signer,
            hasher,
            audit,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown email, wrong password, and deactivated account all collapse
    /// into [`SessionError::InvalidCredentials`].
    pub async fn login(&self, email: &str, senha: &str, meta: LoginMeta) -> Result<TokenPair, SessionError> {
        let user = self
            .store
            .execute::<UserRecord>(Operation::FindFirst {
                filter: Filter::all().with_equals("email", FieldValue::Str(email.to_string())),
            })
            .await?
            .into_one()?;

        let Some(user) = user else {
            self.emit(AuditEvent::new(AuditEventKind::LoginFailed).email(email));
            return Err(SessionError::InvalidCredentials);
        };

        if !user.active || !self.hasher.verify(senha, &user.password_hash)? {
            self.emit(
                AuditEvent::new(AuditEventKind::LoginFailed)
                    .subject(user.id)
                    .email(email),
            );
            return Err(SessionError::InvalidCredentials);
        }

        self.store
            .execute(Operation::Create {
                row: LoginHistoryRecord {
                    id: Uuid::new_v4(),
                    subject_id: user.id,
                    ip: meta.ip,
                    user_agent: meta.user_agent,
                    at: Utc::now(),
                },
            })
            .await?
            .into_created()?;

        self.emit(
            AuditEvent::new(AuditEventKind::LoginSucceeded)
                .subject(user.id)
                .email(&user.email),
        );

        self.issue_pair(&user).await
    }

    /// Rotate a refresh token: revoke it, re-read the membership snapshot,
    /// and issue a fresh pair.
    ///
    /// Checks run in a fixed order: existence, then reuse, then expiry. An
    /// expired-but-reused token is still theft evidence and must trigger the
    /// family revocation, so reuse is checked first.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let record = self
            .store
            .execute::<RefreshTokenRecord>(Operation::FindFirst {
                filter: Filter::all()
                    .with_equals("token", FieldValue::Str(refresh_token.to_string())),
            })
            .await?
            .into_one()?
            .ok_or(SessionError::InvalidToken)?;

        if record.revoked_at.is_some() {
            return Err(self.handle_reuse(record.subject_id).await?);
        }

        if record.expires_at <= Utc::now() {
            return Err(SessionError::TokenExpired);
        }

        // Single-use enforcement: the revocation is conditional on the token
        // still being live, so exactly one of any concurrent presenters wins.
        let rotated = self
            .store
            .execute::<RefreshTokenRecord>(Operation::Update {
                filter: Filter::by_key(record.id)
                    .with_equals("revoked_at", FieldValue::Null),
                patch: Patch::Fields(RefreshTokenUpdate {
                    revoked_at: Utc::now(),
                }),
            })
            .await?
            .into_one()?;
        if rotated.is_none() {
            // Lost the race: someone else just rotated this token.
            return Err(self.handle_reuse(record.subject_id).await?);
        }

        let user = self
            .store
            .execute::<UserRecord>(Operation::FindUnique {
                key: record.subject_id,
            })
            .await?
            .into_one()?
            .ok_or(SessionError::InvalidToken)?;

        self.emit(AuditEvent::new(AuditEventKind::TokensRefreshed).subject(user.id));
        self.issue_pair(&user).await
    }

    /// Revoke one refresh token (logout). Idempotent: revoking an unknown or
    /// already-revoked token is not an error.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), SessionError> {
        let revoked = self
            .store
            .execute::<RefreshTokenRecord>(Operation::Update {
                filter: Filter::all()
                    .with_equals("token", FieldValue::Str(refresh_token.to_string()))
                    .with_equals("revoked_at", FieldValue::Null),
                patch: Patch::Fields(RefreshTokenUpdate {
                    revoked_at: Utc::now(),
                }),
            })
            .await?
            .into_one()?;

        if let Some(revoked) = revoked {
            self.emit(AuditEvent::new(AuditEventKind::SessionRevoked).subject(revoked.subject_id));
        }
        Ok(())
    }

    /// Revoke every live refresh token the subject holds.
    pub async fn revoke_all(&self, subject_id: UserId) -> Result<u64, SessionError> {
        let revoked = self
            .store
            .execute::<RefreshTokenRecord>(Operation::UpdateMany {
                filter: Filter::all()
                    .with_equals("subject_id", FieldValue::Int(subject_id.as_i64()))
                    .with_equals("revoked_at", FieldValue::Null),
                patch: Patch::Fields(RefreshTokenUpdate {
                    revoked_at: Utc::now(),
                }),
            })
            .await?
            .into_count()?;
        Ok(revoked)
    }

    /// Theft response: revoke the whole session family, then report.
    ///
    /// Returns the error to surface so callers cannot forget the revocation:
    /// the mass revoke happens before anything escapes this function.
    async fn handle_reuse(&self, subject_id: UserId) -> Result<SessionError, SessionError> {
        let revoked = self.revoke_all(subject_id).await?;
        tracing::warn!(
            subject = %subject_id,
            revoked,
            "refresh token reuse detected; revoked all sessions for subject"
        );
        self.emit(AuditEvent::new(AuditEventKind::RefreshReuseDetected).subject(subject_id));
        Ok(SessionError::SuspiciousActivity)
    }

    async fn issue_pair(&self, user: &UserRecord) -> Result<TokenPair, SessionError> {
        let memberships = load_memberships(self.store.as_ref(), user.id).await?;
        let now = Utc::now();
        let access_token = self.signer.sign(user.id, &user.email, &memberships, now)?;

        let refresh_token = Uuid::new_v4().to_string();
        self.store
            .execute(Operation::Create {
                row: RefreshTokenRecord {
                    id: Uuid::new_v4(),
                    token: refresh_token.clone(),
                    subject_id: user.id,
                    issued_at: now,
                    expires_at: now + self.signer.config().refresh_ttl,
                    revoked_at: None,
                },
            })
            .await?
            .into_created()?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Fire-and-forget audit write on a task carrying the current request
    /// context snapshot.
    fn emit(&self, mut event: AuditEvent) {
        if event.request_id.is_none() {
            if let Ok(request_id) = RequestScope::request_id() {
                event = event.request(request_id);
            }
        }

        let sink = Arc::clone(&self.audit);
        let snapshot = RequestScope::capture();
        tokio::spawn(async move {
            let write = async {
                if let Err(error) = sink.record(event).await {
                    tracing::warn!(%error, "audit write failed");
                }
            };
            match snapshot {
                Some(ctx) => RequestScope::run(ctx, write).await,
                None => write.await,
            }
        });
    }
}
