//! Security audit trail.
//!
//! Audit writes are fire-and-forget: they run on a spawned task carrying a
//! snapshot of the request context, and a failed write is logged and
//! swallowed. A slow or broken audit backend must never fail a login.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gestor_core::{RequestId, UserId};
use gestor_store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    LoginSucceeded,
    LoginFailed,
    TokensRefreshed,
    RefreshReuseDetected,
    SessionRevoked,
}

/// One security-relevant event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub subject_id: Option<UserId>,
    pub email: Option<String>,
    pub request_id: Option<RequestId>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(kind: AuditEventKind) -> Self {
        Self {
            kind,
            subject_id: None,
            email: None,
            request_id: None,
            at: Utc::now(),
        }
    }

    pub fn subject(mut self, subject_id: UserId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// Audit backend seam.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record(&self, event: AuditEvent) -> Result<(), StoreError>;
}

/// Discards every event.
#[derive(Debug, Default, Clone)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _event: AuditEvent) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Emits every event as a structured log line.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), StoreError> {
        tracing::info!(
            kind = ?event.kind,
            subject = event.subject_id.map(|s| s.as_i64()),
            email = event.email.as_deref(),
            request_id = event.request_id.as_ref().map(|r| r.as_str()),
            "audit"
        );
        Ok(())
    }
}

/// Keeps events in memory (tests/dev).
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), StoreError> {
        self.events
            .lock()
            .map_err(|_| StoreError::Internal("audit lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}
