//! `gestor-session` — authentication and session lifecycle.
//!
//! Login verifies credentials and issues a token pair: a short-lived signed
//! access token carrying the tenant/role/permission snapshot, plus an opaque
//! single-use refresh token persisted server-side. Refresh rotates the pair
//! and re-reads the snapshot from storage; presenting an already-rotated
//! token is treated as theft and revokes the subject's entire session
//! family.

pub mod audit;
pub mod error;
pub mod service;
pub mod snapshot;

pub use audit::{
    AuditEvent, AuditEventKind, AuditSink, MemoryAuditSink, NullAuditSink, TracingAuditSink,
};
pub use error::SessionError;
pub use service::{LoginMeta, SessionService, TokenPair};
pub use snapshot::load_memberships;
