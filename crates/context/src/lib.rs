//! `gestor-context` — per-request ambient context.
//!
//! Carries `{tenant_id, subject_id, request_id}` across an entire async call
//! chain without threading them through every function signature. The value
//! lives in a tokio task-local, so it survives `.await` suspension points and
//! is never shared between concurrent requests — a plain global would be.
//!
//! Reading `tenant_id`/`subject_id` when they were never set is a programming
//! error (a missing propagation call), surfaced as [`ContextError`] rather
//! than silently defaulting: better to fail the request than to run an
//! unscoped multi-tenant query.

pub mod scope;

pub use scope::{ContextError, RequestContext, RequestScope};
