//! Task-local request scope.

use std::cell::RefCell;
use std::future::Future;

use thiserror::Error;

use gestor_core::{RequestId, TenantId, UserId};

tokio::task_local! {
    static CONTEXT: RefCell<RequestContext>;
}

/// Error reading the ambient request context.
///
/// These indicate a missing propagation call, not a transient condition, and
/// are fatal for the request that hits them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// No request scope is active on this task at all.
    #[error("request context not established")]
    NotEstablished,

    /// A scope is active but no tenant was ever selected for it.
    #[error("tenant not set in request context")]
    TenantUnset,

    /// A scope is active but the request is unauthenticated.
    #[error("subject not set in request context")]
    SubjectUnset,
}

/// Ambient state for one logical request.
///
/// Created once by the propagation middleware, read many times downstream,
/// discarded when the request's future completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: RequestId,
    tenant_id: Option<TenantId>,
    subject_id: Option<UserId>,
}

impl RequestContext {
    /// Context for an unauthenticated request: correlation id only.
    pub fn anonymous(request_id: RequestId) -> Self {
        Self {
            request_id,
            tenant_id: None,
            subject_id: None,
        }
    }

    pub fn with_subject(mut self, subject_id: UserId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn subject_id(&self) -> Option<UserId> {
        self.subject_id
    }
}

/// Entry points to the task-local request scope.
///
/// `run` establishes a fresh scope for the dynamic extent of a future; the
/// accessors read (or mutate) whatever scope is active on the current task.
#[derive(Debug)]
pub struct RequestScope;

impl RequestScope {
    /// Establish `ctx` for the dynamic extent of `fut`.
    ///
    /// Everything `fut` awaits observes the context; the previous (absent)
    /// state is restored when `fut` completes, including on panic. Work
    /// handed to `tokio::spawn` starts a new task and does NOT inherit the
    /// scope — use [`RequestScope::capture`] and a nested `run` for that.
    pub async fn run<F>(ctx: RequestContext, fut: F) -> F::Output
    where
        F: Future,
    {
        CONTEXT.scope(RefCell::new(ctx), fut).await
    }

    /// Whether any scope is active on this task.
    pub fn is_established() -> bool {
        CONTEXT.try_with(|_| ()).is_ok()
    }

    /// Non-erroring probe: is a tenant selected in the active scope?
    ///
    /// Returns `false` both when no scope is active and when the scope has
    /// no tenant. This is the one accessor that code legitimately running
    /// with or without a tenant may call.
    pub fn has_tenant() -> bool {
        CONTEXT
            .try_with(|ctx| ctx.borrow().tenant_id.is_some())
            .unwrap_or(false)
    }

    /// The tenant selected for the active scope, or `None` when unscoped.
    ///
    /// Used by the data-access interceptor, which intentionally passes
    /// tenant-scoped operations through unscoped when no tenant is active
    /// (system/background jobs).
    pub fn tenant_hint() -> Option<TenantId> {
        CONTEXT.try_with(|ctx| ctx.borrow().tenant_id).ok().flatten()
    }

    /// The active tenant, failing loudly when unset.
    pub fn tenant_id() -> Result<TenantId, ContextError> {
        CONTEXT
            .try_with(|ctx| ctx.borrow().tenant_id)
            .map_err(|_| ContextError::NotEstablished)?
            .ok_or(ContextError::TenantUnset)
    }

    /// The authenticated subject, failing loudly when unset.
    pub fn subject_id() -> Result<UserId, ContextError> {
        CONTEXT
            .try_with(|ctx| ctx.borrow().subject_id)
            .map_err(|_| ContextError::NotEstablished)?
            .ok_or(ContextError::SubjectUnset)
    }

    /// Correlation id of the active scope.
    pub fn request_id() -> Result<RequestId, ContextError> {
        CONTEXT
            .try_with(|ctx| ctx.borrow().request_id.clone())
            .map_err(|_| ContextError::NotEstablished)
    }

    /// Select a tenant on the active scope.
    pub fn set_tenant(tenant_id: TenantId) -> Result<(), ContextError> {
        CONTEXT
            .try_with(|ctx| ctx.borrow_mut().tenant_id = Some(tenant_id))
            .map_err(|_| ContextError::NotEstablished)
    }

    /// Record the authenticated subject on the active scope.
    pub fn set_subject(subject_id: UserId) -> Result<(), ContextError> {
        CONTEXT
            .try_with(|ctx| ctx.borrow_mut().subject_id = Some(subject_id))
            .map_err(|_| ContextError::NotEstablished)
    }

    /// Snapshot the active scope for explicit propagation into a spawned
    /// sub-task (e.g. an asynchronous audit write):
    ///
    /// ```ignore
    /// let snapshot = RequestScope::capture();
    /// tokio::spawn(async move {
    ///     if let Some(ctx) = snapshot {
    ///         RequestScope::run(ctx, do_work()).await;
    ///     }
    /// });
    /// ```
    pub fn capture() -> Option<RequestContext> {
        CONTEXT.try_with(|ctx| ctx.borrow().clone()).ok()
    }
}
