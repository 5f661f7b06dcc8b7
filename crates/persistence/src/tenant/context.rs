//! The caller identity passed into every ledger operation.

use std::sync::Arc;

use super::id::TenantId;
use super::permissions::{Operation, TenantPermissions};
use crate::error::TenantError;
use crate::types::DocumentKind;

/// Who is acting, on behalf of which tenant, with which rights.
///
/// The request layer builds one of these per call. Services never trust it
/// blindly: the [`TenantResolver`](super::TenantResolver) checks the tenant id
/// against the registry before a scope is handed out.
///
/// ```
/// use tally_persistence::tenant::{TenantContext, TenantId, TenantPermissions};
///
/// let ctx = TenantContext::new(TenantId::new("acme"), TenantPermissions::full_access())
///     .with_correlation_id("req-1");
/// assert_eq!(ctx.correlation_id(), Some("req-1"));
/// ```
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant_id: TenantId,
    permissions: Arc<TenantPermissions>,
    /// Copied onto every lifecycle event emitted for this call.
    correlation_id: Option<String>,
}

impl TenantContext {
    /// Creates a context without a correlation id.
    pub fn new(tenant_id: TenantId, permissions: TenantPermissions) -> Self {
        Self {
            tenant_id,
            permissions: Arc::new(permissions),
            correlation_id: None,
        }
    }

    /// Shorthand for a context with [`TenantPermissions::full_access`].
    pub fn full_access(tenant_id: impl Into<TenantId>) -> Self {
        Self::new(tenant_id.into(), TenantPermissions::full_access())
    }

    /// Tags the context with a request correlation id.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// The tenant this context acts for.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// The rights granted to the caller.
    pub fn permissions(&self) -> &TenantPermissions {
        &self.permissions
    }

    /// Correlation id, if the caller supplied one.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Fails with [`TenantError::OperationNotPermitted`] unless `operation`
    /// is allowed on documents of `kind`.
    ///
    /// ```
    /// use tally_persistence::tenant::{Operation, TenantContext, TenantId, TenantPermissions};
    /// use tally_persistence::types::DocumentKind;
    ///
    /// let ctx = TenantContext::new(TenantId::new("acme"), TenantPermissions::read_only());
    /// assert!(ctx.check_permission(Operation::Read, DocumentKind::Bill).is_ok());
    /// assert!(ctx.check_permission(Operation::Create, DocumentKind::Bill).is_err());
    /// ```
    pub fn check_permission(
        &self,
        operation: Operation,
        kind: DocumentKind,
    ) -> Result<(), TenantError> {
        if !self.permissions.can_perform(operation, kind) {
            return Err(TenantError::OperationNotPermitted {
                tenant_id: self.tenant_id.clone(),
                operation: operation.to_string(),
                kind,
            });
        }
        Ok(())
    }
}
