//! Tenant resolution.
//!
//! A [`TenantResolver`] turns a caller-supplied [`TenantContext`] into a
//! [`TenantScope`]: the storage handle bound to that tenant's partition. Every
//! service operation resolves its scope first, so an unknown tenant fails before
//! any data is read or written.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::context::TenantContext;
use crate::core::LedgerStore;
use crate::error::{LedgerResult, TenantError};
use crate::types::TenantRecord;

/// Resolves a tenant context to a storage scope.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// The storage type handed out in resolved scopes.
    type Store: LedgerStore;

    /// Resolves the context, failing with [`TenantError::UnknownTenant`] when
    /// the tenant is not registered.
    async fn resolve(&self, context: &TenantContext) -> LedgerResult<TenantScope<Self::Store>>;
}

/// A storage handle bound to one resolved tenant.
#[derive(Debug)]
pub struct TenantScope<S> {
    context: TenantContext,
    tenant: TenantRecord,
    store: Arc<S>,
}

impl<S> TenantScope<S> {
    /// Creates a scope for an already verified tenant.
    pub fn new(context: TenantContext, tenant: TenantRecord, store: Arc<S>) -> Self {
        Self {
            context,
            tenant,
            store,
        }
    }

    /// Returns the caller's tenant context.
    pub fn context(&self) -> &TenantContext {
        &self.context
    }

    /// Returns the registered tenant record.
    pub fn tenant(&self) -> &TenantRecord {
        &self.tenant
    }

    /// Returns the storage handle.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Resolves tenants against the tenant registry kept in storage.
#[derive(Debug)]
pub struct RegisteredTenantResolver<S> {
    store: Arc<S>,
}

impl<S> RegisteredTenantResolver<S> {
    /// Creates a resolver backed by the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: LedgerStore> TenantResolver for RegisteredTenantResolver<S> {
    type Store = S;

    async fn resolve(&self, context: &TenantContext) -> LedgerResult<TenantScope<S>> {
        context.tenant_id().validate()?;

        let tenant = self
            .store
            .find_tenant(context.tenant_id())
            .await?
            .ok_or_else(|| TenantError::UnknownTenant {
                tenant_id: context.tenant_id().clone(),
            })?;

        debug!(
            tenant = %context.tenant_id(),
            correlation_id = context.correlation_id().unwrap_or("-"),
            "Resolved tenant scope"
        );

        Ok(TenantScope::new(
            context.clone(),
            tenant,
            Arc::clone(&self.store),
        ))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::backends::sqlite::SqliteBackend;
    use crate::core::TenantStorage;
    use crate::error::{ErrorCode, LedgerError};
    use crate::tenant::{TenantId, TenantPermissions};

    fn create_test_backend() -> Arc<SqliteBackend> {
        let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
        backend.init_schema().expect("Failed to initialize schema");
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_resolve_registered_tenant() {
        let backend = create_test_backend();
        backend
            .register_tenant(&TenantId::new("acme"), "Acme Corp")
            .await
            .unwrap();

        let resolver = RegisteredTenantResolver::new(backend);
        let ctx = TenantContext::new(TenantId::new("acme"), TenantPermissions::full_access());
        let scope = resolver.resolve(&ctx).await.unwrap();

        assert_eq!(scope.tenant().name, "Acme Corp");
        assert_eq!(scope.context().tenant_id().as_str(), "acme");
    }

    #[tokio::test]
    async fn test_resolve_unknown_tenant() {
        let resolver = RegisteredTenantResolver::new(create_test_backend());
        let ctx = TenantContext::new(TenantId::new("ghost"), TenantPermissions::full_access());

        let err = resolver.resolve(&ctx).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TenantNotFound));
    }

    #[tokio::test]
    async fn test_resolve_malformed_tenant() {
        let resolver = RegisteredTenantResolver::new(create_test_backend());
        let ctx = TenantContext::new(TenantId::new("not valid"), TenantPermissions::full_access());

        let err = resolver.resolve(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Tenant(TenantError::InvalidTenant { .. })
        ));
    }
}
