//! Document number uniqueness.

use async_trait::async_trait;

use crate::core::DocumentStorage;
use crate::error::{LedgerResult, ResourceError};
use crate::tenant::TenantContext;
use crate::types::DocumentKind;

/// Checks that a document number is free within a tenant and kind.
#[async_trait]
pub trait UniquenessValidator: Send + Sync {
    /// Fails with `ResourceError::DuplicateNumber` when another document of
    /// the kind already uses `number`. The document `exclude_id` is ignored so
    /// an edit can keep its own number. A missing number always passes.
    async fn ensure_unique(
        &self,
        tenant: &TenantContext,
        documents: &dyn DocumentStorage,
        kind: DocumentKind,
        number: Option<&str>,
        exclude_id: Option<i64>,
    ) -> LedgerResult<()>;
}

/// Uniqueness validator that queries the document store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberUniquenessValidator;

impl NumberUniquenessValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UniquenessValidator for NumberUniquenessValidator {
    async fn ensure_unique(
        &self,
        tenant: &TenantContext,
        documents: &dyn DocumentStorage,
        kind: DocumentKind,
        number: Option<&str>,
        exclude_id: Option<i64>,
    ) -> LedgerResult<()> {
        let Some(number) = number else {
            return Ok(());
        };

        if documents
            .number_exists(tenant, kind, number, exclude_id)
            .await?
        {
            return Err(ResourceError::DuplicateNumber {
                kind,
                number: number.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
