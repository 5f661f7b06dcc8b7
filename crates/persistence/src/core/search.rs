//! Document search.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::tenant::TenantContext;
use crate::types::{DocumentQuery, SearchPage};

use super::storage::DocumentStorage;

/// Executes typed list queries.
///
/// Implementations must restrict results to the tenant in `tenant` and the
/// kind in `query.kind` before evaluating any condition from the query, so
/// that no caller-supplied condition can widen the result set.
#[async_trait]
pub trait SearchProvider: DocumentStorage {
    /// Returns one page of matching documents, with entries and counterparty
    /// attached, plus the total match count.
    async fn search_documents(
        &self,
        tenant: &TenantContext,
        query: &DocumentQuery,
    ) -> LedgerResult<SearchPage>;
}
