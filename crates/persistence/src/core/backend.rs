//! Backend abstraction for database drivers.
//!
//! This module defines the [`Backend`] trait, implemented by each database
//! driver for lifecycle concerns that sit outside the storage traits: schema
//! setup, health checks and capability discovery.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Capabilities that a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// Basic CRUD operations.
    Crud,
    /// Multi-statement ACID transactions.
    Transactions,
    /// Typed filter conditions on document columns.
    DynamicFilters,
    /// Keyword matching on free-text columns.
    KeywordSearch,
    /// Ordering by any filterable column.
    Sorting,
    /// Offset-based pagination.
    OffsetPagination,
}

impl std::fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendCapability::Crud => write!(f, "crud"),
            BackendCapability::Transactions => write!(f, "transactions"),
            BackendCapability::DynamicFilters => write!(f, "dynamic-filters"),
            BackendCapability::KeywordSearch => write!(f, "keyword-search"),
            BackendCapability::Sorting => write!(f, "sorting"),
            BackendCapability::OffsetPagination => write!(f, "offset-pagination"),
        }
    }
}

/// Database driver lifecycle.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable backend name.
    fn name(&self) -> &'static str;

    /// Returns the capabilities this backend supports.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Returns `true` if the backend supports the capability.
    fn supports(&self, capability: BackendCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Checks that the backend can serve requests.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Creates or migrates the schema.
    async fn initialize(&self) -> Result<(), BackendError>;
}
