//! Error types for the document lifecycle core.
//!
//! This module defines all error types used throughout the crate, following a
//! hierarchy that separates resource state errors, reference errors, validation
//! errors, tenant errors, transaction errors, and backend errors.
//!
//! Every business failure carries a stable [`ErrorCode`] that callers can match
//! on without parsing messages. Storage-layer failures have no code and are
//! propagated as-is.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::tenant::TenantId;
use crate::types::{ContactType, DocumentKind, ItemEligibility};

/// The primary error type for all ledger operations.
///
/// This enum encompasses all possible errors that can occur while running a
/// document lifecycle operation, organized by category.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Referenced entity errors (items, entries)
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Tenant isolation errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Transaction errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to the state of documents, counterparties and tenants.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested document was not found in the tenant.
    #[error("{kind} not found: {id}")]
    DocumentNotFound { kind: DocumentKind, id: i64 },

    /// The document's counterparty does not exist with the expected contact type.
    #[error("{contact_type} not found: {id}")]
    CounterpartyNotFound { contact_type: ContactType, id: i64 },

    /// The document number is already used by another document of the same kind.
    #[error("{kind} number already exists: {number}")]
    DuplicateNumber { kind: DocumentKind, number: String },

    /// A tenant with the given id is already registered.
    #[error("tenant already exists: {tenant_id}")]
    TenantAlreadyExists { tenant_id: TenantId },

    /// The document was already published.
    #[error("{kind} {id} is already published")]
    AlreadyPublished { kind: DocumentKind, id: i64 },
}

/// Errors raised when a document refers to entities that are missing or unusable.
#[derive(Error, Debug)]
pub enum ReferenceError {
    /// One or more referenced items do not exist in the tenant.
    #[error("items not found: {ids:?}")]
    ItemsNotFound { ids: Vec<i64> },

    /// One or more referenced items are not eligible for the document kind.
    #[error("items are not {eligibility} for {kind}: {ids:?}")]
    IneligibleItems {
        kind: DocumentKind,
        eligibility: ItemEligibility,
        ids: Vec<i64>,
    },

    /// Entry ids claimed by an edit do not belong to the document.
    #[error("entries not found on {kind} {document_id}: {ids:?}")]
    EntriesNotFound {
        kind: DocumentKind,
        document_id: i64,
        ids: Vec<i64>,
    },
}

/// Errors related to malformed input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The document payload failed validation.
    #[error("invalid {kind}: {message}")]
    InvalidDocument {
        kind: DocumentKind,
        message: String,
        details: Vec<ValidationDetail>,
    },

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// The list filter references an unknown field or uses an unsupported comparator.
    #[error("invalid filter on '{field}': {message}")]
    InvalidFilter { field: String, message: String },

    /// Pagination parameters are out of range.
    #[error("invalid pagination: {message}")]
    InvalidPagination { message: String },
}

/// Detailed validation error information.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    /// The path to the field with the error (e.g. `entries[1].quantity`).
    pub path: String,
    /// A human-readable error message.
    pub message: String,
    /// The type of validation error.
    pub severity: ValidationSeverity,
}

impl ValidationDetail {
    /// Creates an error-level detail for the given path.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }
}

/// Severity level for validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    /// Fatal error - operation cannot proceed.
    Error,
    /// Warning - operation can proceed but with concerns.
    Warning,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Error => write!(f, "error"),
            ValidationSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// Errors related to tenant isolation.
#[derive(Error, Debug)]
pub enum TenantError {
    /// The tenant is not registered.
    #[error("unknown tenant: {tenant_id}")]
    UnknownTenant { tenant_id: TenantId },

    /// The tenant identifier is malformed.
    #[error("invalid tenant '{tenant_id}': {message}")]
    InvalidTenant { tenant_id: TenantId, message: String },

    /// Operation not permitted for tenant.
    #[error("operation {operation} on {kind} not permitted for tenant {tenant_id}")]
    OperationNotPermitted {
        tenant_id: TenantId,
        operation: String,
        kind: DocumentKind,
    },
}

/// Errors related to transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Transaction was rolled back.
    #[error("transaction rolled back: {reason}")]
    RolledBack { reason: String },

    /// Transaction is no longer valid (already committed or rolled back).
    #[error("transaction no longer valid")]
    InvalidTransaction,
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Coarse classification of an error, independent of the document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The document, counterparty or tenant does not exist.
    NotFound,
    /// A unique natural key is already taken.
    DuplicateKey,
    /// Referenced items or entries do not exist.
    ReferencedEntityNotFound,
    /// Referenced items exist but cannot be used by the document kind.
    IneligibleEntity,
    /// The input failed validation.
    Validation,
    /// The document is in a state that does not allow the operation.
    InvalidState,
    /// The tenant context does not permit the operation.
    Forbidden,
    /// Storage or transaction failure.
    Storage,
}

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SaleEstimateNotFound,
    SaleInvoiceNotFound,
    SaleReceiptNotFound,
    BillNotFound,
    SaleEstimateNumberExistance,
    SaleInvoiceNoExists,
    SaleReceiptNumberNotUnique,
    BillNumberExists,
    SaleEstimateAlreadyDelivered,
    SaleInvoiceAlreadyDelivered,
    SaleReceiptAlreadyClosed,
    BillAlreadyOpen,
    CustomerNotFound,
    VendorNotFound,
    ItemsIdsNotExists,
    NotSellAbleItems,
    NotPurchasableItems,
    EntriesIdsNotFound,
    TenantNotFound,
    TenantAlreadyExists,
    ValidationError,
    OperationNotPermitted,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SaleEstimateNotFound => "SALE_ESTIMATE_NOT_FOUND",
            ErrorCode::SaleInvoiceNotFound => "SALE_INVOICE_NOT_FOUND",
            ErrorCode::SaleReceiptNotFound => "SALE_RECEIPT_NOT_FOUND",
            ErrorCode::BillNotFound => "BILL_NOT_FOUND",
            ErrorCode::SaleEstimateNumberExistance => "SALE_ESTIMATE_NUMBER_EXISTANCE",
            ErrorCode::SaleInvoiceNoExists => "SALE_INVOICE_NO_EXISTS",
            ErrorCode::SaleReceiptNumberNotUnique => "SALE_RECEIPT_NUMBER_NOT_UNIQUE",
            ErrorCode::BillNumberExists => "BILL_NUMBER_EXISTS",
            ErrorCode::SaleEstimateAlreadyDelivered => "SALE_ESTIMATE_ALREADY_DELIVERED",
            ErrorCode::SaleInvoiceAlreadyDelivered => "SALE_INVOICE_ALREADY_DELIVERED",
            ErrorCode::SaleReceiptAlreadyClosed => "SALE_RECEIPT_ALREADY_CLOSED",
            ErrorCode::BillAlreadyOpen => "BILL_ALREADY_OPEN",
            ErrorCode::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            ErrorCode::VendorNotFound => "VENDOR_NOT_FOUND",
            ErrorCode::ItemsIdsNotExists => "ITEMS_IDS_NOT_EXISTS",
            ErrorCode::NotSellAbleItems => "NOT_SELL_ABLE_ITEMS",
            ErrorCode::NotPurchasableItems => "NOT_PURCHASABLE_ITEMS",
            ErrorCode::EntriesIdsNotFound => "ENTRIES_IDS_NOT_FOUND",
            ErrorCode::TenantNotFound => "TENANT_NOT_FOUND",
            ErrorCode::TenantAlreadyExists => "TENANT_ALREADY_EXISTS",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::OperationNotPermitted => "OPERATION_NOT_PERMITTED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LedgerError {
    /// Returns the error taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Resource(err) => match err {
                ResourceError::DocumentNotFound { .. }
                | ResourceError::CounterpartyNotFound { .. } => ErrorKind::NotFound,
                ResourceError::DuplicateNumber { .. }
                | ResourceError::TenantAlreadyExists { .. } => ErrorKind::DuplicateKey,
                ResourceError::AlreadyPublished { .. } => ErrorKind::InvalidState,
            },
            LedgerError::Reference(err) => match err {
                ReferenceError::ItemsNotFound { .. } | ReferenceError::EntriesNotFound { .. } => {
                    ErrorKind::ReferencedEntityNotFound
                }
                ReferenceError::IneligibleItems { .. } => ErrorKind::IneligibleEntity,
            },
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::Tenant(err) => match err {
                TenantError::UnknownTenant { .. } => ErrorKind::NotFound,
                TenantError::InvalidTenant { .. } => ErrorKind::Validation,
                TenantError::OperationNotPermitted { .. } => ErrorKind::Forbidden,
            },
            LedgerError::Transaction(_) | LedgerError::Backend(_) => ErrorKind::Storage,
        }
    }

    /// Returns the stable error code, or `None` for storage-layer failures.
    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            LedgerError::Resource(err) => match err {
                ResourceError::DocumentNotFound { kind, .. } => kind.not_found_code(),
                ResourceError::CounterpartyNotFound { contact_type, .. } => match contact_type {
                    ContactType::Customer => ErrorCode::CustomerNotFound,
                    ContactType::Vendor => ErrorCode::VendorNotFound,
                },
                ResourceError::DuplicateNumber { kind, .. } => kind.number_exists_code(),
                ResourceError::TenantAlreadyExists { .. } => ErrorCode::TenantAlreadyExists,
                ResourceError::AlreadyPublished { kind, .. } => kind.already_published_code(),
            },
            LedgerError::Reference(err) => match err {
                ReferenceError::ItemsNotFound { .. } => ErrorCode::ItemsIdsNotExists,
                ReferenceError::IneligibleItems { eligibility, .. } => match eligibility {
                    ItemEligibility::Sellable => ErrorCode::NotSellAbleItems,
                    ItemEligibility::Purchasable => ErrorCode::NotPurchasableItems,
                },
                ReferenceError::EntriesNotFound { .. } => ErrorCode::EntriesIdsNotFound,
            },
            LedgerError::Validation(_) => ErrorCode::ValidationError,
            LedgerError::Tenant(err) => match err {
                TenantError::UnknownTenant { .. } => ErrorCode::TenantNotFound,
                TenantError::InvalidTenant { .. } => ErrorCode::ValidationError,
                TenantError::OperationNotPermitted { .. } => ErrorCode::OperationNotPermitted,
            },
            LedgerError::Transaction(_) | LedgerError::Backend(_) => return None,
        };
        Some(code)
    }

    /// Returns the offending ids carried by the error, if any.
    pub fn ids(&self) -> &[i64] {
        match self {
            LedgerError::Reference(
                ReferenceError::ItemsNotFound { ids }
                | ReferenceError::IneligibleItems { ids, .. }
                | ReferenceError::EntriesNotFound { ids, .. },
            ) => ids,
            _ => &[],
        }
    }

    /// Returns per-field validation details, if any.
    pub fn details(&self) -> &[ValidationDetail] {
        match self {
            LedgerError::Validation(ValidationError::InvalidDocument { details, .. }) => details,
            _ => &[],
        }
    }

    /// Returns `true` if this error was raised by a pre-write gate.
    ///
    /// Gate failures are deterministic for a given input and are never retried.
    pub fn is_gate_failure(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }

    /// Builds a serializable report of this error.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            kind: self.kind(),
            message: self.to_string(),
            ids: self.ids().to_vec(),
            details: self.details().to_vec(),
        }
    }
}

/// A serializable view of a [`LedgerError`] for outbound responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Stable error code; absent for storage failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Error taxonomy.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Offending ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<i64>,
    /// Per-field validation details.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ValidationDetail>,
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// Implement conversions from common error types

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for LedgerError {
    fn from(_err: r2d2::Error) -> Self {
        LedgerError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_not_found_display_and_code() {
        let err = LedgerError::Resource(ResourceError::DocumentNotFound {
            kind: DocumentKind::SaleEstimate,
            id: 42,
        });
        assert_eq!(err.to_string(), "sale estimate not found: 42");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), Some(ErrorCode::SaleEstimateNotFound));
    }

    #[test]
    fn test_duplicate_number_codes_per_kind() {
        let codes: Vec<&str> = DocumentKind::ALL
            .iter()
            .map(|kind| {
                LedgerError::from(ResourceError::DuplicateNumber {
                    kind: *kind,
                    number: "EST-1".to_string(),
                })
                .code()
                .map(|c| c.as_str())
                .unwrap_or_default()
            })
            .collect();
        assert_eq!(
            codes,
            vec![
                "SALE_ESTIMATE_NUMBER_EXISTANCE",
                "SALE_INVOICE_NO_EXISTS",
                "SALE_RECEIPT_NUMBER_NOT_UNIQUE",
                "BILL_NUMBER_EXISTS",
            ]
        );
    }

    #[test]
    fn test_reference_errors_carry_ids() {
        let err = LedgerError::from(ReferenceError::ItemsNotFound { ids: vec![3, 7] });
        assert_eq!(err.kind(), ErrorKind::ReferencedEntityNotFound);
        assert_eq!(err.code(), Some(ErrorCode::ItemsIdsNotExists));
        assert_eq!(err.ids(), &[3, 7]);

        let err = LedgerError::from(ReferenceError::IneligibleItems {
            kind: DocumentKind::Bill,
            eligibility: ItemEligibility::Purchasable,
            ids: vec![9],
        });
        assert_eq!(err.kind(), ErrorKind::IneligibleEntity);
        assert_eq!(err.code(), Some(ErrorCode::NotPurchasableItems));
    }

    #[test]
    fn test_storage_errors_have_no_code() {
        let err = LedgerError::from(TransactionError::InvalidTransaction);
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.code(), None);
        assert!(!err.is_gate_failure());
    }

    #[test]
    fn test_error_code_serializes_as_wire_string() {
        let json = serde_json::to_string(&ErrorCode::SaleEstimateNumberExistance).unwrap();
        assert_eq!(json, "\"SALE_ESTIMATE_NUMBER_EXISTANCE\"");
        let json = serde_json::to_string(&ErrorCode::NotSellAbleItems).unwrap();
        assert_eq!(json, "\"NOT_SELL_ABLE_ITEMS\"");
    }

    #[test]
    fn test_report_includes_details() {
        let err = LedgerError::from(ValidationError::InvalidDocument {
            kind: DocumentKind::SaleInvoice,
            message: "1 field failed validation".to_string(),
            details: vec![ValidationDetail::error("entries", "at least one entry is required")],
        });
        let report = err.report();
        assert_eq!(report.code, Some(ErrorCode::ValidationError));
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].path, "entries");
        assert_eq!(report.details[0].severity.to_string(), "error");
    }

    #[test]
    fn test_tenant_error_codes() {
        let err = LedgerError::from(TenantError::UnknownTenant {
            tenant_id: TenantId::new("ghost"),
        });
        assert_eq!(err.code(), Some(ErrorCode::TenantNotFound));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
