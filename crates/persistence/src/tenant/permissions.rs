//! Tenant permission types.
//!
//! This module defines the permission model for tenant operations, controlling
//! what actions a tenant context is allowed to perform on which document kinds.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DocumentKind;

/// Operations that can be performed on documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create new documents.
    Create,
    /// Read a single document.
    Read,
    /// Edit existing documents.
    Update,
    /// Delete documents.
    Delete,
    /// List and filter documents.
    Search,
    /// Publish (deliver, open) draft documents.
    Publish,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Search => write!(f, "search"),
            Operation::Publish => write!(f, "publish"),
        }
    }
}

/// Permissions granted to a tenant context.
///
/// `TenantPermissions` controls what operations a caller can perform and on
/// which document kinds.
///
/// # Examples
///
/// ```
/// use tally_persistence::tenant::{TenantPermissions, Operation};
/// use tally_persistence::types::DocumentKind;
///
/// let full = TenantPermissions::full_access();
/// assert!(full.can_perform(Operation::Create, DocumentKind::Bill));
///
/// let read_only = TenantPermissions::read_only();
/// assert!(read_only.can_perform(Operation::Search, DocumentKind::Bill));
/// assert!(!read_only.can_perform(Operation::Delete, DocumentKind::Bill));
///
/// let sales_clerk = TenantPermissions::builder()
///     .allow_operations(vec![Operation::Create, Operation::Read])
///     .allow_document_kinds(vec![DocumentKind::SaleEstimate])
///     .build();
/// assert!(!sales_clerk.can_perform(Operation::Create, DocumentKind::Bill));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantPermissions {
    /// Allowed operations. If None, all operations are allowed.
    allowed_operations: Option<HashSet<Operation>>,

    /// Allowed document kinds. If None, all kinds are allowed.
    allowed_document_kinds: Option<HashSet<DocumentKind>>,
}

impl TenantPermissions {
    /// Creates permissions with full access to all operations and document kinds.
    pub fn full_access() -> Self {
        Self {
            allowed_operations: None,
            allowed_document_kinds: None,
        }
    }

    /// Creates read-only permissions (read and search only).
    pub fn read_only() -> Self {
        let mut ops = HashSet::new();
        ops.insert(Operation::Read);
        ops.insert(Operation::Search);

        Self {
            allowed_operations: Some(ops),
            allowed_document_kinds: None,
        }
    }

    /// Creates a builder for custom permissions.
    pub fn builder() -> TenantPermissionsBuilder {
        TenantPermissionsBuilder::default()
    }

    /// Returns `true` if the given operation is permitted on the given document kind.
    pub fn can_perform(&self, operation: Operation, kind: DocumentKind) -> bool {
        if let Some(ref allowed_ops) = self.allowed_operations {
            if !allowed_ops.contains(&operation) {
                return false;
            }
        }

        if let Some(ref allowed_kinds) = self.allowed_document_kinds {
            if !allowed_kinds.contains(&kind) {
                return false;
            }
        }

        true
    }

    /// Returns the set of allowed operations, or None if all are allowed.
    pub fn allowed_operations(&self) -> Option<&HashSet<Operation>> {
        self.allowed_operations.as_ref()
    }

    /// Returns the set of allowed document kinds, or None if all are allowed.
    pub fn allowed_document_kinds(&self) -> Option<&HashSet<DocumentKind>> {
        self.allowed_document_kinds.as_ref()
    }
}

impl Default for TenantPermissions {
    fn default() -> Self {
        Self::full_access()
    }
}

/// Builder for creating custom tenant permissions.
#[derive(Default)]
pub struct TenantPermissionsBuilder {
    allowed_operations: Option<HashSet<Operation>>,
    allowed_document_kinds: Option<HashSet<DocumentKind>>,
}

impl TenantPermissionsBuilder {
    /// Restricts the permissions to the given operations.
    pub fn allow_operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.allowed_operations = Some(ops.into_iter().collect());
        self
    }

    /// Restricts the permissions to the given document kinds.
    pub fn allow_document_kinds(mut self, kinds: impl IntoIterator<Item = DocumentKind>) -> Self {
        self.allowed_document_kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Builds the permissions.
    pub fn build(self) -> TenantPermissions {
        TenantPermissions {
            allowed_operations: self.allowed_operations,
            allowed_document_kinds: self.allowed_document_kinds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_access() {
        let perms = TenantPermissions::full_access();
        for kind in DocumentKind::ALL {
            assert!(perms.can_perform(Operation::Create, kind));
            assert!(perms.can_perform(Operation::Publish, kind));
        }
    }

    #[test]
    fn test_read_only() {
        let perms = TenantPermissions::read_only();
        assert!(perms.can_perform(Operation::Read, DocumentKind::SaleInvoice));
        assert!(perms.can_perform(Operation::Search, DocumentKind::SaleInvoice));
        assert!(!perms.can_perform(Operation::Create, DocumentKind::SaleInvoice));
        assert!(!perms.can_perform(Operation::Update, DocumentKind::SaleInvoice));
        assert!(!perms.can_perform(Operation::Publish, DocumentKind::SaleInvoice));
    }

    #[test]
    fn test_builder_limits_kinds() {
        let perms = TenantPermissions::builder()
            .allow_document_kinds(vec![DocumentKind::Bill])
            .build();
        assert!(perms.can_perform(Operation::Delete, DocumentKind::Bill));
        assert!(!perms.can_perform(Operation::Read, DocumentKind::SaleEstimate));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Publish.to_string(), "publish");
        assert_eq!(Operation::Update.to_string(), "update");
    }
}
