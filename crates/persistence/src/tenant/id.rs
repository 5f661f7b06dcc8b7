//! Tenant identifier type.
//!
//! This module defines the [`TenantId`] type, an opaque identifier for the
//! organization that owns a partition of ledger data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TenantError;

/// Maximum length of a tenant identifier.
pub const MAX_TENANT_ID_LEN: usize = 64;

/// An opaque tenant identifier.
///
/// Every document, entry, item and contact row is stamped with the tenant id
/// of the organization that owns it.
///
/// # Examples
///
/// ```
/// use tally_persistence::tenant::TenantId;
///
/// let tenant = TenantId::new("acme");
/// assert_eq!(tenant.as_str(), "acme");
/// assert!(tenant.validate().is_ok());
/// assert!(TenantId::new("  ").validate().is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant ID from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the identifier is usable as a partition key.
    ///
    /// Identifiers must be non-blank, at most [`MAX_TENANT_ID_LEN`] bytes, and
    /// consist of ASCII alphanumerics, `-`, `_` or `.`.
    pub fn validate(&self) -> Result<(), TenantError> {
        let message = if self.0.trim().is_empty() {
            Some("tenant id must not be blank".to_string())
        } else if self.0.len() > MAX_TENANT_ID_LEN {
            Some(format!(
                "tenant id must be at most {} characters",
                MAX_TENANT_ID_LEN
            ))
        } else if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            Some("tenant id may only contain letters, digits, '-', '_' or '.'".to_string())
        } else {
            None
        };

        match message {
            Some(message) => Err(TenantError::InvalidTenant {
                tenant_id: self.clone(),
                message,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_creation() {
        let id = TenantId::new("test-tenant");
        assert_eq!(id.as_str(), "test-tenant");
        assert_eq!(id.to_string(), "test-tenant");
    }

    #[test]
    fn test_tenant_id_validation() {
        assert!(TenantId::new("acme_corp.eu-1").validate().is_ok());
        assert!(TenantId::new("").validate().is_err());
        assert!(TenantId::new("acme corp").validate().is_err());
        assert!(TenantId::new("a".repeat(MAX_TENANT_ID_LEN + 1)).validate().is_err());
    }

    #[test]
    fn test_tenant_id_serde_transparent() {
        let id = TenantId::new("acme");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme\"");
        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_tenant_id_debug() {
        assert_eq!(format!("{:?}", TenantId::new("acme")), "TenantId(acme)");
    }
}
