//! Library configuration.
//!
//! Configuration is plain serde data with per-field defaults, so a partial
//! JSON document (or none at all) yields a usable [`LedgerConfig`].

use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlite")]
use crate::backends::sqlite::SqliteBackendConfig;

/// Top-level configuration for the ledger core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// SQLite connection pool settings.
    #[cfg(feature = "sqlite")]
    #[serde(default)]
    pub storage: SqliteBackendConfig,

    /// List pagination settings.
    #[serde(default)]
    pub listing: ListingConfig,
}

impl LedgerConfig {
    /// Checks the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        #[cfg(feature = "sqlite")]
        if let Err(storage_errors) = self.storage.validate() {
            errors.extend(storage_errors);
        }
        if let Err(listing_errors) = self.listing.validate() {
            errors.extend(listing_errors);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Pagination limits applied by list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page size used when a request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page size a request may ask for; larger values are clamped.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    1000
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl ListingConfig {
    /// Checks the limits, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.default_page_size == 0 {
            errors.push("default_page_size must be at least 1".to_string());
        }
        if self.max_page_size == 0 {
            errors.push("max_page_size must be at least 1".to_string());
        }
        if self.default_page_size > self.max_page_size {
            errors.push(format!(
                "default_page_size ({}) must not exceed max_page_size ({})",
                self.default_page_size, self.max_page_size
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        assert_eq!(config.listing.default_page_size, 20);
        assert_eq!(config.listing.max_page_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"listing": {"max_page_size": 50}}"#).unwrap();
        assert_eq!(config.listing.default_page_size, 20);
        assert_eq!(config.listing.max_page_size, 50);
    }

    #[test]
    fn test_listing_errors() {
        let listing = ListingConfig {
            default_page_size: 100,
            max_page_size: 10,
        };
        let errors = listing.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must not exceed"));
    }
}
