//! Command-line configuration.
//!
//! Every option can also be set through the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TALLY_DATABASE_URL` | tally.db | SQLite file, or `:memory:` |
//! | `TALLY_CONFIG` | | JSON file with a full ledger configuration |
//! | `TALLY_LOG_LEVEL` | info | Log level |
//! | `TALLY_TENANT` | | Tenant for catalog and document commands |
//! | `TALLY_READ_ONLY` | false | Act with read-only permissions |
//! | `TALLY_DEFAULT_PAGE_SIZE` | 20 | List page size when none is given |
//! | `TALLY_MAX_PAGE_SIZE` | 1000 | Largest list page size |

use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use clap::Args;
use tally_persistence::config::{LedgerConfig, ListingConfig};
use tally_persistence::tenant::{TenantContext, TenantId, TenantPermissions};

/// Global options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct CliConfig {
    /// Database location.
    #[arg(long, env = "TALLY_DATABASE_URL", default_value = "tally.db", global = true)]
    pub database_url: String,

    /// Ledger configuration file (JSON).
    #[arg(long, env = "TALLY_CONFIG", global = true)]
    pub config: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TALLY_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Tenant to act on.
    #[arg(long, env = "TALLY_TENANT", global = true)]
    pub tenant: Option<String>,

    /// Act with read-only permissions.
    #[arg(long, env = "TALLY_READ_ONLY", default_value = "false", global = true)]
    pub read_only: bool,

    /// Default list page size; overrides the configuration file.
    #[arg(long, env = "TALLY_DEFAULT_PAGE_SIZE", global = true)]
    pub default_page_size: Option<u32>,

    /// Maximum list page size; overrides the configuration file.
    #[arg(long, env = "TALLY_MAX_PAGE_SIZE", global = true)]
    pub max_page_size: Option<u32>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_url: "tally.db".to_string(),
            config: None,
            log_level: "info".to_string(),
            tenant: None,
            read_only: false,
            default_page_size: None,
            max_page_size: None,
        }
    }
}

impl CliConfig {
    /// Loads the ledger configuration and applies command-line overrides.
    pub fn ledger_config(&self) -> anyhow::Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("Failed to open config {}", path))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("Failed to parse config {}", path))?
            }
            None => LedgerConfig::default(),
        };

        config.listing = self.listing(config.listing);
        Ok(config)
    }

    fn listing(&self, base: ListingConfig) -> ListingConfig {
        ListingConfig {
            default_page_size: self.default_page_size.unwrap_or(base.default_page_size),
            max_page_size: self.max_page_size.unwrap_or(base.max_page_size),
        }
    }

    /// Builds the tenant context for the configured tenant.
    pub fn tenant_context(&self) -> anyhow::Result<TenantContext> {
        let tenant = self
            .tenant
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .context("A tenant is required; pass --tenant or set TALLY_TENANT")?;

        let permissions = if self.read_only {
            TenantPermissions::read_only()
        } else {
            TenantPermissions::full_access()
        };

        Ok(TenantContext::new(TenantId::new(tenant), permissions))
    }

    /// Validates the options and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if self.default_page_size == Some(0) {
            errors.push("Default page size cannot be 0".to_string());
        }

        if let (Some(default), Some(max)) = (self.default_page_size, self.max_page_size) {
            if default > max {
                errors.push("Default page size cannot exceed max page size".to_string());
            }
        }

        if let Some(tenant) = &self.tenant {
            if let Err(e) = TenantId::new(tenant.as_str()).validate() {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            log_level: "debug".to_string(),
            tenant: Some("test-tenant".to_string()),
            default_page_size: Some(10),
            max_page_size: Some(100),
            ..Default::default()
        }
    }
}
