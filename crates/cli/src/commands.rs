//! Command definitions and dispatch.
//!
//! Every command prints a JSON value on success. Payload files are JSON too;
//! `-` reads from standard input.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::sync::Arc;

use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use tally_persistence::backends::sqlite::{SCHEMA_VERSION, SqliteBackend};
use tally_persistence::config::LedgerConfig;
use tally_persistence::core::{Backend, CatalogStorage, TenantStorage};
use tally_persistence::events::{LoggingSubscriber, SubscriberRegistry};
use tally_persistence::service::LedgerServices;
use tally_persistence::tenant::{RegisteredTenantResolver, TenantContext, TenantId, TenantResolver};
use tally_persistence::types::{
    DocumentDto, DocumentKind, ListFilter, NewContact, NewItem, SortOrder,
};

use crate::config::CliConfig;

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database schema.
    Init,
    /// Check that the database is reachable.
    Health,
    /// Manage tenants.
    #[command(subcommand)]
    Tenant(TenantCommand),
    /// Manage items.
    #[command(subcommand)]
    Item(ItemCommand),
    /// Manage customers and vendors.
    #[command(subcommand)]
    Contact(ContactCommand),
    /// Run a lifecycle operation on a document kind.
    Document {
        /// Document kind (estimate, invoice, receipt, bill).
        #[arg(value_parser = parse_kind)]
        kind: DocumentKind,
        #[command(subcommand)]
        action: DocumentCommand,
    },
}

/// Tenant registry commands.
#[derive(Debug, Subcommand)]
pub enum TenantCommand {
    /// Register a tenant.
    Add {
        /// Tenant id.
        id: String,
        /// Display name.
        name: String,
    },
    /// List registered tenants.
    List,
}

/// Item commands.
#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// Create an item in the current tenant.
    Add {
        /// Item name.
        name: String,
        /// The item cannot be sold.
        #[arg(long)]
        not_sellable: bool,
        /// The item cannot be purchased.
        #[arg(long)]
        not_purchasable: bool,
        /// Default sell price.
        #[arg(long)]
        sell_price: Option<Decimal>,
        /// Default cost price.
        #[arg(long)]
        cost_price: Option<Decimal>,
    },
}

/// Contact types accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ContactArg {
    /// A customer.
    Customer,
    /// A vendor.
    Vendor,
}

/// Contact commands.
#[derive(Debug, Subcommand)]
pub enum ContactCommand {
    /// Create a contact in the current tenant.
    Add {
        /// Customer or vendor.
        #[arg(value_enum)]
        contact_type: ContactArg,
        /// Display name.
        name: String,
        /// Email address.
        #[arg(long)]
        email: Option<String>,
    },
}

/// Document lifecycle commands.
#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Create a document from a JSON payload.
    Create {
        /// Payload file, or `-` for stdin.
        file: String,
    },
    /// Replace a document from a JSON payload.
    Edit {
        /// Document id.
        id: i64,
        /// Payload file, or `-` for stdin.
        file: String,
    },
    /// Delete a document.
    Delete {
        /// Document id.
        id: i64,
    },
    /// Show a document.
    Get {
        /// Document id.
        id: i64,
    },
    /// Publish a draft document.
    Publish {
        /// Document id.
        id: i64,
    },
    /// List documents.
    List {
        /// JSON list filter file; the flags below override its fields.
        #[arg(long)]
        filter: Option<String>,
        /// 1-based page number.
        #[arg(long)]
        page: Option<u32>,
        /// Rows per page.
        #[arg(long)]
        page_size: Option<u32>,
        /// Sort field.
        #[arg(long)]
        sort: Option<String>,
        /// Sort direction (asc, desc).
        #[arg(long, value_parser = parse_order)]
        order: Option<SortOrder>,
        /// Keyword matched against number, reference and note.
        #[arg(long)]
        keyword: Option<String>,
    },
}

fn parse_kind(s: &str) -> Result<DocumentKind, String> {
    s.parse()
}

fn parse_order(s: &str) -> Result<SortOrder, String> {
    s.parse()
}

/// Opens the configured database.
pub fn open_backend(config: &CliConfig, ledger: &LedgerConfig) -> anyhow::Result<SqliteBackend> {
    info!(database = %config.database_url, "Opening SQLite backend");
    let backend = SqliteBackend::with_config(&config.database_url, ledger.storage.clone())?;
    backend.init_schema()?;
    Ok(backend)
}

/// Runs a command and returns its JSON output.
pub async fn run(
    command: Command,
    config: &CliConfig,
    ledger: &LedgerConfig,
    backend: Arc<SqliteBackend>,
) -> anyhow::Result<Value> {
    match command {
        Command::Init => Ok(json!({ "schema_version": SCHEMA_VERSION })),
        Command::Health => {
            backend.health_check().await?;
            Ok(json!({ "backend": backend.name(), "status": "ok" }))
        }
        Command::Tenant(TenantCommand::Add { id, name }) => {
            let record = backend.register_tenant(&TenantId::new(id), &name).await?;
            Ok(serde_json::to_value(record)?)
        }
        Command::Tenant(TenantCommand::List) => {
            Ok(serde_json::to_value(backend.list_tenants().await?)?)
        }
        Command::Item(ItemCommand::Add {
            name,
            not_sellable,
            not_purchasable,
            sell_price,
            cost_price,
        }) => {
            let tenant = with_correlation(config.tenant_context()?);
            let resolver = RegisteredTenantResolver::new(backend);
            let scope = resolver.resolve(&tenant).await?;
            let item = NewItem {
                sell_price,
                cost_price,
                ..NewItem::new(name)
                    .sellable(!not_sellable)
                    .purchasable(!not_purchasable)
            };
            let created = scope.store().create_item(scope.context(), &item).await?;
            Ok(serde_json::to_value(created)?)
        }
        Command::Contact(ContactCommand::Add {
            contact_type,
            name,
            email,
        }) => {
            let tenant = with_correlation(config.tenant_context()?);
            let resolver = RegisteredTenantResolver::new(backend);
            let scope = resolver.resolve(&tenant).await?;
            let mut contact = match contact_type {
                ContactArg::Customer => NewContact::customer(name),
                ContactArg::Vendor => NewContact::vendor(name),
            };
            contact.email = email;
            let created = scope
                .store()
                .create_contact(scope.context(), &contact)
                .await?;
            Ok(serde_json::to_value(created)?)
        }
        Command::Document { kind, action } => {
            let tenant = with_correlation(config.tenant_context()?);
            let registry = Arc::new(SubscriberRegistry::new());
            registry.subscribe(Arc::new(LoggingSubscriber));
            let services = LedgerServices::new(
                Arc::new(RegisteredTenantResolver::new(backend)),
                registry,
                &ledger.listing,
            );
            run_document(services.for_kind(kind), &tenant, action).await
        }
    }
}

async fn run_document<R: TenantResolver>(
    service: &tally_persistence::service::DocumentService<R>,
    tenant: &TenantContext,
    action: DocumentCommand,
) -> anyhow::Result<Value> {
    let document = match action {
        DocumentCommand::Create { file } => {
            let dto: DocumentDto = read_json(&file)?;
            service.create(tenant, &dto).await?
        }
        DocumentCommand::Edit { id, file } => {
            let dto: DocumentDto = read_json(&file)?;
            service.edit(tenant, id, &dto).await?
        }
        DocumentCommand::Delete { id } => service.delete(tenant, id).await?,
        DocumentCommand::Get { id } => service.get(tenant, id).await?,
        DocumentCommand::Publish { id } => service.publish(tenant, id).await?,
        DocumentCommand::List {
            filter,
            page,
            page_size,
            sort,
            order,
            keyword,
        } => {
            let mut list_filter = match filter {
                Some(path) => read_json::<ListFilter>(&path)?,
                None => ListFilter::default(),
            };
            if let Some(page) = page {
                list_filter.page = page;
            }
            if page_size.is_some() {
                list_filter.page_size = page_size;
            }
            if sort.is_some() {
                list_filter.column_sort_by = sort;
            }
            if order.is_some() {
                list_filter.sort_order = order;
            }
            if keyword.is_some() {
                list_filter.search_keyword = keyword;
            }

            let list = service.list(tenant, &list_filter).await?;
            return Ok(serde_json::to_value(list)?);
        }
    };

    Ok(serde_json::to_value(document)?)
}

fn with_correlation(tenant: TenantContext) -> TenantContext {
    tenant.with_correlation_id(uuid::Uuid::new_v4().to_string())
}

fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        return serde_json::from_str(&buf).context("Failed to parse payload from stdin");
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse {}", path))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;
    use crate::Cli;

    async fn memory_backend() -> Arc<SqliteBackend> {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        backend
            .register_tenant(&TenantId::new("test-tenant"), "Test")
            .await
            .unwrap();
        Arc::new(backend)
    }

    #[test]
    fn test_parse_document_command() {
        let cli = Cli::try_parse_from([
            "tally",
            "--tenant",
            "acme",
            "document",
            "invoice",
            "list",
            "--page",
            "2",
            "--order",
            "asc",
        ])
        .unwrap();

        match cli.command {
            Command::Document {
                kind,
                action: DocumentCommand::List { page, order, .. },
            } => {
                assert_eq!(kind, DocumentKind::SaleInvoice);
                assert_eq!(page, Some(2));
                assert_eq!(order, Some(SortOrder::Asc));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config.tenant.as_deref(), Some("acme"));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["tally", "document", "payment", "get", "1"]).is_err());
    }

    #[tokio::test]
    async fn test_document_round_trip() {
        let config = CliConfig::for_testing();
        let ledger = config.ledger_config().unwrap();
        let backend = memory_backend().await;

        let item = run(
            Command::Item(ItemCommand::Add {
                name: "Widget".to_string(),
                not_sellable: false,
                not_purchasable: true,
                sell_price: None,
                cost_price: None,
            }),
            &config,
            &ledger,
            Arc::clone(&backend),
        )
        .await
        .unwrap();
        let customer = run(
            Command::Contact(ContactCommand::Add {
                contact_type: ContactArg::Customer,
                name: "Jane".to_string(),
                email: None,
            }),
            &config,
            &ledger,
            Arc::clone(&backend),
        )
        .await
        .unwrap();

        let mut payload = tempfile::NamedTempFile::new().unwrap();
        write!(
            payload,
            "{}",
            json!({
                "invoice_no": "INV-1",
                "invoice_date": "2024-05-01",
                "customer_id": customer["id"],
                "entries": [{ "item_id": item["id"], "quantity": "2", "rate": "7.5" }]
            })
        )
        .unwrap();

        let created = run(
            Command::Document {
                kind: DocumentKind::SaleInvoice,
                action: DocumentCommand::Create {
                    file: payload.path().to_string_lossy().into_owned(),
                },
            },
            &config,
            &ledger,
            Arc::clone(&backend),
        )
        .await
        .unwrap();
        assert_eq!(created["number"], "INV-1");

        let listed = run(
            Command::Document {
                kind: DocumentKind::SaleInvoice,
                action: DocumentCommand::List {
                    filter: None,
                    page: None,
                    page_size: None,
                    sort: None,
                    order: None,
                    keyword: Some("inv".to_string()),
                },
            },
            &config,
            &ledger,
            backend,
        )
        .await
        .unwrap();
        assert_eq!(listed["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn test_missing_tenant_is_reported() {
        let config = CliConfig {
            tenant: None,
            ..CliConfig::for_testing()
        };
        let ledger = config.ledger_config().unwrap();
        let err = run(
            Command::Document {
                kind: DocumentKind::Bill,
                action: DocumentCommand::Get { id: 1 },
            },
            &config,
            &ledger,
            memory_backend().await,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("tenant"));
    }
}
