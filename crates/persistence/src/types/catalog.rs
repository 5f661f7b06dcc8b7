//! Catalog types: items, contacts and tenants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// A registered tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Tenant identifier.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// A product or service that entries reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item id.
    pub id: i64,
    /// Item name.
    pub name: String,
    /// Whether the item may appear on sales documents.
    pub sellable: bool,
    /// Whether the item may appear on bills.
    pub purchasable: bool,
    /// Default sell price.
    pub sell_price: Option<Decimal>,
    /// Default cost price.
    pub cost_price: Option<Decimal>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    /// Item name.
    pub name: String,
    /// Whether the item may appear on sales documents.
    #[serde(default = "default_true")]
    pub sellable: bool,
    /// Whether the item may appear on bills.
    #[serde(default = "default_true")]
    pub purchasable: bool,
    /// Default sell price.
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    /// Default cost price.
    #[serde(default)]
    pub cost_price: Option<Decimal>,
}

fn default_true() -> bool {
    true
}

impl NewItem {
    /// Creates a sellable and purchasable item with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sellable: true,
            purchasable: true,
            sell_price: None,
            cost_price: None,
        }
    }

    /// Sets whether the item is sellable.
    pub fn sellable(mut self, sellable: bool) -> Self {
        self.sellable = sellable;
        self
    }

    /// Sets whether the item is purchasable.
    pub fn purchasable(mut self, purchasable: bool) -> Self {
        self.purchasable = purchasable;
        self
    }
}

/// The rule an item must satisfy to be used on a document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemEligibility {
    /// Usable on sales documents.
    Sellable,
    /// Usable on purchase documents.
    Purchasable,
}

impl ItemEligibility {
    /// Returns `true` if the item satisfies the rule.
    pub fn permits(&self, item: &Item) -> bool {
        match self {
            ItemEligibility::Sellable => item.sellable,
            ItemEligibility::Purchasable => item.purchasable,
        }
    }
}

impl fmt::Display for ItemEligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemEligibility::Sellable => write!(f, "sellable"),
            ItemEligibility::Purchasable => write!(f, "purchasable"),
        }
    }
}

/// Role of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    /// Receives sales documents.
    Customer,
    /// Issues bills.
    Vendor,
}

impl ContactType {
    /// Returns the storage identifier of the contact type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Customer => "customer",
            ContactType::Vendor => "vendor",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(ContactType::Customer),
            "vendor" => Ok(ContactType::Vendor),
            other => Err(format!("unknown contact type: {}", other)),
        }
    }
}

/// A customer or vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact id.
    pub id: i64,
    /// Customer or vendor.
    pub contact_type: ContactType,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    /// Customer or vendor.
    pub contact_type: ContactType,
    /// Display name.
    pub display_name: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl NewContact {
    /// Creates a customer contact.
    pub fn customer(display_name: impl Into<String>) -> Self {
        Self {
            contact_type: ContactType::Customer,
            display_name: display_name.into(),
            email: None,
        }
    }

    /// Creates a vendor contact.
    pub fn vendor(display_name: impl Into<String>) -> Self {
        Self {
            contact_type: ContactType::Vendor,
            display_name: display_name.into(),
            email: None,
        }
    }
}
