//! Inbound request payloads.
//!
//! DTOs are deliberately loose: every field is optional at the serde level so
//! that a missing value surfaces as a [`ValidationError`](crate::error::ValidationError)
//! with a field path instead of a deserialization failure. Kind-specific field
//! names (`estimate_number`, `customer_id`, `expiration_date`, ...) are accepted
//! as aliases of the generic names. Client-supplied entry `amount`/`total`
//! values are ignored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Create/edit payload for any document kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDto {
    /// Natural key of the document.
    #[serde(
        default,
        alias = "estimate_number",
        alias = "invoice_no",
        alias = "receipt_number",
        alias = "bill_number"
    )]
    pub number: Option<String>,

    /// Document date, `YYYY-MM-DD` or an ISO 8601 timestamp.
    #[serde(
        default,
        alias = "estimate_date",
        alias = "invoice_date",
        alias = "receipt_date",
        alias = "bill_date"
    )]
    pub date: Option<String>,

    /// Expiration or due date.
    #[serde(default, alias = "expiration_date")]
    pub due_date: Option<String>,

    /// Customer or vendor id.
    #[serde(default, alias = "customer_id", alias = "vendor_id")]
    pub counterparty_id: Option<i64>,

    /// Free-text reference.
    #[serde(default, alias = "reference_no")]
    pub reference: Option<String>,

    /// Free-text note.
    #[serde(default, alias = "terms_conditions")]
    pub note: Option<String>,

    /// Publish the document on write.
    #[serde(default, alias = "delivered", alias = "open", alias = "closed")]
    pub publish: bool,

    /// Line items.
    #[serde(default)]
    pub entries: Vec<EntryDto>,
}

impl DocumentDto {
    /// Creates a payload with the required fields set.
    pub fn new(date: impl Into<String>, counterparty_id: i64, entries: Vec<EntryDto>) -> Self {
        Self {
            date: Some(date.into()),
            counterparty_id: Some(counterparty_id),
            entries,
            ..Default::default()
        }
    }

    /// Sets the document number.
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Sets the expiration or due date.
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Sets the reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Requests publication on write.
    pub fn published(mut self) -> Self {
        self.publish = true;
        self
    }
}

/// A line item in a create/edit payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryDto {
    /// Existing entry id (edit only). Entries without an id are inserted.
    #[serde(default)]
    pub id: Option<i64>,

    /// Referenced item.
    #[serde(default)]
    pub item_id: Option<i64>,

    /// Quantity.
    #[serde(default)]
    pub quantity: Option<Decimal>,

    /// Unit rate.
    #[serde(default)]
    pub rate: Option<Decimal>,

    /// Percentage discount, defaults to zero.
    #[serde(default)]
    pub discount: Option<Decimal>,

    /// Description override.
    #[serde(default)]
    pub description: Option<String>,
}

impl EntryDto {
    /// Creates a new entry for the given item.
    pub fn new(item_id: i64, quantity: Decimal, rate: Decimal) -> Self {
        Self {
            item_id: Some(item_id),
            quantity: Some(quantity),
            rate: Some(rate),
            ..Default::default()
        }
    }

    /// Targets an existing entry.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the percentage discount.
    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = Some(discount);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
