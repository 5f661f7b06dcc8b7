//! Document and entry types.
//!
//! A [`Document`] is a parent record (estimate, invoice, receipt, bill) that
//! owns an ordered list of line-item [`Entry`] rows. Entries point back to
//! their parent through an [`EntryReference`] rather than a foreign key.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{Contact, ContactType, ItemEligibility};
use crate::error::ErrorCode;

/// The kinds of line-item documents managed by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A quote sent to a customer.
    SaleEstimate,
    /// An invoice issued to a customer.
    SaleInvoice,
    /// A receipt for an immediate sale.
    SaleReceipt,
    /// A bill received from a vendor.
    Bill,
}

impl DocumentKind {
    /// All document kinds, in declaration order.
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::SaleEstimate,
        DocumentKind::SaleInvoice,
        DocumentKind::SaleReceipt,
        DocumentKind::Bill,
    ];

    /// Returns the storage identifier of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::SaleEstimate => "sale_estimate",
            DocumentKind::SaleInvoice => "sale_invoice",
            DocumentKind::SaleReceipt => "sale_receipt",
            DocumentKind::Bill => "bill",
        }
    }

    /// Returns the `reference_type` stamped on this kind's entries.
    pub fn reference_type(&self) -> &'static str {
        match self {
            DocumentKind::SaleEstimate => "SaleEstimate",
            DocumentKind::SaleInvoice => "SaleInvoice",
            DocumentKind::SaleReceipt => "SaleReceipt",
            DocumentKind::Bill => "Bill",
        }
    }

    /// Returns the contact type the document is issued to.
    pub fn counterparty_type(&self) -> ContactType {
        match self {
            DocumentKind::Bill => ContactType::Vendor,
            _ => ContactType::Customer,
        }
    }

    /// Returns the rule an item must satisfy to appear on this kind.
    pub fn item_eligibility(&self) -> ItemEligibility {
        match self {
            DocumentKind::Bill => ItemEligibility::Purchasable,
            _ => ItemEligibility::Sellable,
        }
    }

    /// Returns the kind-specific name of the document number field.
    pub fn number_field(&self) -> &'static str {
        match self {
            DocumentKind::SaleEstimate => "estimate_number",
            DocumentKind::SaleInvoice => "invoice_no",
            DocumentKind::SaleReceipt => "receipt_number",
            DocumentKind::Bill => "bill_number",
        }
    }

    /// Returns the kind-specific name of the document date field.
    pub fn date_field(&self) -> &'static str {
        match self {
            DocumentKind::SaleEstimate => "estimate_date",
            DocumentKind::SaleInvoice => "invoice_date",
            DocumentKind::SaleReceipt => "receipt_date",
            DocumentKind::Bill => "bill_date",
        }
    }

    /// Returns the kind-specific name of the secondary date, if the kind has one.
    pub fn due_date_field(&self) -> Option<&'static str> {
        match self {
            DocumentKind::SaleEstimate => Some("expiration_date"),
            DocumentKind::SaleInvoice | DocumentKind::Bill => Some("due_date"),
            DocumentKind::SaleReceipt => None,
        }
    }

    /// Returns the namespace used for lifecycle event topics.
    pub fn event_namespace(&self) -> &'static str {
        match self {
            DocumentKind::SaleEstimate => "saleEstimate",
            DocumentKind::SaleInvoice => "saleInvoice",
            DocumentKind::SaleReceipt => "saleReceipt",
            DocumentKind::Bill => "bill",
        }
    }

    /// Returns the code raised when a document of this kind is missing.
    pub fn not_found_code(&self) -> ErrorCode {
        match self {
            DocumentKind::SaleEstimate => ErrorCode::SaleEstimateNotFound,
            DocumentKind::SaleInvoice => ErrorCode::SaleInvoiceNotFound,
            DocumentKind::SaleReceipt => ErrorCode::SaleReceiptNotFound,
            DocumentKind::Bill => ErrorCode::BillNotFound,
        }
    }

    /// Returns the code raised when a document number is already taken.
    pub fn number_exists_code(&self) -> ErrorCode {
        match self {
            DocumentKind::SaleEstimate => ErrorCode::SaleEstimateNumberExistance,
            DocumentKind::SaleInvoice => ErrorCode::SaleInvoiceNoExists,
            DocumentKind::SaleReceipt => ErrorCode::SaleReceiptNumberNotUnique,
            DocumentKind::Bill => ErrorCode::BillNumberExists,
        }
    }

    /// Returns the code raised when publishing an already published document.
    pub fn already_published_code(&self) -> ErrorCode {
        match self {
            DocumentKind::SaleEstimate => ErrorCode::SaleEstimateAlreadyDelivered,
            DocumentKind::SaleInvoice => ErrorCode::SaleInvoiceAlreadyDelivered,
            DocumentKind::SaleReceipt => ErrorCode::SaleReceiptAlreadyClosed,
            DocumentKind::Bill => ErrorCode::BillAlreadyOpen,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::SaleEstimate => write!(f, "sale estimate"),
            DocumentKind::SaleInvoice => write!(f, "sale invoice"),
            DocumentKind::SaleReceipt => write!(f, "sale receipt"),
            DocumentKind::Bill => write!(f, "bill"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sale_estimate" | "saleestimate" | "estimate" => Ok(DocumentKind::SaleEstimate),
            "sale_invoice" | "saleinvoice" | "invoice" => Ok(DocumentKind::SaleInvoice),
            "sale_receipt" | "salereceipt" | "receipt" => Ok(DocumentKind::SaleReceipt),
            "bill" => Ok(DocumentKind::Bill),
            other => Err(format!("unknown document kind: {}", other)),
        }
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Not yet delivered to the counterparty.
    #[default]
    Draft,
    /// Delivered (estimates, invoices), closed (receipts) or opened (bills).
    Published,
}

impl DocumentStatus {
    /// Returns the storage identifier of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Published => "published",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "published" | "delivered" | "open" | "closed" => Ok(DocumentStatus::Published),
            other => Err(format!("unknown document status: {}", other)),
        }
    }
}

/// A persisted document with its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Surrogate id, unique within the tenant.
    pub id: i64,
    /// Document kind.
    pub kind: DocumentKind,
    /// Natural key, unique per tenant and kind when present.
    pub number: Option<String>,
    /// Customer or vendor id.
    pub counterparty_id: i64,
    /// Document date.
    pub date: NaiveDate,
    /// Expiration or due date.
    pub due_date: Option<NaiveDate>,
    /// Free-text reference.
    pub reference: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
    /// Sum of the entries' computed amounts.
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// When the document was published.
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Line items ordered by index.
    pub entries: Vec<Entry>,
    /// The counterparty record, when loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<Contact>,
}

impl Document {
    /// Returns `true` once the document has been published.
    pub fn is_published(&self) -> bool {
        self.status == DocumentStatus::Published
    }

    /// Returns the reference its entries point back with.
    pub fn entry_reference(&self) -> EntryReference {
        EntryReference::new(self.kind, self.id)
    }

    /// Returns the ids of all entries.
    pub fn entry_ids(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Returns the sum of the entries' stored amounts.
    pub fn entries_total(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// A persisted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Server-assigned id.
    pub id: i64,
    /// Parent document kind, as stored.
    pub reference_type: String,
    /// Parent document id.
    pub reference_id: i64,
    /// 1-based position within the document.
    pub index: u32,
    /// Referenced item.
    pub item_id: i64,
    /// Optional description override.
    pub description: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit rate.
    pub rate: Decimal,
    /// Percentage discount (0-100).
    pub discount: Decimal,
    /// Server-computed amount.
    pub amount: Decimal,
}

/// Weak back-reference from entries to their parent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryReference {
    /// Parent document kind.
    pub kind: DocumentKind,
    /// Parent document id.
    pub document_id: i64,
}

impl EntryReference {
    /// Creates a reference to the given document.
    pub fn new(kind: DocumentKind, document_id: i64) -> Self {
        Self { kind, document_id }
    }

    /// Returns the `reference_type` column value.
    pub fn reference_type(&self) -> &'static str {
        self.kind.reference_type()
    }
}

/// The header fields written for a document.
///
/// Produced by validation; the storage layer never computes anything itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    /// Document kind.
    pub kind: DocumentKind,
    /// Normalised document number.
    pub number: Option<String>,
    /// Customer or vendor id.
    pub counterparty_id: i64,
    /// Document date.
    pub date: NaiveDate,
    /// Expiration or due date.
    pub due_date: Option<NaiveDate>,
    /// Free-text reference.
    pub reference: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
    /// Sum of entry amounts.
    pub amount: Decimal,
    /// Status to persist.
    pub status: DocumentStatus,
    /// Publication timestamp to persist.
    pub published_at: Option<DateTime<Utc>>,
}

/// A line item ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    /// Existing entry id for in-place updates; `None` inserts a new entry.
    pub id: Option<i64>,
    /// 1-based position within the document.
    pub index: u32,
    /// Referenced item.
    pub item_id: i64,
    /// Optional description override.
    pub description: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit rate.
    pub rate: Decimal,
    /// Percentage discount.
    pub discount: Decimal,
    /// Computed amount.
    pub amount: Decimal,
}

/// Computes an entry amount as `quantity * rate - quantity * rate * discount / 100`.
///
/// Returns `None` if the computation overflows. No rounding is applied.
///
/// ```
/// use rust_decimal::Decimal;
/// use tally_persistence::types::compute_entry_amount;
///
/// let amount = compute_entry_amount(Decimal::from(2), Decimal::from(10), Decimal::from(10));
/// assert_eq!(amount, Some(Decimal::from(18)));
/// ```
pub fn compute_entry_amount(quantity: Decimal, rate: Decimal, discount: Decimal) -> Option<Decimal> {
    let gross = quantity.checked_mul(rate)?;
    let reduction = gross
        .checked_mul(discount)?
        .checked_div(Decimal::ONE_HUNDRED)?;
    gross.checked_sub(reduction)
}
