//! Row decoding and shared read queries.
//!
//! Both [`SqliteBackend`](super::SqliteBackend) reads and
//! [`SqliteTransaction`](super::SqliteTransaction) reads go through these
//! functions, so a document looks the same whether it is read inside or
//! outside a transaction.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;

use crate::error::{BackendError, LedgerError, LedgerResult};
use crate::types::{
    Contact, ContactType, Document, DocumentKind, DocumentStatus, Entry, EntryReference, Item,
};

pub(crate) fn internal_error(message: String) -> LedgerError {
    LedgerError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

pub(crate) fn serialization_error(message: String) -> LedgerError {
    LedgerError::Backend(BackendError::SerializationError { message })
}

/// Formats a timestamp for storage. Fixed precision keeps text ordering chronological.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_timestamp(value: &str, column: &str) -> LedgerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("Invalid {} '{}': {}", column, value, e)))
}

fn parse_date(value: &str, column: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| serialization_error(format!("Invalid {} '{}': {}", column, value, e)))
}

fn parse_decimal(value: &str, column: &str) -> LedgerResult<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| serialization_error(format!("Invalid {} '{}': {}", column, value, e)))
}

const KEY_INT_DIGITS: usize = 29;
const KEY_FRAC_DIGITS: usize = 28;

/// Encodes an amount as fixed-width text whose byte order matches numeric order.
///
/// Non-negative values are `1` followed by the zero-padded integer and
/// fraction digits. Negative values are `0` followed by the nines' complement
/// of the same digits, so larger magnitudes sort first. Scale is normalised
/// away: `1.5` and `1.50` share a key.
pub(crate) fn amount_key(amount: &Decimal) -> String {
    let digits = amount.abs().mantissa().to_string();
    let scale = amount.scale() as usize;
    let digits = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = digits.split_at(digits.len() - scale);

    let mut key = String::with_capacity(KEY_INT_DIGITS + KEY_FRAC_DIGITS + 2);
    let negative = amount.is_sign_negative() && !amount.is_zero();
    key.push(if negative { '0' } else { '1' });
    let padded = format!(
        "{:0>int$}.{:0<frac$}",
        int_part,
        frac_part,
        int = KEY_INT_DIGITS,
        frac = KEY_FRAC_DIGITS
    );
    if negative {
        key.extend(padded.chars().map(|c| match c.to_digit(10) {
            Some(d) => char::from(b'0' + (9 - d) as u8),
            None => c,
        }));
    } else {
        key.push_str(&padded);
    }
    key
}

/// Builds `?, ?, ?` for `count` anonymous parameters.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) const DOCUMENT_COLUMNS: &str = "id, document_type, document_number, counterparty_id, \
     document_date, due_date, reference, note, amount, status, published_at, created_at, updated_at";

struct DocumentRow {
    id: i64,
    document_type: String,
    number: Option<String>,
    counterparty_id: i64,
    date: String,
    due_date: Option<String>,
    reference: Option<String>,
    note: Option<String>,
    amount: String,
    status: String,
    published_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn document_row(row: &Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        document_type: row.get(1)?,
        number: row.get(2)?,
        counterparty_id: row.get(3)?,
        date: row.get(4)?,
        due_date: row.get(5)?,
        reference: row.get(6)?,
        note: row.get(7)?,
        amount: row.get(8)?,
        status: row.get(9)?,
        published_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl DocumentRow {
    fn into_document(self) -> LedgerResult<Document> {
        let kind = DocumentKind::from_str(&self.document_type).map_err(serialization_error)?;
        let status = DocumentStatus::from_str(&self.status).map_err(serialization_error)?;

        Ok(Document {
            id: self.id,
            kind,
            number: self.number,
            counterparty_id: self.counterparty_id,
            date: parse_date(&self.date, "document_date")?,
            due_date: self
                .due_date
                .as_deref()
                .map(|d| parse_date(d, "due_date"))
                .transpose()?,
            reference: self.reference,
            note: self.note,
            amount: parse_decimal(&self.amount, "amount")?,
            status,
            published_at: self
                .published_at
                .as_deref()
                .map(|ts| parse_timestamp(ts, "published_at"))
                .transpose()?,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
            entries: Vec::new(),
            counterparty: None,
        })
    }
}

/// Loads a document with entries and counterparty.
pub(crate) fn load_document(
    conn: &Connection,
    tenant_id: &str,
    kind: DocumentKind,
    id: i64,
) -> LedgerResult<Option<Document>> {
    let sql = format!(
        "SELECT {} FROM documents WHERE tenant_id = ?1 AND document_type = ?2 AND id = ?3",
        DOCUMENT_COLUMNS
    );

    let row = conn
        .query_row(&sql, params![tenant_id, kind.as_str(), id], document_row)
        .optional()
        .map_err(|e| internal_error(format!("Failed to read document: {}", e)))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut document = row.into_document()?;
    document.entries = load_entries(conn, tenant_id, &document.entry_reference())?;
    document.counterparty = load_contact(conn, tenant_id, document.counterparty_id, None)?;

    Ok(Some(document))
}

/// Loads the entries pointing back at a document, ordered by index.
pub(crate) fn load_entries(
    conn: &Connection,
    tenant_id: &str,
    reference: &EntryReference,
) -> LedgerResult<Vec<Entry>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, reference_type, reference_id, entry_index, item_id, description,
                    quantity, rate, discount, amount
             FROM item_entries
             WHERE tenant_id = ?1 AND reference_type = ?2 AND reference_id = ?3
             ORDER BY entry_index, id",
        )
        .map_err(|e| internal_error(format!("Failed to prepare entry query: {}", e)))?;

    let rows = stmt
        .query_map(
            params![tenant_id, reference.reference_type(), reference.document_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                ))
            },
        )
        .map_err(|e| internal_error(format!("Failed to query entries: {}", e)))?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, reference_type, reference_id, index, item_id, description, q, r, d, a) =
            row.map_err(|e| internal_error(format!("Failed to read entry row: {}", e)))?;
        entries.push(Entry {
            id,
            reference_type,
            reference_id,
            index,
            item_id,
            description,
            quantity: parse_decimal(&q, "quantity")?,
            rate: parse_decimal(&r, "rate")?,
            discount: parse_decimal(&d, "discount")?,
            amount: parse_decimal(&a, "amount")?,
        });
    }

    Ok(entries)
}

fn contact_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, Option<String>, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_contact(
    (id, contact_type, display_name, email, created_at): (
        i64,
        String,
        String,
        Option<String>,
        String,
    ),
) -> LedgerResult<Contact> {
    Ok(Contact {
        id,
        contact_type: ContactType::from_str(&contact_type).map_err(serialization_error)?,
        display_name,
        email,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

/// Loads a contact, optionally requiring a contact type.
pub(crate) fn load_contact(
    conn: &Connection,
    tenant_id: &str,
    id: i64,
    contact_type: Option<ContactType>,
) -> LedgerResult<Option<Contact>> {
    let row = match contact_type {
        Some(contact_type) => conn
            .query_row(
                "SELECT id, contact_type, display_name, email, created_at FROM contacts
                 WHERE tenant_id = ?1 AND id = ?2 AND contact_type = ?3",
                params![tenant_id, id, contact_type.as_str()],
                contact_row,
            )
            .optional(),
        None => conn
            .query_row(
                "SELECT id, contact_type, display_name, email, created_at FROM contacts
                 WHERE tenant_id = ?1 AND id = ?2",
                params![tenant_id, id],
                contact_row,
            )
            .optional(),
    }
    .map_err(|e| internal_error(format!("Failed to read contact: {}", e)))?;

    row.map(into_contact).transpose()
}

/// Loads the contacts with the given ids.
pub(crate) fn load_contacts(
    conn: &Connection,
    tenant_id: &str,
    ids: &[i64],
) -> LedgerResult<Vec<Contact>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id, contact_type, display_name, email, created_at FROM contacts
         WHERE tenant_id = ? AND id IN ({}) ORDER BY id",
        placeholders(ids.len())
    );
    let mut values = vec![Value::Text(tenant_id.to_string())];
    values.extend(ids.iter().map(|id| Value::Integer(*id)));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| internal_error(format!("Failed to prepare contact query: {}", e)))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), contact_row)
        .map_err(|e| internal_error(format!("Failed to query contacts: {}", e)))?;

    let mut contacts = Vec::new();
    for row in rows {
        let row = row.map_err(|e| internal_error(format!("Failed to read contact row: {}", e)))?;
        contacts.push(into_contact(row)?);
    }
    Ok(contacts)
}

/// Loads the items with the given ids.
pub(crate) fn load_items(conn: &Connection, tenant_id: &str, ids: &[i64]) -> LedgerResult<Vec<Item>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id, name, sellable, purchasable, sell_price, cost_price, created_at FROM items
         WHERE tenant_id = ? AND id IN ({}) ORDER BY id",
        placeholders(ids.len())
    );
    let mut values = vec![Value::Text(tenant_id.to_string())];
    values.extend(ids.iter().map(|id| Value::Integer(*id)));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| internal_error(format!("Failed to prepare item query: {}", e)))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .map_err(|e| internal_error(format!("Failed to query items: {}", e)))?;

    let mut items = Vec::new();
    for row in rows {
        let (id, name, sellable, purchasable, sell_price, cost_price, created_at) =
            row.map_err(|e| internal_error(format!("Failed to read item row: {}", e)))?;
        items.push(Item {
            id,
            name,
            sellable,
            purchasable,
            sell_price: sell_price
                .as_deref()
                .map(|p| parse_decimal(p, "sell_price"))
                .transpose()?,
            cost_price: cost_price
                .as_deref()
                .map(|p| parse_decimal(p, "cost_price"))
                .transpose()?,
            created_at: parse_timestamp(&created_at, "created_at")?,
        });
    }
    Ok(items)
}
