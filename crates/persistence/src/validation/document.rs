//! Shape validation of create/edit payloads.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::dates::normalize_date;
use crate::error::{LedgerResult, ValidationDetail, ValidationError};
use crate::types::{
    DocumentDraft, DocumentDto, DocumentKind, DocumentStatus, EntryDraft, compute_entry_amount,
};

/// Maximum length of a document number.
pub const MAX_NUMBER_LEN: usize = 255;

/// Whether a payload creates a new document or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Entry ids are ignored and every entry is inserted.
    Create,
    /// Entry ids refer to existing entries of the document.
    Edit,
}

/// A payload that passed shape validation, with dates normalised and amounts
/// computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    /// Trimmed document number.
    pub number: Option<String>,
    /// Customer or vendor id.
    pub counterparty_id: i64,
    /// Document date.
    pub date: NaiveDate,
    /// Expiration or due date.
    pub due_date: Option<NaiveDate>,
    /// Trimmed reference.
    pub reference: Option<String>,
    /// Trimmed note.
    pub note: Option<String>,
    /// Whether publication was requested.
    pub publish: bool,
    /// Entries with indexes assigned and amounts computed.
    pub entries: Vec<EntryDraft>,
    /// Sum of entry amounts.
    pub amount: Decimal,
}

impl ValidatedDocument {
    /// Returns the distinct item ids in first-seen order.
    pub fn item_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.item_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Returns the entry ids the payload claims to update.
    pub fn claimed_entry_ids(&self) -> Vec<i64> {
        self.entries.iter().filter_map(|e| e.id).collect()
    }

    /// Builds the header row to persist.
    pub fn draft(
        &self,
        kind: DocumentKind,
        status: DocumentStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> DocumentDraft {
        DocumentDraft {
            kind,
            number: self.number.clone(),
            counterparty_id: self.counterparty_id,
            date: self.date,
            due_date: self.due_date,
            reference: self.reference.clone(),
            note: self.note.clone(),
            amount: self.amount,
            status,
            published_at,
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validates a payload for the given kind.
///
/// All problems are collected into a single [`ValidationError::InvalidDocument`]
/// whose details carry one entry per offending field.
pub fn validate_document(
    kind: DocumentKind,
    dto: &DocumentDto,
    mode: WriteMode,
) -> LedgerResult<ValidatedDocument> {
    let mut details = Vec::new();

    let number = match dto.number.as_deref().map(str::trim) {
        None => None,
        Some("") => {
            details.push(ValidationDetail::error(
                kind.number_field(),
                "must not be blank",
            ));
            None
        }
        Some(n) if n.chars().count() > MAX_NUMBER_LEN => {
            details.push(ValidationDetail::error(
                kind.number_field(),
                format!("must be at most {} characters", MAX_NUMBER_LEN),
            ));
            None
        }
        Some(n) => Some(n.to_string()),
    };

    let date = match dto.date.as_deref() {
        None => {
            details.push(ValidationDetail::error(kind.date_field(), "is required"));
            None
        }
        Some(raw) => {
            let parsed = normalize_date(raw);
            if parsed.is_none() {
                details.push(ValidationDetail::error(
                    kind.date_field(),
                    format!("'{}' is not a valid date", raw),
                ));
            }
            parsed
        }
    };

    let due_date = match (dto.due_date.as_deref(), kind.due_date_field()) {
        (None, _) => None,
        (Some(_), None) => {
            details.push(ValidationDetail::error(
                "due_date",
                format!("a {} has no due date", kind),
            ));
            None
        }
        (Some(raw), Some(field)) => match normalize_date(raw) {
            None => {
                details.push(ValidationDetail::error(
                    field,
                    format!("'{}' is not a valid date", raw),
                ));
                None
            }
            Some(due) => {
                if date.is_some_and(|d| due < d) {
                    details.push(ValidationDetail::error(
                        field,
                        format!("must not precede {}", kind.date_field()),
                    ));
                }
                Some(due)
            }
        },
    };

    let counterparty_field = format!("{}_id", kind.counterparty_type().as_str());
    let counterparty_id = match dto.counterparty_id {
        None => {
            details.push(ValidationDetail::error(&counterparty_field, "is required"));
            0
        }
        Some(id) if id <= 0 => {
            details.push(ValidationDetail::error(
                &counterparty_field,
                "must be a positive id",
            ));
            0
        }
        Some(id) => id,
    };

    if dto.entries.is_empty() {
        details.push(ValidationDetail::error(
            "entries",
            "at least one entry is required",
        ));
    }

    let mut seen_ids = HashSet::new();
    let mut entries = Vec::with_capacity(dto.entries.len());
    let mut amount = Some(Decimal::ZERO);

    for (position, entry) in dto.entries.iter().enumerate() {
        let path = |field: &str| format!("entries[{}].{}", position, field);
        let before = details.len();

        let item_id = entry.item_id.unwrap_or(0);
        if item_id <= 0 {
            details.push(ValidationDetail::error(
                path("item_id"),
                "must be a positive id",
            ));
        }

        let quantity = entry.quantity.unwrap_or(Decimal::ZERO);
        if quantity <= Decimal::ZERO {
            details.push(ValidationDetail::error(
                path("quantity"),
                "must be greater than zero",
            ));
        }

        let rate = match entry.rate {
            Some(rate) if rate >= Decimal::ZERO => rate,
            Some(_) => {
                details.push(ValidationDetail::error(path("rate"), "must not be negative"));
                Decimal::ZERO
            }
            None => {
                details.push(ValidationDetail::error(path("rate"), "is required"));
                Decimal::ZERO
            }
        };

        let discount = entry.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
            details.push(ValidationDetail::error(
                path("discount"),
                "must be between 0 and 100",
            ));
        }

        let id = match mode {
            WriteMode::Create => None,
            WriteMode::Edit => entry.id,
        };
        if let Some(id) = id {
            if !seen_ids.insert(id) {
                details.push(ValidationDetail::error(
                    path("id"),
                    format!("entry {} appears more than once", id),
                ));
            }
        }

        if details.len() > before {
            continue;
        }

        let Some(entry_amount) = compute_entry_amount(quantity, rate, discount) else {
            details.push(ValidationDetail::error(path("amount"), "amount overflows"));
            continue;
        };
        amount = amount.and_then(|total| total.checked_add(entry_amount));

        entries.push(EntryDraft {
            id,
            index: u32::try_from(position + 1).unwrap_or(u32::MAX),
            item_id,
            description: trimmed(entry.description.as_deref()),
            quantity,
            rate,
            discount,
            amount: entry_amount,
        });
    }

    if amount.is_none() {
        details.push(ValidationDetail::error("amount", "document total overflows"));
    }

    match (date, amount) {
        (Some(date), Some(amount)) if details.is_empty() => Ok(ValidatedDocument {
            number,
            counterparty_id,
            date,
            due_date,
            reference: trimmed(dto.reference.as_deref()),
            note: trimmed(dto.note.as_deref()),
            publish: dto.publish,
            entries,
            amount,
        }),
        _ => Err(ValidationError::InvalidDocument {
            kind,
            message: format!("{} field(s) failed validation", details.len()),
            details,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, LedgerError};
    use crate::types::EntryDto;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn valid_dto() -> DocumentDto {
        DocumentDto::new(
            "2024-03-01",
            7,
            vec![
                EntryDto::new(1, dec(2), dec(10)),
                EntryDto::new(2, dec(4), dec(25)).with_discount(Decimal::new(125, 1)),
            ],
        )
        .with_number("  EST-0001 ")
        .with_due_date("2024/03/31")
    }

    fn paths(err: &LedgerError) -> Vec<String> {
        err.details().iter().map(|d| d.path.clone()).collect()
    }

    #[test]
    fn test_valid_payload_is_normalised() {
        let doc = validate_document(DocumentKind::SaleEstimate, &valid_dto(), WriteMode::Create)
            .unwrap();

        assert_eq!(doc.number.as_deref(), Some("EST-0001"));
        assert_eq!(doc.due_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(doc.entries[0].amount, dec(20));
        assert_eq!(doc.entries[1].amount, Decimal::new(875, 1));
        assert_eq!(doc.amount, Decimal::new(1075, 1));
        assert_eq!(
            doc.entries.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_create_ignores_entry_ids() {
        let mut dto = valid_dto();
        dto.entries[0].id = Some(99);
        dto.entries[1].id = Some(99);

        let doc = validate_document(DocumentKind::SaleEstimate, &dto, WriteMode::Create).unwrap();
        assert!(doc.claimed_entry_ids().is_empty());
    }

    #[test]
    fn test_edit_rejects_repeated_entry_ids() {
        let mut dto = valid_dto();
        dto.entries[0].id = Some(99);
        dto.entries[1].id = Some(99);

        let err = validate_document(DocumentKind::SaleEstimate, &dto, WriteMode::Edit).unwrap_err();
        assert_eq!(paths(&err), vec!["entries[1].id"]);
    }

    #[test]
    fn test_collects_every_problem() {
        let dto = DocumentDto {
            number: Some("   ".to_string()),
            date: None,
            counterparty_id: Some(-1),
            entries: vec![EntryDto {
                item_id: Some(1),
                quantity: Some(Decimal::ZERO),
                rate: Some(dec(-1)),
                discount: Some(dec(101)),
                ..Default::default()
            }],
            ..Default::default()
        };

        let err = validate_document(DocumentKind::Bill, &dto, WriteMode::Create).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));
        assert_eq!(
            paths(&err),
            vec![
                "bill_number",
                "bill_date",
                "vendor_id",
                "entries[0].quantity",
                "entries[0].rate",
                "entries[0].discount",
            ]
        );
    }

    #[test]
    fn test_requires_entries() {
        let dto = DocumentDto::new("2024-03-01", 7, vec![]);
        let err =
            validate_document(DocumentKind::SaleInvoice, &dto, WriteMode::Create).unwrap_err();
        assert_eq!(paths(&err), vec!["entries"]);
    }

    #[test]
    fn test_due_date_rules() {
        let early = valid_dto().with_due_date("2024-02-01");
        let err = validate_document(DocumentKind::SaleEstimate, &early, WriteMode::Create)
            .unwrap_err();
        assert_eq!(paths(&err), vec!["expiration_date"]);

        let receipt = valid_dto().with_due_date("2024-04-01");
        let err =
            validate_document(DocumentKind::SaleReceipt, &receipt, WriteMode::Create).unwrap_err();
        assert_eq!(paths(&err), vec!["due_date"]);
    }

    #[test]
    fn test_number_length_limit() {
        let dto = valid_dto().with_number("N".repeat(MAX_NUMBER_LEN + 1));
        let err = validate_document(DocumentKind::SaleInvoice, &dto, WriteMode::Create)
            .unwrap_err();
        assert_eq!(paths(&err), vec!["invoice_no"]);
    }

    #[test]
    fn test_item_ids_are_distinct() {
        let mut dto = valid_dto();
        dto.entries.push(EntryDto::new(1, dec(1), dec(1)));
        let doc = validate_document(DocumentKind::SaleEstimate, &dto, WriteMode::Create).unwrap();
        assert_eq!(doc.item_ids(), vec![1, 2]);
    }
}
