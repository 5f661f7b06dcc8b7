//! Field key resolution and value typing.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{Comparator, DocumentColumn, DocumentKind, DocumentStatus, FieldType, QueryValue};
use crate::validation::normalize_date;

/// Resolves a field key for the kind.
///
/// Accepts the generic keys (`number`, `date`, `amount`, ...) and the kind's
/// own names (`estimate_number`, `bill_date`, `vendor_id`, ...).
pub fn resolve_field(kind: DocumentKind, key: &str) -> Option<DocumentColumn> {
    let key = key.trim().to_ascii_lowercase();
    let key = key.as_str();

    if key == kind.number_field() {
        return Some(DocumentColumn::Number);
    }
    if key == kind.date_field() {
        return Some(DocumentColumn::Date);
    }
    if key == format!("{}_id", kind.counterparty_type().as_str()) {
        return Some(DocumentColumn::CounterpartyId);
    }
    if let Some(due) = kind.due_date_field() {
        if key == due || key == "due_date" {
            return Some(DocumentColumn::DueDate);
        }
    }

    match key {
        "number" => Some(DocumentColumn::Number),
        "date" => Some(DocumentColumn::Date),
        "counterparty_id" => Some(DocumentColumn::CounterpartyId),
        "amount" | "total" => Some(DocumentColumn::Amount),
        "status" => Some(DocumentColumn::Status),
        "reference" | "reference_no" => Some(DocumentColumn::Reference),
        "note" | "terms_conditions" => Some(DocumentColumn::Note),
        "created_at" => Some(DocumentColumn::CreatedAt),
        _ => None,
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidFilter {
        field: field.to_string(),
        message: message.into(),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Converts a raw role value into the column's value type.
pub fn typed_value(
    field: &str,
    column: DocumentColumn,
    comparator: Comparator,
    value: &Value,
) -> Result<QueryValue, ValidationError> {
    if comparator.is_unary() {
        return Ok(QueryValue::None);
    }
    if value.is_null() {
        return Err(invalid(field, "a value is required"));
    }

    let mismatch = || {
        invalid(
            field,
            format!("{} is not a valid {} value", value, column.field_type()),
        )
    };

    match column.field_type() {
        FieldType::Text => as_text(value).map(QueryValue::Text).ok_or_else(mismatch),
        FieldType::Number if column == DocumentColumn::CounterpartyId => match value {
            Value::Number(n) => n.as_i64().map(QueryValue::Integer).ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(QueryValue::Integer)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        FieldType::Number => as_text(value)
            .and_then(|s| Decimal::from_str(s.trim()).ok())
            .map(QueryValue::Decimal)
            .ok_or_else(mismatch),
        FieldType::Date => value
            .as_str()
            .and_then(normalize_date)
            .map(QueryValue::Date)
            .ok_or_else(mismatch),
        FieldType::Status => value
            .as_str()
            .and_then(|s| DocumentStatus::from_str(s).ok())
            .map(QueryValue::Status)
            .ok_or_else(mismatch),
    }
}
