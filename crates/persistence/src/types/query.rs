//! Typed document queries.
//!
//! A [`DocumentQuery`] is the validated form of a
//! [`ListFilter`](super::ListFilter). Backends translate it into their native
//! query language and always add tenant and kind scoping themselves.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::document::{Document, DocumentKind, DocumentStatus};
use super::filter::{FilterCondition, FilterMeta, FilterRole, SortOrder};
use super::pagination::{PageRequest, PaginationMeta};

/// Filterable and sortable document columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentColumn {
    /// Document number.
    Number,
    /// Document date.
    Date,
    /// Expiration or due date.
    DueDate,
    /// Customer or vendor id.
    CounterpartyId,
    /// Total amount.
    Amount,
    /// Lifecycle status.
    Status,
    /// Reference text.
    Reference,
    /// Note text.
    Note,
    /// Creation date.
    CreatedAt,
}

impl DocumentColumn {
    /// Returns the canonical field key.
    pub fn key(&self) -> &'static str {
        match self {
            DocumentColumn::Number => "number",
            DocumentColumn::Date => "date",
            DocumentColumn::DueDate => "due_date",
            DocumentColumn::CounterpartyId => "counterparty_id",
            DocumentColumn::Amount => "amount",
            DocumentColumn::Status => "status",
            DocumentColumn::Reference => "reference",
            DocumentColumn::Note => "note",
            DocumentColumn::CreatedAt => "created_at",
        }
    }

    /// Returns the value type of the column.
    pub fn field_type(&self) -> FieldType {
        match self {
            DocumentColumn::Number | DocumentColumn::Reference | DocumentColumn::Note => {
                FieldType::Text
            }
            DocumentColumn::CounterpartyId | DocumentColumn::Amount => FieldType::Number,
            DocumentColumn::Date | DocumentColumn::DueDate | DocumentColumn::CreatedAt => {
                FieldType::Date
            }
            DocumentColumn::Status => FieldType::Status,
        }
    }
}

impl fmt::Display for DocumentColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value type of a filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text.
    Text,
    /// Integer or decimal.
    Number,
    /// Calendar date.
    Date,
    /// Document status.
    Status,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Status => write!(f, "status"),
        }
    }
}

/// Filter comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Equal.
    Equals,
    /// Not equal.
    NotEqual,
    /// Substring match.
    Contain,
    /// Negated substring match.
    NotContain,
    /// Strictly greater.
    Bigger,
    /// Greater or equal.
    BiggerOrEqual,
    /// Strictly smaller.
    Smaller,
    /// Smaller or equal.
    SmallerOrEqual,
    /// Strictly earlier date.
    Before,
    /// Strictly later date.
    After,
    /// Null or blank.
    Empty,
    /// Neither null nor blank.
    NotEmpty,
}

impl Comparator {
    /// Returns `true` if the comparator can be applied to the field type.
    pub fn supports(&self, field_type: FieldType) -> bool {
        use Comparator::*;
        match field_type {
            FieldType::Text => matches!(
                self,
                Equals | NotEqual | Contain | NotContain | Empty | NotEmpty
            ),
            FieldType::Number => matches!(
                self,
                Equals | NotEqual | Bigger | BiggerOrEqual | Smaller | SmallerOrEqual
            ),
            FieldType::Date => matches!(
                self,
                Equals | NotEqual | Before | After | Empty | NotEmpty
            ),
            FieldType::Status => matches!(self, Equals | NotEqual),
        }
    }

    /// Returns `true` if the comparator ignores the role value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Comparator::Empty | Comparator::NotEmpty)
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "equal" | "is" => Ok(Comparator::Equals),
            "not_equal" | "not_equals" | "is_not" => Ok(Comparator::NotEqual),
            "contain" | "contains" => Ok(Comparator::Contain),
            "not_contain" | "not_contains" => Ok(Comparator::NotContain),
            "bigger" | "bigger_than" => Ok(Comparator::Bigger),
            "bigger_or_equal" | "bigger_or_equals" => Ok(Comparator::BiggerOrEqual),
            "smaller" | "smaller_than" => Ok(Comparator::Smaller),
            "smaller_or_equal" | "smaller_or_equals" => Ok(Comparator::SmallerOrEqual),
            "before" => Ok(Comparator::Before),
            "after" => Ok(Comparator::After),
            "empty" => Ok(Comparator::Empty),
            "not_empty" => Ok(Comparator::NotEmpty),
            other => Err(format!("unknown comparator: {}", other)),
        }
    }
}

/// A typed comparison value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// No value (unary comparators).
    None,
    /// Text.
    Text(String),
    /// Integer id.
    Integer(i64),
    /// Decimal amount.
    Decimal(Decimal),
    /// Calendar date.
    Date(NaiveDate),
    /// Document status.
    Status(DocumentStatus),
}

/// A validated filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    /// Column to compare.
    pub column: DocumentColumn,
    /// Comparator.
    pub comparator: Comparator,
    /// Typed value.
    pub value: QueryValue,
    /// How the condition joins the preceding ones; ignored for the first.
    pub join: FilterCondition,
}

/// Sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Column to sort by.
    pub column: DocumentColumn,
    /// Direction, also applied to the id tie-breaker.
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: DocumentColumn::Date,
            order: SortOrder::Desc,
        }
    }
}

/// A validated, typed list query for one document kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    /// Document kind to list.
    pub kind: DocumentKind,
    /// Conditions, combined left to right.
    pub conditions: Vec<QueryCondition>,
    /// Keyword matched against number, reference and note.
    pub keyword: Option<String>,
    /// Ordering.
    pub sort: SortSpec,
    /// Page to fetch.
    pub page: PageRequest,
    /// Roles that produced the conditions, in evaluation order.
    pub roles: Vec<FilterRole>,
}

impl DocumentQuery {
    /// Creates an unfiltered query for the kind.
    pub fn new(kind: DocumentKind, page: PageRequest) -> Self {
        Self {
            kind,
            conditions: Vec::new(),
            keyword: None,
            sort: SortSpec::default(),
            page,
            roles: Vec::new(),
        }
    }

    /// Returns the echo of the applied filter.
    pub fn meta(&self) -> FilterMeta {
        FilterMeta {
            filter_roles: self.roles.clone(),
            sort_by: self.sort.column.key().to_string(),
            sort_order: self.sort.order,
            search_keyword: self.keyword.clone(),
        }
    }
}

/// One page of raw search results from a backend.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Documents on the page, in query order.
    pub documents: Vec<Document>,
    /// Total matching documents across all pages.
    pub total: u64,
}

/// The outbound list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    /// Documents on the requested page.
    pub results: Vec<Document>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
    /// Echo of the applied filter.
    pub filter_meta: FilterMeta,
}
