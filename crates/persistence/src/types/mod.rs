//! Core types for the document lifecycle.
//!
//! This module provides the fundamental types used throughout the crate:
//!
//! - [`Document`], [`Entry`] - Persisted documents and their line items
//! - [`DocumentDto`], [`EntryDto`] - Inbound create/edit payloads
//! - [`Item`], [`Contact`], [`TenantRecord`] - Catalog records
//! - [`ListFilter`], [`DocumentQuery`] - Declarative and typed list queries
//! - [`PageRequest`], [`PaginationMeta`] - Pagination types
//!
//! # Examples
//!
//! ```
//! use rust_decimal::Decimal;
//! use tally_persistence::types::{DocumentDto, EntryDto, ListFilter, SortOrder};
//!
//! let dto = DocumentDto::new(
//!     "2024-03-01",
//!     7,
//!     vec![EntryDto::new(1, Decimal::from(2), Decimal::new(1999, 2))],
//! )
//! .with_number("EST-0001");
//!
//! let filter = ListFilter::default()
//!     .with_sort("amount", SortOrder::Asc)
//!     .with_page(2, 25);
//! assert_eq!(filter.page, 2);
//! ```

mod catalog;
mod document;
mod dto;
mod filter;
mod pagination;
mod query;

pub use catalog::{
    Contact, ContactType, Item, ItemEligibility, NewContact, NewItem, TenantRecord,
};
pub use document::{
    Document, DocumentDraft, DocumentKind, DocumentStatus, Entry, EntryDraft, EntryReference,
    compute_entry_amount,
};
pub use dto::{DocumentDto, EntryDto};
pub use filter::{FilterCondition, FilterMeta, FilterRole, ListFilter, SortOrder};
pub use pagination::{PageRequest, PaginationMeta};
pub use query::{
    Comparator, DocumentColumn, DocumentList, DocumentQuery, FieldType, QueryCondition,
    QueryValue, SearchPage, SortSpec,
};
