//! Pre-write validation gates.
//!
//! Every gate runs before a transaction begins, so a failing gate never
//! aborts a started write:
//!
//! 1. [`validate_document`] - payload shape, date normalisation, amounts
//! 2. [`UniquenessValidator`] - the document number is free in the tenant
//! 3. [`ensure_counterparty`] - the customer or vendor exists
//! 4. [`EntryValidator`] - items exist and are eligible; claimed entry ids
//!    belong to the document being edited
//!
//! The validators are traits so services can be wired with alternative
//! implementations.

mod counterparty;
mod dates;
mod document;
mod entries;
mod uniqueness;

pub use counterparty::ensure_counterparty;
pub use dates::normalize_date;
pub use document::{MAX_NUMBER_LEN, ValidatedDocument, WriteMode, validate_document};
pub use entries::{CatalogEntryValidator, EntryValidator};
pub use uniqueness::{NumberUniquenessValidator, UniquenessValidator};
