//! Dynamic list filtering.
//!
//! Converts a caller's [`ListFilter`](crate::types::ListFilter) (filter roles,
//! sort column, keyword and 1-based page) into a typed
//! [`DocumentQuery`](crate::types::DocumentQuery).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tally_persistence::config::ListingConfig;
//! use tally_persistence::filter::DynamicListFilter;
//! use tally_persistence::types::{DocumentKind, FilterRole, ListFilter};
//!
//! let filter = DynamicListFilter::new(DocumentKind::Bill, ListingConfig::default());
//! let query = filter
//!     .build(&ListFilter::default().with_role(FilterRole::new("bill_number", "contain", json!("B-"))))
//!     .unwrap();
//! assert_eq!(query.conditions.len(), 1);
//! assert_eq!(query.page.offset(), 0);
//! ```

mod dynamic;
mod fields;

pub use dynamic::DynamicListFilter;
pub use fields::{resolve_field, typed_value};
