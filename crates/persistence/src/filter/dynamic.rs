//! Translation of declarative list requests into typed queries.

use std::str::FromStr;

use tracing::debug;

use super::fields::{resolve_field, typed_value};
use crate::config::ListingConfig;
use crate::error::{LedgerResult, ValidationError};
use crate::types::{
    Comparator, DocumentColumn, DocumentKind, DocumentQuery, FilterRole, ListFilter, PageRequest,
    QueryCondition, SortSpec,
};

/// Builds [`DocumentQuery`] values for one document kind.
///
/// Field keys and comparators are checked against the kind's allow-list;
/// anything unknown is rejected rather than ignored. Tenant scoping is not
/// expressed here at all: backends add it themselves, ahead of every
/// condition produced by this filter.
#[derive(Debug, Clone, Copy)]
pub struct DynamicListFilter {
    kind: DocumentKind,
    config: ListingConfig,
}

impl DynamicListFilter {
    /// Creates a filter for the kind with the given page limits.
    pub fn new(kind: DocumentKind, config: ListingConfig) -> Self {
        Self { kind, config }
    }

    /// Returns the document kind.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Returns the page limits.
    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    /// Validates a list request and converts it to a typed query.
    ///
    /// # Errors
    ///
    /// * `ValidationError::InvalidPagination` - `page` or `page_size` is zero
    /// * `ValidationError::InvalidFilter` - unknown field, unsupported
    ///   comparator, mistyped value, or unparsable `stringified_filter_roles`
    pub fn build(&self, filter: &ListFilter) -> LedgerResult<DocumentQuery> {
        let page = self.page_request(filter)?;
        let roles = self.roles(filter)?;

        let conditions = roles
            .iter()
            .map(|role| self.condition(role))
            .collect::<Result<Vec<_>, _>>()?;

        let sort = self.sort(filter)?;
        let keyword = filter
            .search_keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        debug!(
            kind = %self.kind,
            conditions = conditions.len(),
            sort = %sort.column,
            page = page.page,
            page_size = page.page_size,
            "Built document query"
        );

        Ok(DocumentQuery {
            kind: self.kind,
            conditions,
            keyword,
            sort,
            page,
            roles,
        })
    }

    fn page_request(&self, filter: &ListFilter) -> Result<PageRequest, ValidationError> {
        if filter.page == 0 {
            return Err(ValidationError::InvalidPagination {
                message: "page must be at least 1".to_string(),
            });
        }
        let page_size = match filter.page_size {
            Some(0) => {
                return Err(ValidationError::InvalidPagination {
                    message: "page_size must be at least 1".to_string(),
                });
            }
            Some(size) => size,
            None => self.config.default_page_size,
        };

        Ok(PageRequest::new(
            filter.page,
            page_size.min(self.config.max_page_size),
        ))
    }

    /// Returns the roles to apply, ordered by index.
    fn roles(&self, filter: &ListFilter) -> Result<Vec<FilterRole>, ValidationError> {
        let mut roles = if !filter.filter_roles.is_empty() {
            filter.filter_roles.clone()
        } else {
            match filter
                .stringified_filter_roles
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                Some(raw) => serde_json::from_str::<Vec<FilterRole>>(raw).map_err(|e| {
                    ValidationError::InvalidFilter {
                        field: "stringified_filter_roles".to_string(),
                        message: e.to_string(),
                    }
                })?,
                None => Vec::new(),
            }
        };

        roles.sort_by_key(|role| role.index);
        Ok(roles)
    }

    fn condition(&self, role: &FilterRole) -> Result<QueryCondition, ValidationError> {
        let field = role.field_key.as_str();
        let column = self.column(field)?;

        let comparator = Comparator::from_str(&role.comparator).map_err(|message| {
            ValidationError::InvalidFilter {
                field: field.to_string(),
                message,
            }
        })?;
        if !comparator.supports(column.field_type()) {
            return Err(ValidationError::InvalidFilter {
                field: field.to_string(),
                message: format!(
                    "comparator '{}' is not supported for {} fields",
                    role.comparator,
                    column.field_type()
                ),
            });
        }

        Ok(QueryCondition {
            column,
            comparator,
            value: typed_value(field, column, comparator, &role.value)?,
            join: role.condition,
        })
    }

    fn sort(&self, filter: &ListFilter) -> Result<SortSpec, ValidationError> {
        let default = SortSpec::default();
        let column = match filter.column_sort_by.as_deref().map(str::trim) {
            None | Some("") => default.column,
            Some(key) => self.column(key)?,
        };

        Ok(SortSpec {
            column,
            order: filter.sort_order.unwrap_or(default.order),
        })
    }

    fn column(&self, field: &str) -> Result<DocumentColumn, ValidationError> {
        resolve_field(self.kind, field).ok_or_else(|| ValidationError::InvalidFilter {
            field: field.to_string(),
            message: format!("unknown field for {}", self.kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, LedgerError};
    use crate::types::{FilterCondition, QueryValue, SortOrder};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn estimates() -> DynamicListFilter {
        DynamicListFilter::new(DocumentKind::SaleEstimate, ListingConfig::default())
    }

    #[test]
    fn test_defaults() {
        let query = estimates().build(&ListFilter::default()).unwrap();
        assert!(query.conditions.is_empty());
        assert_eq!(query.page, PageRequest::new(1, 20));
        assert_eq!(query.sort, SortSpec::default());
        assert_eq!(query.keyword, None);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let filter = DynamicListFilter::new(
            DocumentKind::Bill,
            ListingConfig {
                default_page_size: 5,
                max_page_size: 50,
            },
        );
        let query = filter
            .build(&ListFilter::default().with_page(3, 500))
            .unwrap();
        assert_eq!(query.page.page_size, 50);
        assert_eq!(query.page.offset(), 100);
    }

    #[test]
    fn test_zero_page_rejected() {
        let mut request = ListFilter::default();
        request.page = 0;
        let err = estimates().build(&request).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::InvalidPagination { .. })
        ));

        let err = estimates()
            .build(&ListFilter::default().with_page(1, 0))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));
    }

    #[test]
    fn test_roles_are_ordered_by_index() {
        let request = ListFilter::default()
            .with_role(FilterRole::new("amount", "bigger", json!(100)).with_index(2))
            .with_role(
                FilterRole::new("estimate_number", "contain", json!("EST"))
                    .with_condition(FilterCondition::Or)
                    .with_index(1),
            );

        let query = estimates().build(&request).unwrap();
        assert_eq!(query.conditions[0].column, DocumentColumn::Number);
        assert_eq!(query.conditions[1].column, DocumentColumn::Amount);
        assert_eq!(
            query.conditions[1].value,
            QueryValue::Decimal(Decimal::from(100))
        );
        assert_eq!(query.meta().filter_roles[0].field_key, "estimate_number");
    }

    #[test]
    fn test_stringified_roles() {
        let mut request = ListFilter::default();
        request.stringified_filter_roles = Some(
            r#"[{"field_key": "status", "comparator": "equals", "value": "draft"}]"#.to_string(),
        );
        let query = estimates().build(&request).unwrap();
        assert_eq!(query.conditions.len(), 1);
        assert_eq!(query.conditions[0].column, DocumentColumn::Status);

        request.stringified_filter_roles = Some("not json".to_string());
        assert!(estimates().build(&request).is_err());
    }

    #[test]
    fn test_unknown_field_and_comparator() {
        let request =
            ListFilter::default().with_role(FilterRole::new("tenant_id", "equals", json!("x")));
        let err = estimates().build(&request).unwrap_err();
        assert!(err.to_string().contains("tenant_id"));

        let request =
            ListFilter::default().with_role(FilterRole::new("amount", "contain", json!("1")));
        assert!(estimates().build(&request).is_err());

        let request = ListFilter::default().with_sort("vendor_id", SortOrder::Asc);
        assert!(estimates().build(&request).is_err());
    }

    #[test]
    fn test_sort_and_keyword() {
        let request = ListFilter::default()
            .with_sort("expiration_date", SortOrder::Asc)
            .with_keyword("  net 30 ");
        let query = estimates().build(&request).unwrap();
        assert_eq!(query.sort.column, DocumentColumn::DueDate);
        assert_eq!(query.sort.order, SortOrder::Asc);
        assert_eq!(query.keyword.as_deref(), Some("net 30"));
        assert_eq!(query.meta().sort_by, "due_date");
    }
}
