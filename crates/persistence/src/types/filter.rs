//! Declarative list filter request types.
//!
//! These are the shapes a caller sends to `list`; the
//! [`DynamicListFilter`](crate::filter::DynamicListFilter) validates them and
//! turns them into a typed [`DocumentQuery`](super::DocumentQuery).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a filter role combines with the conditions before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    /// Both must hold.
    #[default]
    And,
    /// Either may hold.
    Or,
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterCondition::And => write!(f, "AND"),
            FilterCondition::Or => write!(f, "OR"),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// A single user-supplied filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRole {
    /// Field to filter on, e.g. `amount` or `estimate_number`.
    pub field_key: String,
    /// Comparator name, e.g. `equals` or `bigger`.
    pub comparator: String,
    /// Comparison value; ignored by `empty` / `not_empty`.
    #[serde(default)]
    pub value: Value,
    /// How this role joins the preceding roles.
    #[serde(default)]
    pub condition: FilterCondition,
    /// Position among the roles.
    #[serde(default)]
    pub index: u32,
}

impl FilterRole {
    /// Creates an AND-joined role.
    pub fn new(field_key: impl Into<String>, comparator: impl Into<String>, value: Value) -> Self {
        Self {
            field_key: field_key.into(),
            comparator: comparator.into(),
            value,
            condition: FilterCondition::And,
            index: 0,
        }
    }

    /// Sets how the role joins the preceding roles.
    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Sets the role's position.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }
}

/// A list request: filter roles, sorting, keyword search and pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Structured filter roles.
    #[serde(default)]
    pub filter_roles: Vec<FilterRole>,

    /// Filter roles encoded as a JSON string; used when `filter_roles` is empty.
    #[serde(default)]
    pub stringified_filter_roles: Option<String>,

    /// Field to sort by; defaults to the document date.
    #[serde(default)]
    pub column_sort_by: Option<String>,

    /// Sort direction; defaults to descending.
    #[serde(default)]
    pub sort_order: Option<SortOrder>,

    /// Keyword matched against number, reference and note.
    #[serde(default)]
    pub search_keyword: Option<String>,

    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Page size; defaults to the configured listing page size.
    #[serde(default)]
    pub page_size: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            filter_roles: Vec::new(),
            stringified_filter_roles: None,
            column_sort_by: None,
            sort_order: None,
            search_keyword: None,
            page: default_page(),
            page_size: None,
        }
    }
}

impl ListFilter {
    /// Adds a filter role.
    pub fn with_role(mut self, role: FilterRole) -> Self {
        self.filter_roles.push(role);
        self
    }

    /// Sets the sort column and direction.
    pub fn with_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.column_sort_by = Some(column.into());
        self.sort_order = Some(order);
        self
    }

    /// Sets the keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.search_keyword = Some(keyword.into());
        self
    }

    /// Sets the page and page size.
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }
}

/// Echo of the filter that was actually applied to a list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMeta {
    /// Applied roles in evaluation order.
    pub filter_roles: Vec<FilterRole>,
    /// Canonical sort field.
    pub sort_by: String,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Applied keyword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_keyword: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_filter_defaults() {
        let filter: ListFilter = serde_json::from_value(json!({})).unwrap();
        assert_eq!(filter.page, 1);
        assert!(filter.page_size.is_none());
        assert!(filter.filter_roles.is_empty());
    }

    #[test]
    fn test_filter_role_deserialize() {
        let role: FilterRole = serde_json::from_value(json!({
            "field_key": "amount",
            "comparator": "bigger",
            "value": 100,
            "condition": "or",
            "index": 2
        }))
        .unwrap();
        assert_eq!(role.condition, FilterCondition::Or);
        assert_eq!(role.index, 2);
        assert_eq!(role.value, json!(100));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
