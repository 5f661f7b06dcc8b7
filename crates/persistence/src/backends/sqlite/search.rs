//! Document listing for the SQLite backend.
//!
//! Translates a [`DocumentQuery`] into a WHERE clause with bound parameters.
//! The tenant and kind predicates always come first and user conditions are
//! wrapped in their own parenthesised group, so an `OR` in a filter role can
//! never escape the tenant scope.

use async_trait::async_trait;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::core::SearchProvider;
use crate::error::LedgerResult;
use crate::tenant::TenantContext;
use crate::types::{
    Comparator, DocumentColumn, DocumentQuery, FilterCondition, QueryCondition, QueryValue,
    SearchPage,
};

use super::SqliteBackend;
use super::rows::{amount_key, format_date, internal_error, load_document};

/// A fragment of SQL with bound parameters, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<Value>,
}

impl SqlFragment {
    fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Joins `other` onto this fragment as `(self JOIN other)`.
    fn join(mut self, join: FilterCondition, other: SqlFragment) -> Self {
        if self.sql.is_empty() {
            return other;
        }
        self.sql = format!("({} {} {})", self.sql, join, other.sql);
        self.params.extend(other.params);
        self
    }
}

/// Column expression used for comparisons and ordering.
///
/// Amounts compare through `amount_key`, which orders exactly like the
/// stored decimal.
fn column_sql(column: DocumentColumn) -> &'static str {
    match column {
        DocumentColumn::Number => "document_number",
        DocumentColumn::Date => "document_date",
        DocumentColumn::DueDate => "due_date",
        DocumentColumn::CounterpartyId => "counterparty_id",
        DocumentColumn::Amount => "amount_key",
        DocumentColumn::Status => "status",
        DocumentColumn::Reference => "reference",
        DocumentColumn::Note => "note",
        DocumentColumn::CreatedAt => "substr(created_at, 1, 10)",
    }
}

/// Column expression used for substring and emptiness checks.
fn text_column_sql(column: DocumentColumn) -> &'static str {
    match column {
        DocumentColumn::Amount => "amount",
        other => column_sql(other),
    }
}

/// Returns the bound value for a typed value, encoded like its column.
fn bind(value: &QueryValue) -> Value {
    match value {
        QueryValue::None => Value::Null,
        QueryValue::Text(s) => Value::Text(s.clone()),
        QueryValue::Integer(i) => Value::Integer(*i),
        QueryValue::Decimal(d) => Value::Text(amount_key(d)),
        QueryValue::Date(d) => Value::Text(format_date(d)),
        QueryValue::Status(s) => Value::Text(s.as_str().to_string()),
    }
}

/// Escapes LIKE wildcards and wraps the text for a substring match.
fn like_pattern(value: &QueryValue) -> Value {
    let text = match value {
        QueryValue::Text(s) => s.clone(),
        QueryValue::Integer(i) => i.to_string(),
        QueryValue::Decimal(d) => d.to_string(),
        QueryValue::Date(d) => format_date(d),
        QueryValue::Status(s) => s.as_str().to_string(),
        QueryValue::None => String::new(),
    };
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Value::Text(format!("%{}%", escaped))
}

fn condition_sql(condition: &QueryCondition) -> SqlFragment {
    let col = column_sql(condition.column);
    let text_col = text_column_sql(condition.column);

    let binary = |op: &str| {
        SqlFragment::new(format!("{} {} ?", col, op), vec![bind(&condition.value)])
    };

    match condition.comparator {
        Comparator::Equals => binary("="),
        Comparator::NotEqual => SqlFragment::new(
            format!("({} IS NULL OR {} <> ?)", col, col),
            vec![bind(&condition.value)],
        ),
        Comparator::Contain => SqlFragment::new(
            format!("{} LIKE ? ESCAPE '\\'", text_col),
            vec![like_pattern(&condition.value)],
        ),
        Comparator::NotContain => SqlFragment::new(
            format!("({} IS NULL OR {} NOT LIKE ? ESCAPE '\\')", text_col, text_col),
            vec![like_pattern(&condition.value)],
        ),
        Comparator::Bigger | Comparator::After => binary(">"),
        Comparator::BiggerOrEqual => binary(">="),
        Comparator::Smaller | Comparator::Before => binary("<"),
        Comparator::SmallerOrEqual => binary("<="),
        Comparator::Empty => SqlFragment::new(
            format!("({} IS NULL OR {} = '')", text_col, text_col),
            vec![],
        ),
        Comparator::NotEmpty => SqlFragment::new(
            format!("({} IS NOT NULL AND {} <> '')", text_col, text_col),
            vec![],
        ),
    }
}

/// Builds the WHERE clause (without the keyword) for a query.
pub(crate) fn build_where(tenant_id: &str, query: &DocumentQuery) -> SqlFragment {
    let mut fragment = SqlFragment::new(
        "tenant_id = ? AND document_type = ?",
        vec![
            Value::Text(tenant_id.to_string()),
            Value::Text(query.kind.as_str().to_string()),
        ],
    );

    let user = query
        .conditions
        .iter()
        .fold(SqlFragment::default(), |acc, condition| {
            acc.join(condition.join, condition_sql(condition))
        });
    if !user.sql.is_empty() {
        fragment.sql = format!("{} AND ({})", fragment.sql, user.sql);
        fragment.params.extend(user.params);
    }

    if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        let pattern = like_pattern(&QueryValue::Text(keyword.to_string()));
        fragment.sql = format!(
            "{} AND (document_number LIKE ? ESCAPE '\\' OR reference LIKE ? ESCAPE '\\' \
             OR note LIKE ? ESCAPE '\\')",
            fragment.sql
        );
        fragment
            .params
            .extend([pattern.clone(), pattern.clone(), pattern]);
    }

    fragment
}

fn order_by(query: &DocumentQuery) -> String {
    let dir = query.sort.order.as_sql();
    format!(
        "ORDER BY {} {}, id {}",
        column_sql(query.sort.column),
        dir,
        dir
    )
}

fn to_sql_int(value: u64) -> Value {
    Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}

#[async_trait]
impl SearchProvider for SqliteBackend {
    async fn search_documents(
        &self,
        tenant: &TenantContext,
        query: &DocumentQuery,
    ) -> LedgerResult<SearchPage> {
        let conn = self.get_connection()?;
        let tenant_id = tenant.tenant_id().as_str();
        let filter = build_where(tenant_id, query);

        let count_sql = format!("SELECT COUNT(*) FROM documents WHERE {}", filter.sql);
        let total: i64 = conn
            .query_row(&count_sql, params_from_iter(filter.params.iter()), |row| {
                row.get(0)
            })
            .map_err(|e| internal_error(format!("Failed to count documents: {}", e)))?;

        let page_sql = format!(
            "SELECT id FROM documents WHERE {} {} LIMIT ? OFFSET ?",
            filter.sql,
            order_by(query)
        );
        let mut params = filter.params;
        params.push(to_sql_int(query.page.limit()));
        params.push(to_sql_int(query.page.offset()));

        let ids: Vec<i64> = {
            let mut stmt = conn
                .prepare(&page_sql)
                .map_err(|e| internal_error(format!("Failed to prepare list query: {}", e)))?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| row.get(0))
                .map_err(|e| internal_error(format!("Failed to list documents: {}", e)))?;
            rows.collect::<Result<_, _>>()
                .map_err(|e| internal_error(format!("Failed to read document id: {}", e)))?
        };

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(document) = load_document(&conn, tenant_id, query.kind, id)? {
                documents.push(document);
            }
        }

        tracing::debug!(
            tenant = %tenant_id,
            kind = %query.kind,
            total,
            returned = documents.len(),
            "Listed documents"
        );

        Ok(SearchPage {
            documents,
            total: total.max(0) as u64,
        })
    }
}
