//! List query building
//!
//! Translates "page N, sorted by X, filtered by keyword Y" into the query
//! parameters the control plane understands:
//!
//! ```text
//! GET <collection>?labelSelector=..&paging=limit=<n>,page=<p>&conditions=<expr>&orderBy=<field>&reverse=true
//! ```
//!
//! Every parameter is independently omittable.

use serde::{Deserialize, Serialize};

/// Default page size used when a caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Page size of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Limit {
    /// Server-side paging with the given page size.
    Paged(u32),
    /// No server-side paging: the `paging` parameter is left out entirely.
    Unlimited,
}

impl Default for Limit {
    fn default() -> Self {
        Self::Paged(DEFAULT_LIMIT)
    }
}

impl Limit {
    /// Whether this limit suppresses server-side paging.
    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

/// How a single filter condition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// `field=value`
    Exact,
    /// `field~value`
    Fuzzy,
}

/// One `field=value` / `field~value` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub value: String,
    pub mode: MatchMode,
}

/// Comma-joined filter expression sent as the `conditions` parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterExpression {
    conditions: Vec<Condition>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text keyword search: a fuzzy match on the resource name.
    pub fn from_keyword(keyword: &str) -> Self {
        Self::new().fuzzy("name", keyword)
    }

    #[must_use]
    pub fn exact(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            value: value.into(),
            mode: MatchMode::Exact,
        });
        self
    }

    #[must_use]
    pub fn fuzzy(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            value: value.into(),
            mode: MatchMode::Fuzzy,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl std::fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let op = match c.mode {
                MatchMode::Exact => '=',
                MatchMode::Fuzzy => '~',
            };
            write!(f, "{}{op}{}", c.field, c.value)?;
        }
        Ok(())
    }
}

/// Parameters of one list request.
///
/// `page` and `limit` are passed through untouched: the server decides what
/// an out-of-range page means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Limit,
    /// Page number (1-indexed).
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default)]
    pub reverse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Kubernetes label selector for collections filtered by label rather than by path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: Limit::default(),
            page: 1,
            order: None,
            reverse: false,
            keyword: None,
            label_selector: None,
        }
    }
}

impl ListQuery {
    /// Build the ordered query parameter list.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(selector) = self.label_selector.as_deref().filter(|s| !s.is_empty()) {
            params.push(("labelSelector".to_string(), selector.to_string()));
        }

        if let Limit::Paged(limit) = self.limit {
            params.push((
                "paging".to_string(),
                format!("limit={limit},page={}", self.page),
            ));
        }

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            params.push((
                "conditions".to_string(),
                FilterExpression::from_keyword(keyword).to_string(),
            ));
        }

        if let Some(order) = self.order.as_deref().filter(|o| !o.is_empty()) {
            params.push(("orderBy".to_string(), order.to_string()));
        }

        if self.reverse {
            params.push(("reverse".to_string(), "true".to_string()));
        }

        params
    }
}

/// Render query parameters as a URL-encoded query string (without the `?`).
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
