//! List query parameters and results.

use serde::{Deserialize, Serialize};

/// Maximum (and default) page size for list queries.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Scan direction for a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Parameters for a paged list query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl QueryParams {
    /// Page size clamped to `(0, 100]`, defaulting to 100.
    pub fn effective_limit(&self) -> i32 {
        match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_PAGE_SIZE => limit,
            _ => MAX_PAGE_SIZE,
        }
    }

    /// True unless descending order was explicitly requested.
    pub fn scan_forward(&self) -> bool {
        self.sort_order.unwrap_or_default() == SortOrder::Ascending
    }
}

/// One page of list results, with an opaque continuation token when more
/// pages remain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResults<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_to_max() {
        assert_eq!(QueryParams::default().effective_limit(), 100);
    }

    #[test]
    fn test_limit_clamps_out_of_range_values() {
        let zero = QueryParams {
            limit: Some(0),
            ..Default::default()
        };
        let negative = QueryParams {
            limit: Some(-5),
            ..Default::default()
        };
        let oversized = QueryParams {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(zero.effective_limit(), 100);
        assert_eq!(negative.effective_limit(), 100);
        assert_eq!(oversized.effective_limit(), 100);
    }

    #[test]
    fn test_limit_in_range_passes_through() {
        let params = QueryParams {
            limit: Some(25),
            ..Default::default()
        };
        assert_eq!(params.effective_limit(), 25);
    }

    #[test]
    fn test_scan_forward_default_and_descending() {
        assert!(QueryParams::default().scan_forward());
        let descending = QueryParams {
            sort_order: Some(SortOrder::Descending),
            ..Default::default()
        };
        assert!(!descending.scan_forward());
    }
}
