//! Item-level store seam.
//!
//! Abstracts the single shared table at the attribute-map level so the
//! generic repository engine and the change-stream handlers are written once
//! against this trait, with a DynamoDB implementation for production and an
//! in-memory implementation for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use thiserror::Error;

/// Attribute name of the table's partition key.
pub const ATTR_PARTITION: &str = "PK";
/// Attribute name of the table's sort key.
pub const ATTR_SORT: &str = "SK";
/// Attribute name of the secondary index partition key.
pub const ATTR_INDEX: &str = "GS1-PK";

/// One stored item.
pub type Item = HashMap<String, AttributeValue>;
/// A primary key (partition + sort attributes).
pub type Key = HashMap<String, AttributeValue>;

/// Builds a primary key map from its two components.
pub fn item_key(partition: impl Into<String>, sort: impl Into<String>) -> Key {
    let mut key = HashMap::with_capacity(2);
    key.insert(
        ATTR_PARTITION.to_string(),
        AttributeValue::S(partition.into()),
    );
    key.insert(ATTR_SORT.to_string(), AttributeValue::S(sort.into()));
    key
}

/// Existence condition attached to a write.
///
/// The store's single-item conditional write is the only concurrency-control
/// mechanism in this core; every guarded semantic (create-if-absent,
/// update-if-present, refresh-only replication) compiles down to one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional write.
    None,
    /// Both key components must already exist.
    MustExist,
    /// Both key components must be absent.
    MustNotExist,
}

/// Accumulated SET / REMOVE assignments for a partial update.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    set: Vec<(String, AttributeValue)>,
    remove: Vec<String>,
}

impl UpdatePlan {
    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.set.push((name.into(), value));
    }

    pub fn remove(&mut self, name: impl Into<String>) {
        self.remove.push(name.into());
    }

    pub fn assignments(&self) -> &[(String, AttributeValue)] {
        &self.set
    }

    pub fn removals(&self) -> &[String] {
        &self.remove
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// A range query against the primary partition or the secondary index.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Partition value to match (`PK`, or `GS1-PK` when `index_name` is set).
    pub partition: String,
    pub index_name: Option<String>,
    pub limit: i32,
    pub scan_forward: bool,
    pub exclusive_start_key: Option<Key>,
}

/// One page of query results plus the store's native continuation key.
#[derive(Debug, Default)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Key>,
}

/// Errors surfaced by a store implementation.
///
/// Condition failures are distinguished so callers can map them to their own
/// semantics (`Conflict`, `NotFound`, or "already replicated, skip").
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conditional check failed")]
    ConditionFailed,
    #[error("store operation failed: {0}")]
    Other(String),
}

/// Async item-level access to the shared table.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Point read; `None` when the item is absent.
    async fn get_item(&self, key: Key) -> Result<Option<Item>, StoreError>;

    /// Full-item write guarded by `precondition`.
    async fn put_item(&self, item: Item, precondition: Precondition) -> Result<(), StoreError>;

    /// Partial update guarded by `precondition`, returning the full item as
    /// it stands after the update.
    async fn update_item(
        &self,
        key: Key,
        plan: UpdatePlan,
        precondition: Precondition,
    ) -> Result<Item, StoreError>;

    /// Unconditional delete; absence is not an error.
    async fn delete_item(&self, key: Key) -> Result<(), StoreError>;

    /// Range query by partition value, honoring limit, direction, and the
    /// exclusive start key.
    async fn query(&self, request: QueryRequest) -> Result<QueryOutput, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_shape() {
        let key = item_key("a:Recipe", "id-1");
        assert_eq!(key.len(), 2);
        assert_eq!(
            key.get(ATTR_PARTITION),
            Some(&AttributeValue::S("a:Recipe".to_string()))
        );
        assert_eq!(
            key.get(ATTR_SORT),
            Some(&AttributeValue::S("id-1".to_string()))
        );
    }

    #[test]
    fn test_update_plan_accumulates() {
        let mut plan = UpdatePlan::default();
        assert!(plan.is_empty());
        plan.set("name", AttributeValue::S("Stew".to_string()));
        plan.remove("expiresIn");
        assert_eq!(plan.assignments().len(), 1);
        assert_eq!(plan.removals(), ["expiresIn".to_string()]);
        assert!(!plan.is_empty());
    }
}
