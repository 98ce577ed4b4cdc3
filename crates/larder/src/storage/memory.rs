//! In-memory store implementation.
//!
//! A single-table double for tests, honoring the same contract as the
//! DynamoDB store: conditional writes, secondary index queries, limit, scan
//! direction, and exclusive start keys. Data is not persisted and is lost
//! when the store is dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;

use super::store::{
    item_key, Item, Key, Precondition, QueryOutput, QueryRequest, StoreClient, StoreError,
    ATTR_INDEX, ATTR_PARTITION, ATTR_SORT,
};

/// In-memory single-table store for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<BTreeMap<(String, String), Item>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items, for test assertions.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn string_attr(map: &Item, name: &str) -> Option<String> {
    match map.get(name) {
        Some(AttributeValue::S(value)) => Some(value.clone()),
        _ => None,
    }
}

fn primary_key(map: &Item) -> Result<(String, String), StoreError> {
    let partition = string_attr(map, ATTR_PARTITION)
        .ok_or_else(|| StoreError::Other(format!("missing {ATTR_PARTITION} attribute")))?;
    let sort = string_attr(map, ATTR_SORT)
        .ok_or_else(|| StoreError::Other(format!("missing {ATTR_SORT} attribute")))?;
    Ok((partition, sort))
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_item(&self, key: Key) -> Result<Option<Item>, StoreError> {
        let key = primary_key(&key)?;
        Ok(self.items.read().await.get(&key).cloned())
    }

    async fn put_item(&self, item: Item, precondition: Precondition) -> Result<(), StoreError> {
        let key = primary_key(&item)?;
        let mut items = self.items.write().await;
        let exists = items.contains_key(&key);
        match precondition {
            Precondition::MustExist if !exists => return Err(StoreError::ConditionFailed),
            Precondition::MustNotExist if exists => return Err(StoreError::ConditionFailed),
            _ => {}
        }
        items.insert(key, item);
        Ok(())
    }

    async fn update_item(
        &self,
        key: Key,
        plan: super::store::UpdatePlan,
        precondition: Precondition,
    ) -> Result<Item, StoreError> {
        let (partition, sort) = primary_key(&key)?;
        let mut items = self.items.write().await;
        let exists = items.contains_key(&(partition.clone(), sort.clone()));
        match precondition {
            Precondition::MustExist if !exists => return Err(StoreError::ConditionFailed),
            Precondition::MustNotExist if exists => return Err(StoreError::ConditionFailed),
            _ => {}
        }
        // Absent items are created on unconditioned updates, mirroring the
        // store's native upsert behavior.
        let entry = items
            .entry((partition.clone(), sort.clone()))
            .or_insert_with(|| item_key(partition, sort));
        for (name, value) in plan.assignments() {
            entry.insert(name.clone(), value.clone());
        }
        for name in plan.removals() {
            entry.remove(name);
        }
        Ok(entry.clone())
    }

    async fn delete_item(&self, key: Key) -> Result<(), StoreError> {
        let key = primary_key(&key)?;
        self.items.write().await.remove(&key);
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryOutput, StoreError> {
        let items = self.items.read().await;
        // Matching rows sorted ascending by sort key; BTreeMap iteration
        // already yields that order.
        let mut matched: Vec<Item> = items
            .iter()
            .filter(|((partition, _), item)| match request.index_name {
                Some(_) => {
                    string_attr(item, ATTR_INDEX).as_deref() == Some(request.partition.as_str())
                }
                None => partition == &request.partition,
            })
            .map(|(_, item)| item.clone())
            .collect();
        if request.index_name.is_some() {
            // Index partitions span multiple primary partitions; order by
            // sort key alone, the way the index is keyed.
            matched.sort_by_key(|item| string_attr(item, ATTR_SORT).unwrap_or_default());
        }
        if !request.scan_forward {
            matched.reverse();
        }

        let start = match &request.exclusive_start_key {
            Some(start_key) => {
                let (partition, sort) = primary_key(start_key)?;
                matched
                    .iter()
                    .position(|item| {
                        string_attr(item, ATTR_PARTITION).as_deref() == Some(partition.as_str())
                            && string_attr(item, ATTR_SORT).as_deref() == Some(sort.as_str())
                    })
                    .map(|position| position + 1)
                    .unwrap_or(0)
            }
            None => 0,
        };

        let limit = request.limit.max(0) as usize;
        let page: Vec<Item> = matched.iter().skip(start).take(limit).cloned().collect();
        let consumed = start + page.len();
        let last_evaluated_key = if consumed < matched.len() {
            page.last().map(|item| {
                let mut key = item_key(
                    string_attr(item, ATTR_PARTITION).unwrap_or_default(),
                    string_attr(item, ATTR_SORT).unwrap_or_default(),
                );
                if request.index_name.is_some() {
                    if let Some(index) = item.get(ATTR_INDEX) {
                        key.insert(ATTR_INDEX.to_string(), index.clone());
                    }
                }
                key
            })
        } else {
            None
        };

        Ok(QueryOutput {
            items: page,
            last_evaluated_key,
        })
    }
}
