//! Audit projector.
//!
//! Converts each allow-listed mutation into one immutable audit record under
//! the owning account, with the before/after images flattened into plain
//! value maps. Entries carry a multi-year expiry so history self-prunes via
//! store-native TTL.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use larder_core::resource::{AuditInput, PartitionKey, ResourceKind, GLOBAL_ACCOUNT};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapters::audits;
use crate::storage::adapters::audits::AuditAdapter;
use crate::storage::repository::Repository;
use crate::storage::store::{StoreClient, ATTR_INDEX};

use super::dispatcher::ChangeHandler;
use super::record::{flatten_image, ChangeRecord, EventKind, StreamAttribute};

pub const ACTION_CREATED: &str = "CREATED";
pub const ACTION_UPDATED: &str = "UPDATED";
pub const ACTION_DELETED: &str = "DELETED";

/// Resource kinds whose mutations are audited.
const DEFAULT_ALLOW_LIST: [ResourceKind; 5] = [
    ResourceKind::Recipe,
    ResourceKind::ShoppingList,
    ResourceKind::Settings,
    ResourceKind::ShareRequest,
    ResourceKind::ApiToken,
];

pub struct AuditProjector {
    audits: Repository<AuditAdapter>,
    allowed: Vec<ResourceKind>,
    retention_years: i64,
}

impl AuditProjector {
    pub fn new(store: Arc<dyn StoreClient>, retention_years: i64) -> Self {
        Self {
            audits: audits::repository(store),
            allowed: DEFAULT_ALLOW_LIST.to_vec(),
            retention_years,
        }
    }

    /// Owning account and resource type of the mutated row.
    ///
    /// Resources stored under the global partition carry the real owner in
    /// their secondary index entry; everything else derives from the primary
    /// key.
    fn scope(&self, record: &ChangeRecord) -> Option<PartitionKey> {
        let primary = record.partition()?;
        if primary.account_id == GLOBAL_ACCOUNT {
            if let Some(indexed) = record
                .image()
                .and_then(|image| image.get(ATTR_INDEX))
                .and_then(StreamAttribute::as_s)
                .and_then(PartitionKey::parse)
            {
                return Some(indexed);
            }
        }
        Some(primary)
    }

    fn action(kind: EventKind) -> &'static str {
        match kind {
            EventKind::Insert => ACTION_CREATED,
            EventKind::Modify => ACTION_UPDATED,
            EventKind::Remove => ACTION_DELETED,
        }
    }
}

#[async_trait]
impl ChangeHandler for AuditProjector {
    fn name(&self) -> &'static str {
        "audit-projector"
    }

    fn filter(&self, record: &ChangeRecord) -> bool {
        self.scope(record)
            .map(|scope| self.allowed.contains(&scope.kind))
            .unwrap_or(false)
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<()> {
        let scope = self
            .scope(record)
            .ok_or_else(|| RepositoryError::invalid_input("change record has no partition key"))?;
        let resource_id = record
            .sort_key()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no sort key"))?;
        let action = Self::action(record.event_kind);

        let new_values = record
            .new_image
            .as_ref()
            .map(flatten_image)
            .transpose()?;
        let old_values = record
            .old_image
            .as_ref()
            .map(flatten_image)
            .transpose()?;

        let expires_in = (Utc::now() + Duration::days(365 * self.retention_years))
            .timestamp_millis();

        // The entry id is derived from the mutation itself so a redelivered
        // record lands on the same key and the conditioned create collapses
        // the duplicate.
        let marker = record
            .image()
            .and_then(|image| image.get("updateTime"))
            .and_then(StreamAttribute::as_s)
            .unwrap_or_default();
        let seed = format!(
            "{}:{}:{}:{}:{}",
            scope.account_id,
            scope.kind.as_str(),
            resource_id,
            action,
            marker
        );
        let entry_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string();

        let input = AuditInput {
            account_id: Some(scope.account_id.clone()),
            resource_id: Some(resource_id.to_string()),
            resource_type: Some(scope.kind.as_str().to_string()),
            action: Some(action.to_string()),
            new_values,
            old_values,
            expires_in: Some(expires_in),
        };
        match self
            .audits
            .create_with_id(&scope.account_id, input, &entry_id)
            .await
        {
            Ok(_) => Ok(()),
            // Redelivered record; the entry already exists.
            Err(RepositoryError::Conflict { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use larder_core::storage::QueryParams;
    use std::collections::HashMap;

    fn recipe_record(kind: EventKind) -> ChangeRecord {
        let mut keys = HashMap::new();
        keys.insert(
            "PK".to_string(),
            StreamAttribute::S("acct:Recipe".to_string()),
        );
        keys.insert("SK".to_string(), StreamAttribute::S("recipe-1".to_string()));
        let mut image = HashMap::new();
        image.insert(
            "PK".to_string(),
            StreamAttribute::S("acct:Recipe".to_string()),
        );
        image.insert("SK".to_string(), StreamAttribute::S("recipe-1".to_string()));
        image.insert("name".to_string(), StreamAttribute::S("Stew".to_string()));
        image.insert(
            "updateTime".to_string(),
            StreamAttribute::S("2026-01-01T00:00:00Z".to_string()),
        );
        let (old_image, new_image) = match kind {
            EventKind::Remove => (Some(image), None),
            _ => (None, Some(image)),
        };
        ChangeRecord {
            event_kind: kind,
            keys,
            old_image,
            new_image,
        }
    }

    #[tokio::test]
    async fn test_each_event_kind_maps_to_action() {
        let store = Arc::new(MemoryStore::new());
        let projector = AuditProjector::new(store.clone(), 5);
        for (kind, action) in [
            (EventKind::Insert, "CREATED"),
            (EventKind::Modify, "UPDATED"),
            (EventKind::Remove, "DELETED"),
        ] {
            let record = recipe_record(kind);
            assert!(projector.filter(&record));
            projector.apply(&record).await.unwrap();
            let entries = audits::repository(store.clone())
                .list("acct", QueryParams::default())
                .await
                .unwrap();
            assert!(entries.items.iter().any(|entry| {
                entry.action == action
                    && entry.resource_id == "recipe-1"
                    && entry.resource_type == "Recipe"
            }));
        }
    }

    #[tokio::test]
    async fn test_replay_produces_one_entry() {
        let store = Arc::new(MemoryStore::new());
        let projector = AuditProjector::new(store.clone(), 5);
        let record = recipe_record(EventKind::Insert);
        projector.apply(&record).await.unwrap();
        projector.apply(&record).await.unwrap();
        let entries = audits::repository(store)
            .list("acct", QueryParams::default())
            .await
            .unwrap();
        assert_eq!(entries.items.len(), 1);
        let entry = &entries.items[0];
        assert_eq!(entry.new_values.as_ref().unwrap()["name"], "Stew");
        assert!(entry.expires_in.unwrap() > Utc::now().timestamp_millis());
    }

    #[tokio::test]
    async fn test_unlisted_kind_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let projector = AuditProjector::new(store, 5);
        let mut record = recipe_record(EventKind::Insert);
        record.keys.insert(
            "PK".to_string(),
            StreamAttribute::S("acct:Subscription".to_string()),
        );
        assert!(!projector.filter(&record));
    }

    #[tokio::test]
    async fn test_global_partition_uses_index_scope() {
        let store = Arc::new(MemoryStore::new());
        let projector = AuditProjector::new(store.clone(), 5);
        let mut keys = HashMap::new();
        keys.insert(
            "PK".to_string(),
            StreamAttribute::S("Global:ApiToken".to_string()),
        );
        keys.insert("SK".to_string(), StreamAttribute::S("token-1".to_string()));
        let mut image = keys.clone();
        image.insert(
            "GS1-PK".to_string(),
            StreamAttribute::S("acct:ApiToken".to_string()),
        );
        image.insert("name".to_string(), StreamAttribute::S("ci".to_string()));
        let record = ChangeRecord {
            event_kind: EventKind::Insert,
            keys,
            old_image: None,
            new_image: Some(image),
        };
        assert!(projector.filter(&record));
        projector.apply(&record).await.unwrap();
        // The entry lands under the owning account, not the global literal.
        let entries = audits::repository(store)
            .list("acct", QueryParams::default())
            .await
            .unwrap();
        assert_eq!(entries.items.len(), 1);
        assert_eq!(entries.items[0].resource_type, "ApiToken");
    }
}
