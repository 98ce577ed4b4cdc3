//! Cross-account replication.
//!
//! Copies a shareable resource's image into every approved collaborator's
//! partition: once when the owner creates it, and again whenever the owner
//! rotates its update token. The relationship scan is paged but the total
//! write fan-out is one conditional put per collaborator per triggering
//! mutation.

use std::sync::Arc;

use async_trait::async_trait;

use larder_core::resource::{
    ApprovalStatus, PartitionKey, ResourceKind, SETTINGS_ITEM_ID,
};
use larder_core::storage::{QueryParams, RepositoryError, Result};

use crate::storage::adapters::settings::{self, SettingsAdapter};
use crate::storage::adapters::shares::{self, ShareRequestAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::{
    Item, Precondition, StoreClient, StoreError, ATTR_PARTITION,
};

use super::dispatcher::ChangeHandler;
use super::record::{ChangeRecord, EventKind, StreamAttribute, StreamImage};

const SHARED_FLAG: &str = "shared";
const UPDATE_TOKEN: &str = "updateToken";

fn is_shareable(kind: ResourceKind) -> bool {
    matches!(kind, ResourceKind::Recipe | ResourceKind::ShoppingList)
}

/// Rewrite an owner's image for a collaborator's partition: same kind and
/// item id under the collaborator's account, with the shared flag forced
/// true so copies are never re-replicated.
fn rewrite_image(counterparty: &str, image: &StreamImage) -> Result<Item> {
    let mut item = Item::with_capacity(image.len() + 1);
    for (field, value) in image {
        if field == ATTR_PARTITION {
            let partition = value
                .as_s()
                .and_then(PartitionKey::parse)
                .ok_or_else(|| {
                    RepositoryError::invalid_input("image has no parseable partition key")
                })?;
            item.insert(
                field.clone(),
                aws_sdk_dynamodb::types::AttributeValue::S(
                    PartitionKey::new(counterparty, partition.kind).encode(),
                ),
            );
        } else if field == SHARED_FLAG {
            continue;
        } else {
            item.insert(field.clone(), value.to_attribute_value()?);
        }
    }
    item.insert(
        SHARED_FLAG.to_string(),
        aws_sdk_dynamodb::types::AttributeValue::Bool(true),
    );
    Ok(item)
}

/// Shared scan-and-copy machinery for both replication paths.
struct ReplicationEngine {
    store: Arc<dyn StoreClient>,
    settings: Repository<SettingsAdapter>,
    shares: Repository<ShareRequestAdapter>,
    page_size: i32,
}

impl ReplicationEngine {
    fn new(store: Arc<dyn StoreClient>, page_size: i32) -> Self {
        Self {
            settings: settings::repository(store.clone()),
            shares: shares::repository(store.clone()),
            store,
            page_size,
        }
    }

    /// Owner's auto-share preference for the kind; absent settings mean
    /// sharing was never enabled.
    async fn auto_share_enabled(&self, owner: &str, kind: ResourceKind) -> Result<bool> {
        match self.settings.get(owner, SETTINGS_ITEM_ID).await {
            Ok(settings) => Ok(match kind {
                ResourceKind::Recipe => settings.auto_share_recipes,
                ResourceKind::ShoppingList => settings.auto_share_lists,
                _ => false,
            }),
            Err(RepositoryError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Page through the owner's approved relationships and write one
    /// conditional copy per counterparty. A condition failure on an
    /// individual copy is skipped; any other store error aborts the scan.
    async fn replicate(
        &self,
        owner: &PartitionKey,
        image: &StreamImage,
        precondition: Precondition,
    ) -> Result<()> {
        if !self
            .auto_share_enabled(&owner.account_id, owner.kind)
            .await?
        {
            return Ok(());
        }
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .shares
                .list(
                    &owner.account_id,
                    QueryParams {
                        limit: Some(self.page_size),
                        next_token: next_token.clone(),
                        ..Default::default()
                    },
                )
                .await?;
            for share in &page.items {
                if share.approval_status != ApprovalStatus::Approved {
                    continue;
                }
                let counterparty = if share
                    .requester_id
                    .eq_ignore_ascii_case(&owner.account_id)
                {
                    share.approver_id.clone()
                } else {
                    Some(share.requester_id.clone())
                };
                let Some(counterparty) = counterparty else {
                    continue;
                };
                let copy = rewrite_image(&counterparty, image)?;
                match self.store.put_item(copy, precondition).await {
                    Ok(()) => {}
                    // Already replicated (create path) or never replicated
                    // (update path); either way this counterparty is done.
                    Err(StoreError::ConditionFailed) => continue,
                    Err(err) => return Err(RepositoryError::Store(err.to_string())),
                }
            }
            next_token = page.next_token;
            if next_token.is_none() {
                return Ok(());
            }
        }
    }
}

/// Copies a newly created shareable resource to every approved collaborator.
pub struct ReplicateOnCreate {
    engine: ReplicationEngine,
}

impl ReplicateOnCreate {
    pub fn new(store: Arc<dyn StoreClient>, page_size: i32) -> Self {
        Self {
            engine: ReplicationEngine::new(store, page_size),
        }
    }
}

#[async_trait]
impl ChangeHandler for ReplicateOnCreate {
    fn name(&self) -> &'static str {
        "replicate-on-create"
    }

    fn filter(&self, record: &ChangeRecord) -> bool {
        if record.event_kind != EventKind::Insert {
            return false;
        }
        let Some(partition) = record.partition() else {
            return false;
        };
        if !is_shareable(partition.kind) {
            return false;
        }
        // Replicated copies arrive with the shared flag already true and
        // must not fan out again.
        !record
            .new_image
            .as_ref()
            .and_then(|image| image.get(SHARED_FLAG))
            .and_then(StreamAttribute::as_bool)
            .unwrap_or(false)
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<()> {
        let partition = record
            .partition()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no partition key"))?;
        let image = record
            .new_image
            .as_ref()
            .ok_or_else(|| RepositoryError::invalid_input("insert record has no new image"))?;
        self.engine
            .replicate(&partition, image, Precondition::MustNotExist)
            .await
    }
}

/// Refreshes existing collaborator copies when the owner rotates the update
/// token. The conditioned put can only overwrite a copy that replication
/// previously created, never originate one.
pub struct ReplicateOnUpdate {
    engine: ReplicationEngine,
}

impl ReplicateOnUpdate {
    pub fn new(store: Arc<dyn StoreClient>, page_size: i32) -> Self {
        Self {
            engine: ReplicationEngine::new(store, page_size),
        }
    }
}

#[async_trait]
impl ChangeHandler for ReplicateOnUpdate {
    fn name(&self) -> &'static str {
        "replicate-on-update"
    }

    fn filter(&self, record: &ChangeRecord) -> bool {
        if record.event_kind != EventKind::Modify {
            return false;
        }
        let Some(partition) = record.partition() else {
            return false;
        };
        if !is_shareable(partition.kind) {
            return false;
        }
        // The caller-rotated token is the sole "changed materially" signal;
        // a touch that does not rotate it replicates nothing.
        match record.old_string(UPDATE_TOKEN) {
            None => true,
            Some(old_token) => record.new_string(UPDATE_TOKEN) != Some(old_token),
        }
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<()> {
        let partition = record
            .partition()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no partition key"))?;
        let image = record
            .new_image
            .as_ref()
            .ok_or_else(|| RepositoryError::invalid_input("modify record has no new image"))?;
        self.engine
            .replicate(&partition, image, Precondition::MustExist)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn modify_record(old_token: Option<&str>, new_token: Option<&str>) -> ChangeRecord {
        let mut keys = HashMap::new();
        keys.insert(
            "PK".to_string(),
            StreamAttribute::S("acct:ShoppingList".to_string()),
        );
        keys.insert("SK".to_string(), StreamAttribute::S("list-1".to_string()));
        let mut old_image = keys.clone();
        if let Some(token) = old_token {
            old_image.insert(UPDATE_TOKEN.to_string(), StreamAttribute::S(token.into()));
        }
        let mut new_image = keys.clone();
        if let Some(token) = new_token {
            new_image.insert(UPDATE_TOKEN.to_string(), StreamAttribute::S(token.into()));
        }
        ChangeRecord {
            event_kind: EventKind::Modify,
            keys,
            old_image: Some(old_image),
            new_image: Some(new_image),
        }
    }

    #[tokio::test]
    async fn test_update_filter_requires_rotated_token() {
        let store = Arc::new(crate::storage::memory::MemoryStore::new());
        let handler = ReplicateOnUpdate::new(store, 100);
        assert!(!handler.filter(&modify_record(Some("abc-123"), Some("abc-123"))));
        assert!(handler.filter(&modify_record(Some("abc-123"), Some("def-456"))));
        // A record that never carried a token replicates on any modify.
        assert!(handler.filter(&modify_record(None, Some("abc-123"))));
    }

    #[tokio::test]
    async fn test_create_filter_skips_replicated_copies() {
        let store = Arc::new(crate::storage::memory::MemoryStore::new());
        let handler = ReplicateOnCreate::new(store, 100);
        let mut keys = HashMap::new();
        keys.insert(
            "PK".to_string(),
            StreamAttribute::S("acct:Recipe".to_string()),
        );
        keys.insert("SK".to_string(), StreamAttribute::S("r-1".to_string()));
        let mut shared_image = keys.clone();
        shared_image.insert(SHARED_FLAG.to_string(), StreamAttribute::Bool(true));
        let shared = ChangeRecord {
            event_kind: EventKind::Insert,
            keys: keys.clone(),
            old_image: None,
            new_image: Some(shared_image),
        };
        assert!(!handler.filter(&shared));

        let mut unshared_image = keys.clone();
        unshared_image.insert(SHARED_FLAG.to_string(), StreamAttribute::Bool(false));
        let unshared = ChangeRecord {
            event_kind: EventKind::Insert,
            keys,
            old_image: None,
            new_image: Some(unshared_image),
        };
        assert!(handler.filter(&unshared));
    }

    #[test]
    fn test_rewrite_image_swaps_partition_and_forces_shared() {
        let mut image = StreamImage::new();
        image.insert(
            "PK".to_string(),
            StreamAttribute::S("owner:Recipe".to_string()),
        );
        image.insert("SK".to_string(), StreamAttribute::S("r-1".to_string()));
        image.insert("name".to_string(), StreamAttribute::S("Stew".to_string()));
        image.insert(SHARED_FLAG.to_string(), StreamAttribute::Bool(false));
        let item = rewrite_image("friend", &image).unwrap();
        assert_eq!(
            item.get("PK"),
            Some(&aws_sdk_dynamodb::types::AttributeValue::S(
                "friend:Recipe".to_string()
            ))
        );
        assert_eq!(
            item.get(SHARED_FLAG),
            Some(&aws_sdk_dynamodb::types::AttributeValue::Bool(true))
        );
        assert_eq!(
            item.get("SK"),
            Some(&aws_sdk_dynamodb::types::AttributeValue::S("r-1".to_string()))
        );
    }
}
