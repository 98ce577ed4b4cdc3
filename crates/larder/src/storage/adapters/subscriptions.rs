//! Notification subscription adapter.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{PartitionKey, ResourceKind, SubscriptionInput, SubscriptionRecord};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::ResourceAdapter;
use crate::storage::repository::Repository;
use crate::storage::store::StoreClient;

pub struct SubscriptionAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<SubscriptionAdapter> {
    Repository::new(store, SubscriptionAdapter)
}

impl ResourceAdapter for SubscriptionAdapter {
    type Record = SubscriptionRecord;
    type Input = SubscriptionInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Subscription
    }

    fn on_create(
        &self,
        input: SubscriptionInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<SubscriptionRecord> {
        let endpoint = input
            .endpoint
            .ok_or_else(|| RepositoryError::invalid_input("subscription endpoint is required"))?;
        let protocol = input
            .protocol
            .ok_or_else(|| RepositoryError::invalid_input("subscription protocol is required"))?;
        Ok(SubscriptionRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            endpoint,
            protocol,
            subscriber_arn: input.subscriber_arn,
            create_time: now,
            update_time: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_endpoint() {
        let err = SubscriptionAdapter
            .on_create(
                SubscriptionInput {
                    protocol: Some("email".to_string()),
                    ..Default::default()
                },
                Utc::now(),
                "acct",
                "sub-1",
            )
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidInput(_)));
    }
}
