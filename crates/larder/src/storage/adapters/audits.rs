//! Audit entry adapter.
//!
//! Audit records are append-only: created by the audit projector, indexed
//! under the owning account, and pruned by store-native TTL rather than
//! explicit deletion. No update merge exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{AuditInput, AuditRecord, PartitionKey, ResourceKind};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::ResourceAdapter;
use crate::storage::repository::Repository;
use crate::storage::store::StoreClient;

pub struct AuditAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<AuditAdapter> {
    Repository::new(store, AuditAdapter)
}

impl ResourceAdapter for AuditAdapter {
    type Record = AuditRecord;
    type Input = AuditInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Audit
    }

    fn on_create(
        &self,
        input: AuditInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<AuditRecord> {
        let owner = input
            .account_id
            .ok_or_else(|| RepositoryError::invalid_input("audit account id is required"))?;
        let action = input
            .action
            .ok_or_else(|| RepositoryError::invalid_input("audit action is required"))?;
        let resource_id = input
            .resource_id
            .ok_or_else(|| RepositoryError::invalid_input("audit resource id is required"))?;
        let resource_type = input
            .resource_type
            .ok_or_else(|| RepositoryError::invalid_input("audit resource type is required"))?;
        Ok(AuditRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            first_index: format!("{}:{}", owner, self.kind().as_str()),
            resource_id,
            resource_type,
            action,
            new_values: input.new_values,
            old_values: input.old_values,
            expires_in: input.expires_in,
            create_time: now,
            update_time: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_indexes_under_owner() {
        let record = AuditAdapter
            .on_create(
                AuditInput {
                    account_id: Some("acct".to_string()),
                    action: Some("CREATED".to_string()),
                    resource_id: Some("recipe-1".to_string()),
                    resource_type: Some("Recipe".to_string()),
                    expires_in: Some(1_900_000_000_000),
                    ..Default::default()
                },
                Utc::now(),
                "acct",
                "audit-1",
            )
            .unwrap();
        assert_eq!(record.first_index, "acct:Audit");
        assert_eq!(record.action, "CREATED");
    }

    #[test]
    fn test_create_requires_action() {
        let err = AuditAdapter
            .on_create(
                AuditInput {
                    account_id: Some("acct".to_string()),
                    ..Default::default()
                },
                Utc::now(),
                "acct",
                "audit-1",
            )
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidInput(_)));
    }
}
