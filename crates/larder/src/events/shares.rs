//! Share lifecycle maintenance.
//!
//! Once a request is approved, an identical copy must exist in both parties'
//! partitions so either side can list it from its own partition, and
//! deleting either copy must delete the other.

use std::sync::Arc;

use async_trait::async_trait;

use larder_core::resource::{ApprovalStatus, ResourceKind, ShareRequestInput};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapters::shares::{self, ShareRequestAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::StoreClient;

use super::dispatcher::ChangeHandler;
use super::record::{ChangeRecord, EventKind};

const APPROVED: &str = "APPROVED";

fn is_share_request(record: &ChangeRecord) -> bool {
    record
        .partition()
        .map(|partition| partition.kind == ResourceKind::ShareRequest)
        .unwrap_or(false)
}

/// Mirrors an approved request into the approver's partition.
pub struct CopyApprovedShare {
    shares: Repository<ShareRequestAdapter>,
}

impl CopyApprovedShare {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            shares: shares::repository(store),
        }
    }
}

#[async_trait]
impl ChangeHandler for CopyApprovedShare {
    fn name(&self) -> &'static str {
        "copy-approved-share"
    }

    fn filter(&self, record: &ChangeRecord) -> bool {
        record.event_kind == EventKind::Modify
            && is_share_request(record)
            && record.new_string("approverId").is_some()
            && record.new_string("approvalStatus") == Some(APPROVED)
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<()> {
        let partition = record
            .partition()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no partition key"))?;
        let item_id = record
            .sort_key()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no sort key"))?;
        let approver_id = record
            .new_string("approverId")
            .ok_or_else(|| RepositoryError::invalid_input("approved share has no approver id"))?
            .to_string();
        let requester = record
            .new_string("requester")
            .ok_or_else(|| RepositoryError::invalid_input("approved share has no requester"))?
            .to_string();

        let input = ShareRequestInput {
            requester: Some(requester),
            requester_id: Some(partition.account_id),
            approver: record.new_string("approver").map(str::to_string),
            approver_id: Some(approver_id.clone()),
            approval_status: Some(ApprovalStatus::Approved),
            ..Default::default()
        };
        // Mirror creation is keyed by the original item id, so a redelivered
        // approval collapses into the existing copy.
        match self
            .shares
            .create_with_id(&approver_id, input, item_id)
            .await
        {
            Ok(_) => Ok(()),
            Err(RepositoryError::Conflict { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Cascades the deletion of either side's copy to the other side.
pub struct DeleteMirroredShare {
    shares: Repository<ShareRequestAdapter>,
}

impl DeleteMirroredShare {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            shares: shares::repository(store),
        }
    }
}

#[async_trait]
impl ChangeHandler for DeleteMirroredShare {
    fn name(&self) -> &'static str {
        "delete-mirrored-share"
    }

    fn filter(&self, record: &ChangeRecord) -> bool {
        record.event_kind == EventKind::Remove && is_share_request(record)
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<()> {
        let partition = record
            .partition()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no partition key"))?;
        let item_id = record
            .sort_key()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no sort key"))?;
        let Some(requester_id) = record.old_string("requesterId") else {
            // Nothing to cascade without the removed image's ownership.
            return Ok(());
        };

        if requester_id == partition.account_id {
            // The requester's copy went away; drop the approver's mirror if
            // the request ever got one.
            if let Some(approver_id) = record.old_string("approverId") {
                return self.shares.delete(approver_id, item_id).await;
            }
            Ok(())
        } else {
            // The approver's mirror went away; drop the requester's copy.
            self.shares.delete(requester_id, item_id).await
        }
    }
}
