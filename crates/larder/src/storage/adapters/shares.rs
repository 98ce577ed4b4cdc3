//! Share request adapter.
//!
//! A pending request lives in the requester's partition and carries a
//! secondary index entry under the approver so the approver can find it.
//! The approval transition clears that index entry and the TTL, and records
//! the approver's account id.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{
    ApprovalStatus, PartitionKey, ResourceKind, ShareRequestInput, ShareRequestRecord,
};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::{attr_of, ResourceAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::{StoreClient, UpdatePlan, ATTR_INDEX};

pub struct ShareRequestAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<ShareRequestAdapter> {
    Repository::new(store, ShareRequestAdapter)
}

impl ResourceAdapter for ShareRequestAdapter {
    type Record = ShareRequestRecord;
    type Input = ShareRequestInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ShareRequest
    }

    fn on_create(
        &self,
        input: ShareRequestInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<ShareRequestRecord> {
        let requester = input
            .requester
            .ok_or_else(|| RepositoryError::invalid_input("share requester is required"))?;
        let approval_status = input
            .approval_status
            .ok_or_else(|| RepositoryError::invalid_input("share approval status is required"))?;
        // Only a pending request is indexed under the approver; mirrors and
        // rejected records are reachable from their own partitions alone.
        let first_index = match (approval_status, &input.approver) {
            (ApprovalStatus::Requested, Some(approver)) => {
                Some(format!("{}:{}", approver, self.kind().as_str()))
            }
            (ApprovalStatus::Requested, None) => Some(self.kind().as_str().to_string()),
            _ => None,
        };
        Ok(ShareRequestRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            first_index,
            requester,
            requester_id: input.requester_id.unwrap_or_else(|| account_id.to_string()),
            approver: input.approver,
            approver_id: input.approver_id,
            approval_status,
            expires_in: input.expires_in,
            create_time: now,
            update_time: now,
        })
    }

    fn on_update(&self, input: &ShareRequestInput, plan: &mut UpdatePlan) -> Result<()> {
        if let Some(approval_status) = &input.approval_status {
            plan.set("approvalStatus", attr_of(approval_status)?);
            plan.remove(ATTR_INDEX);
            if *approval_status == ApprovalStatus::Approved {
                if let Some(approver_id) = &input.approver_id {
                    plan.set("approverId", attr_of(approver_id)?);
                }
                plan.remove("expiresIn");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_input() -> ShareRequestInput {
        ShareRequestInput {
            requester: Some("me@example.com".to_string()),
            approver: Some("friend@example.com".to_string()),
            approval_status: Some(ApprovalStatus::Requested),
            expires_in: Some(1_700_000_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_pending_request_indexed_under_approver() {
        let record = ShareRequestAdapter
            .on_create(pending_input(), Utc::now(), "acct-a", "share-1")
            .unwrap();
        assert_eq!(
            record.first_index.as_deref(),
            Some("friend@example.com:ShareRequest")
        );
        assert_eq!(record.requester_id, "acct-a");
        assert!(record.approver_id.is_none());
        assert!(record.expires_in.is_some());
    }

    #[test]
    fn test_approved_mirror_has_no_index_entry() {
        let record = ShareRequestAdapter
            .on_create(
                ShareRequestInput {
                    requester: Some("me@example.com".to_string()),
                    requester_id: Some("acct-a".to_string()),
                    approver: Some("friend@example.com".to_string()),
                    approver_id: Some("acct-b".to_string()),
                    approval_status: Some(ApprovalStatus::Approved),
                    ..Default::default()
                },
                Utc::now(),
                "acct-b",
                "share-1",
            )
            .unwrap();
        assert!(record.first_index.is_none());
        assert!(record.expires_in.is_none());
        assert_eq!(record.requester_id, "acct-a");
        assert_eq!(record.pk, "acct-b:ShareRequest");
    }

    #[test]
    fn test_approval_clears_index_and_ttl() {
        let mut plan = UpdatePlan::default();
        ShareRequestAdapter
            .on_update(
                &ShareRequestInput {
                    approval_status: Some(ApprovalStatus::Approved),
                    approver_id: Some("acct-b".to_string()),
                    ..Default::default()
                },
                &mut plan,
            )
            .unwrap();
        let set_fields: Vec<_> = plan
            .assignments()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(set_fields, ["approvalStatus", "approverId"]);
        assert_eq!(
            plan.removals(),
            ["GS1-PK".to_string(), "expiresIn".to_string()]
        );
    }

    #[test]
    fn test_rejection_clears_index_but_keeps_ttl() {
        let mut plan = UpdatePlan::default();
        ShareRequestAdapter
            .on_update(
                &ShareRequestInput {
                    approval_status: Some(ApprovalStatus::Rejected),
                    ..Default::default()
                },
                &mut plan,
            )
            .unwrap();
        assert_eq!(plan.assignments().len(), 1);
        assert_eq!(plan.removals(), ["GS1-PK".to_string()]);
    }
}
