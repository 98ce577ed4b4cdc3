//! Site-wide user link maintenance.
//!
//! Subscriptions are per-account, but notification delivery needs to resolve
//! an endpoint back to its owning account without knowing the account up
//! front. Creating a subscription therefore materializes a user link under
//! the global account keyed by the endpoint, and removing the subscription
//! removes the link.

use std::sync::Arc;

use async_trait::async_trait;

use larder_core::resource::{ResourceKind, UserInput, GLOBAL_ACCOUNT};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapters::users::{self, UserAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::StoreClient;

use super::dispatcher::ChangeHandler;
use super::record::{ChangeRecord, EventKind};

pub struct SubscriptionAccounts {
    users: Repository<UserAdapter>,
}

impl SubscriptionAccounts {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            users: users::repository(store),
        }
    }
}

#[async_trait]
impl ChangeHandler for SubscriptionAccounts {
    fn name(&self) -> &'static str {
        "subscription-accounts"
    }

    fn filter(&self, record: &ChangeRecord) -> bool {
        matches!(record.event_kind, EventKind::Insert | EventKind::Remove)
            && record
                .partition()
                .map(|partition| partition.kind == ResourceKind::Subscription)
                .unwrap_or(false)
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<()> {
        let partition = record
            .partition()
            .ok_or_else(|| RepositoryError::invalid_input("change record has no partition key"))?;
        match record.event_kind {
            EventKind::Insert => {
                let endpoint = record.new_string("endpoint").ok_or_else(|| {
                    RepositoryError::invalid_input("subscription image has no endpoint")
                })?;
                let input = UserInput {
                    account_id: Some(partition.account_id.clone()),
                };
                match self
                    .users
                    .create_with_id(GLOBAL_ACCOUNT, input, endpoint)
                    .await
                {
                    Ok(user) => {
                        tracing::info!(endpoint = %user.sk, account = %user.account_id, "created site-wide user link");
                        Ok(())
                    }
                    // Redelivered insert; the link already exists.
                    Err(RepositoryError::Conflict { .. }) => Ok(()),
                    Err(err) => Err(err),
                }
            }
            EventKind::Remove => {
                let endpoint = record.old_string("endpoint").ok_or_else(|| {
                    RepositoryError::invalid_input("subscription image has no endpoint")
                })?;
                self.users.delete(GLOBAL_ACCOUNT, endpoint).await
            }
            EventKind::Modify => Ok(()),
        }
    }
}
