//! Site-wide user link adapter.
//!
//! User links live under the global account with the subscription endpoint
//! as item id, resolving an endpoint back to its owning account.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{PartitionKey, ResourceKind, UserInput, UserRecord};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::ResourceAdapter;
use crate::storage::repository::Repository;
use crate::storage::store::StoreClient;

pub struct UserAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<UserAdapter> {
    Repository::new(store, UserAdapter)
}

impl ResourceAdapter for UserAdapter {
    type Record = UserRecord;
    type Input = UserInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn on_create(
        &self,
        input: UserInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<UserRecord> {
        let owner = input
            .account_id
            .ok_or_else(|| RepositoryError::invalid_input("user account id is required"))?;
        Ok(UserRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            account_id: owner,
            create_time: now,
            update_time: now,
        })
    }
}
