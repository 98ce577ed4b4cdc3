//! API token adapter.
//!
//! Tokens are created under the global partition with the owning account in
//! a regular field and in the secondary index entry, so authentication
//! lookups are not keyed by the mutating account.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{ApiTokenInput, ApiTokenRecord, PartitionKey, ResourceKind};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::{attr_of, ResourceAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::{StoreClient, UpdatePlan};

pub struct ApiTokenAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<ApiTokenAdapter> {
    Repository::new(store, ApiTokenAdapter)
}

impl ResourceAdapter for ApiTokenAdapter {
    type Record = ApiTokenRecord;
    type Input = ApiTokenInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ApiToken
    }

    fn on_create(
        &self,
        input: ApiTokenInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<ApiTokenRecord> {
        let name = input
            .name
            .ok_or_else(|| RepositoryError::invalid_input("token name is required"))?;
        let owner = input
            .account_id
            .ok_or_else(|| RepositoryError::invalid_input("token account id is required"))?;
        let scopes = input
            .scopes
            .ok_or_else(|| RepositoryError::invalid_input("token scopes are required"))?;
        Ok(ApiTokenRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            first_index: format!("{}:{}", owner, self.kind().as_str()),
            account_id: owner,
            name,
            scopes,
            claims: input.claims,
            expires_in: input.expires_in,
            create_time: now,
            update_time: now,
        })
    }

    fn on_update(&self, input: &ApiTokenInput, plan: &mut UpdatePlan) -> Result<()> {
        if let Some(name) = &input.name {
            plan.set("name", attr_of(name)?);
        }
        if let Some(expires_in) = &input.expires_in {
            plan.set("expiresIn", attr_of(expires_in)?);
        }
        Ok(())
    }
}
