//! Shopping list adapter.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{PartitionKey, ResourceKind, ShoppingListInput, ShoppingListRecord};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::{attr_of, ResourceAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::{StoreClient, UpdatePlan};

pub struct ShoppingListAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<ShoppingListAdapter> {
    Repository::new(store, ShoppingListAdapter)
}

impl ResourceAdapter for ShoppingListAdapter {
    type Record = ShoppingListRecord;
    type Input = ShoppingListInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ShoppingList
    }

    fn on_create(
        &self,
        input: ShoppingListInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<ShoppingListRecord> {
        let name = input
            .name
            .ok_or_else(|| RepositoryError::invalid_input("shopping list name is required"))?;
        Ok(ShoppingListRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            name,
            items: input.items.unwrap_or_default(),
            owner: input.owner,
            expires_in: input.expires_in,
            update_token: input.update_token,
            shared: false,
            create_time: now,
            update_time: now,
        })
    }

    fn on_update(&self, input: &ShoppingListInput, plan: &mut UpdatePlan) -> Result<()> {
        if let Some(name) = &input.name {
            plan.set("name", attr_of(name)?);
        }
        if let Some(items) = &input.items {
            plan.set("items", attr_of(items)?);
        }
        if let Some(expires_in) = &input.expires_in {
            plan.set("expiresIn", attr_of(expires_in)?);
        }
        if let Some(update_token) = &input.update_token {
            plan.set("updateToken", attr_of(update_token)?);
        }
        Ok(())
    }
}
