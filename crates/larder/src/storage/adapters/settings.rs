//! Settings adapter.
//!
//! Settings are a singleton per account, stored under the fixed item id
//! [`SETTINGS_ITEM_ID`](larder_core::resource::SETTINGS_ITEM_ID).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{PartitionKey, ResourceKind, SettingsInput, SettingsRecord};
use larder_core::storage::Result;

use crate::storage::adapter::{attr_of, ResourceAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::{StoreClient, UpdatePlan};

pub struct SettingsAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<SettingsAdapter> {
    Repository::new(store, SettingsAdapter)
}

impl ResourceAdapter for SettingsAdapter {
    type Record = SettingsRecord;
    type Input = SettingsInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Settings
    }

    fn on_create(
        &self,
        input: SettingsInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<SettingsRecord> {
        Ok(SettingsRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            auto_share_recipes: input.auto_share_recipes.unwrap_or(false),
            auto_share_lists: input.auto_share_lists.unwrap_or(false),
            create_time: now,
            update_time: now,
        })
    }

    fn on_update(&self, input: &SettingsInput, plan: &mut UpdatePlan) -> Result<()> {
        if let Some(auto_share_recipes) = &input.auto_share_recipes {
            plan.set("autoShareRecipes", attr_of(auto_share_recipes)?);
        }
        if let Some(auto_share_lists) = &input.auto_share_lists {
            plan.set("autoShareLists", attr_of(auto_share_lists)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::resource::SETTINGS_ITEM_ID;

    #[test]
    fn test_create_defaults_to_disabled() {
        let record = SettingsAdapter
            .on_create(
                SettingsInput::default(),
                Utc::now(),
                "acct",
                SETTINGS_ITEM_ID,
            )
            .unwrap();
        assert!(!record.auto_share_recipes);
        assert!(!record.auto_share_lists);
        assert_eq!(record.sk, "Global");
    }

    #[test]
    fn test_update_touches_only_present_flags() {
        let mut plan = UpdatePlan::default();
        SettingsAdapter
            .on_update(
                &SettingsInput {
                    auto_share_recipes: Some(true),
                    auto_share_lists: None,
                },
                &mut plan,
            )
            .unwrap();
        assert_eq!(plan.assignments().len(), 1);
        assert_eq!(plan.assignments()[0].0, "autoShareRecipes");
    }
}
