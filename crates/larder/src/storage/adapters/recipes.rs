//! Recipe adapter.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::resource::{PartitionKey, RecipeInput, RecipeRecord, ResourceKind};
use larder_core::storage::{RepositoryError, Result};

use crate::storage::adapter::{attr_of, ResourceAdapter};
use crate::storage::repository::Repository;
use crate::storage::store::{StoreClient, UpdatePlan};

pub struct RecipeAdapter;

pub fn repository(store: Arc<dyn StoreClient>) -> Repository<RecipeAdapter> {
    Repository::new(store, RecipeAdapter)
}

impl ResourceAdapter for RecipeAdapter {
    type Record = RecipeRecord;
    type Input = RecipeInput;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Recipe
    }

    fn on_create(
        &self,
        input: RecipeInput,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<RecipeRecord> {
        let name = input
            .name
            .ok_or_else(|| RepositoryError::invalid_input("recipe name is required"))?;
        let instructions = input
            .instructions
            .ok_or_else(|| RepositoryError::invalid_input("recipe instructions are required"))?;
        let ingredients = input
            .ingredients
            .ok_or_else(|| RepositoryError::invalid_input("recipe ingredients are required"))?;
        Ok(RecipeRecord {
            pk: PartitionKey::new(account_id, self.kind()).encode(),
            sk: item_id.to_string(),
            name,
            instructions,
            ingredients,
            thumbnail: input.thumbnail,
            recipe_type: input.recipe_type,
            owner: input.owner,
            prepare_time_minutes: input.prepare_time_minutes,
            number_of_servings: input.number_of_servings,
            update_token: input.update_token,
            shared: false,
            create_time: now,
            update_time: now,
        })
    }

    fn on_update(&self, input: &RecipeInput, plan: &mut UpdatePlan) -> Result<()> {
        if let Some(name) = &input.name {
            plan.set("name", attr_of(name)?);
        }
        if let Some(instructions) = &input.instructions {
            plan.set("instructions", attr_of(instructions)?);
        }
        if let Some(ingredients) = &input.ingredients {
            plan.set("ingredients", attr_of(ingredients)?);
        }
        if let Some(prepare_time_minutes) = &input.prepare_time_minutes {
            plan.set("prepareTimeMinutes", attr_of(prepare_time_minutes)?);
        }
        if let Some(number_of_servings) = &input.number_of_servings {
            plan.set("numberOfServings", attr_of(number_of_servings)?);
        }
        if let Some(thumbnail) = &input.thumbnail {
            plan.set("thumbnail", attr_of(thumbnail)?);
        }
        if let Some(recipe_type) = &input.recipe_type {
            plan.set("type", attr_of(recipe_type)?);
        }
        if let Some(update_token) = &input.update_token {
            plan.set("updateToken", attr_of(update_token)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let err = RecipeAdapter
            .on_create(RecipeInput::default(), Utc::now(), "acct", "id-1")
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidInput(_)));
    }

    #[test]
    fn test_created_copies_are_not_shared() {
        let record = RecipeAdapter
            .on_create(
                RecipeInput {
                    name: Some("Stew".to_string()),
                    instructions: Some("Simmer.".to_string()),
                    ingredients: Some(vec![]),
                    update_token: Some("tok-1".to_string()),
                    ..Default::default()
                },
                Utc::now(),
                "acct",
                "id-1",
            )
            .unwrap();
        assert!(!record.shared);
        assert_eq!(record.pk, "acct:Recipe");
        assert_eq!(record.update_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let mut plan = UpdatePlan::default();
        RecipeAdapter
            .on_update(
                &RecipeInput {
                    name: Some("Soup".to_string()),
                    ..Default::default()
                },
                &mut plan,
            )
            .unwrap();
        assert_eq!(plan.assignments().len(), 1);
        assert_eq!(plan.assignments()[0].0, "name");
        assert!(plan.removals().is_empty());
    }
}
