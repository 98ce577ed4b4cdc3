//! Generic repository engine.
//!
//! Maps typed records onto the shared table through a derived composite key,
//! with existence-conditioned create/update semantics and account-bound
//! encrypted pagination. Write-write races resolve entirely through the
//! store's single-item conditional write; no client-side locking exists
//! because each logical record lives behind exactly one key.

use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use uuid::Uuid;

use larder_core::resource::PartitionKey;
use larder_core::storage::{QueryParams, QueryResults, RepositoryError, Result};

use super::adapter::ResourceAdapter;
use super::attrs::{from_item, to_item};
use super::cursor;
use super::store::{
    item_key, Precondition, QueryRequest, StoreClient, StoreError, UpdatePlan,
};

/// Typed access to one resource kind in the shared table.
pub struct Repository<A: ResourceAdapter> {
    store: Arc<dyn StoreClient>,
    adapter: A,
}

fn store_err(err: StoreError) -> RepositoryError {
    RepositoryError::Store(err.to_string())
}

impl<A: ResourceAdapter> Repository<A> {
    pub fn new(store: Arc<dyn StoreClient>, adapter: A) -> Self {
        Self { store, adapter }
    }

    fn partition(&self, account_id: &str) -> PartitionKey {
        PartitionKey::new(account_id, self.adapter.kind())
    }

    fn resource(&self) -> &'static str {
        self.adapter.kind().as_str()
    }

    /// Point read by derived key.
    pub async fn get(&self, account_id: &str, item_id: &str) -> Result<A::Record> {
        let key = item_key(self.partition(account_id).encode(), item_id);
        let item = self.store.get_item(key).await.map_err(store_err)?;
        match item {
            Some(item) => from_item(&item),
            None => Err(RepositoryError::not_found(self.resource(), item_id)),
        }
    }

    /// Create under a fresh random item id.
    pub async fn create(&self, account_id: &str, input: A::Input) -> Result<A::Record> {
        let item_id = Uuid::new_v4().to_string();
        self.create_with_id(account_id, input, &item_id).await
    }

    /// Create under a caller-chosen item id, conditioned on both key
    /// components being absent.
    pub async fn create_with_id(
        &self,
        account_id: &str,
        input: A::Input,
        item_id: &str,
    ) -> Result<A::Record> {
        let record = self
            .adapter
            .on_create(input, Utc::now(), account_id, item_id)?;
        let item = to_item(&record)?;
        match self.store.put_item(item, Precondition::MustNotExist).await {
            Ok(()) => Ok(record),
            Err(StoreError::ConditionFailed) => {
                Err(RepositoryError::conflict(self.resource(), item_id))
            }
            Err(err) => Err(store_err(err)),
        }
    }

    /// Partial update conditioned on both key components being present.
    ///
    /// The `updateTime` bump is unconditional; everything else comes from
    /// the adapter's merge of the non-absent input fields.
    pub async fn update(
        &self,
        account_id: &str,
        item_id: &str,
        input: A::Input,
    ) -> Result<A::Record> {
        let mut plan = UpdatePlan::default();
        plan.set(
            "updateTime",
            AttributeValue::S(Utc::now().to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
        );
        self.adapter.on_update(&input, &mut plan)?;
        let key = item_key(self.partition(account_id).encode(), item_id);
        match self
            .store
            .update_item(key, plan, Precondition::MustExist)
            .await
        {
            Ok(item) => from_item(&item),
            Err(StoreError::ConditionFailed) => {
                Err(RepositoryError::not_found(self.resource(), item_id))
            }
            Err(err) => Err(store_err(err)),
        }
    }

    /// Unconditional, idempotent delete; absence is not an error.
    pub async fn delete(&self, account_id: &str, item_id: &str) -> Result<()> {
        let key = item_key(self.partition(account_id).encode(), item_id);
        self.store.delete_item(key).await.map_err(store_err)
    }

    /// Page through the account's primary partition.
    pub async fn list(
        &self,
        account_id: &str,
        params: QueryParams,
    ) -> Result<QueryResults<A::Record>> {
        self.query_page(account_id, self.partition(account_id).encode(), None, params)
            .await
    }

    /// Page through a secondary index partition derived for this account.
    pub async fn list_by_index(
        &self,
        account_id: &str,
        index_name: &str,
        params: QueryParams,
    ) -> Result<QueryResults<A::Record>> {
        self.query_page(
            account_id,
            self.partition(account_id).encode(),
            Some(index_name.to_string()),
            params,
        )
        .await
    }

    async fn query_page(
        &self,
        account_id: &str,
        partition: String,
        index_name: Option<String>,
        params: QueryParams,
    ) -> Result<QueryResults<A::Record>> {
        let exclusive_start_key = cursor::unmarshal(account_id, params.next_token.as_deref())?;
        let output = self
            .store
            .query(QueryRequest {
                partition,
                index_name,
                limit: params.effective_limit(),
                scan_forward: params.scan_forward(),
                exclusive_start_key,
            })
            .await
            .map_err(store_err)?;
        let items = output
            .items
            .iter()
            .map(from_item)
            .collect::<Result<Vec<_>>>()?;
        let next_token = cursor::marshal(account_id, output.last_evaluated_key.as_ref())?;
        Ok(QueryResults { items, next_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::adapters::recipes;
    use crate::storage::memory::MemoryStore;
    use larder_core::resource::{Ingredient, RecipeInput};
    use larder_core::storage::SortOrder;

    fn recipe_input(name: &str) -> RecipeInput {
        RecipeInput {
            name: Some(name.to_string()),
            instructions: Some("Combine and simmer.".to_string()),
            ingredients: Some(vec![Ingredient {
                name: "Potato".to_string(),
                measurement: "lb".to_string(),
                amount: Some(2.0),
            }]),
            ..Default::default()
        }
    }

    fn repository() -> Repository<recipes::RecipeAdapter> {
        recipes::repository(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let repo = repository();
        let err = repo.get("acct", "nope").await.unwrap_err();
        assert_eq!(err, RepositoryError::not_found("Recipe", "nope"));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let repo = repository();
        let created = repo.create("acct", recipe_input("Stew")).await.unwrap();
        let fetched = repo.get("acct", &created.sk).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.pk, "acct:Recipe");
        assert!(!fetched.shared);
    }

    #[tokio::test]
    async fn test_create_with_id_conflicts_on_second_call() {
        let repo = repository();
        let first = repo
            .create_with_id("acct", recipe_input("Stew"), "fixed-id")
            .await
            .unwrap();
        let err = repo
            .create_with_id("acct", recipe_input("Replacement"), "fixed-id")
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::conflict("Recipe", "fixed-id"));
        // First write is untouched by the losing create.
        let fetched = repo.get("acct", "fixed-id").await.unwrap();
        assert_eq!(fetched.name, first.name);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found_and_writes_nothing() {
        let repo = repository();
        let err = repo
            .update("acct", "ghost", recipe_input("Phantom"))
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::not_found("Recipe", "ghost"));
        assert!(repo.get("acct", "ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_update_merges_only_present_fields() {
        let repo = repository();
        let created = repo.create("acct", recipe_input("Stew")).await.unwrap();
        let updated = repo
            .update(
                "acct",
                &created.sk,
                RecipeInput {
                    name: Some("Hearty Stew".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Hearty Stew");
        assert_eq!(updated.instructions, created.instructions);
        assert!(updated.update_time >= created.update_time);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = repository();
        let created = repo.create("acct", recipe_input("Stew")).await.unwrap();
        repo.delete("acct", &created.sk).await.unwrap();
        // Absence is not an error.
        repo.delete("acct", &created.sk).await.unwrap();
        assert!(repo.get("acct", &created.sk).await.is_err());
    }

    #[tokio::test]
    async fn test_list_paginates_with_opaque_tokens() {
        let repo = repository();
        for i in 0..5 {
            repo.create("acct", recipe_input(&format!("Recipe {i}")))
                .await
                .unwrap();
        }
        let first = repo
            .list(
                "acct",
                QueryParams {
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        let token = first.next_token.expect("more pages remain");

        let second = repo
            .list(
                "acct",
                QueryParams {
                    limit: Some(100),
                    next_token: Some(token),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(second.items.len(), 3);
        assert!(second.next_token.is_none());

        // No overlap across the page boundary.
        let first_ids: Vec<_> = first.items.iter().map(|r| r.sk.clone()).collect();
        assert!(second.items.iter().all(|r| !first_ids.contains(&r.sk)));
    }

    #[tokio::test]
    async fn test_list_rejects_foreign_token() {
        let repo = repository();
        for i in 0..3 {
            repo.create("acct-a", recipe_input(&format!("Recipe {i}")))
                .await
                .unwrap();
        }
        let page = repo
            .list(
                "acct-a",
                QueryParams {
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let token = page.next_token.unwrap();
        let err = repo
            .list(
                "acct-b",
                QueryParams {
                    next_token: Some(token),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_descending_reverses_order() {
        let repo = repository();
        for id in ["a-first", "b-middle", "c-last"] {
            repo.create_with_id("acct", recipe_input(id), id)
                .await
                .unwrap();
        }
        let descending = repo
            .list(
                "acct",
                QueryParams {
                    sort_order: Some(SortOrder::Descending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ids: Vec<_> = descending.items.iter().map(|r| r.sk.as_str()).collect();
        assert_eq!(ids, ["c-last", "b-middle", "a-first"]);
    }

    #[tokio::test]
    async fn test_list_by_index_scopes_to_owning_account() {
        use crate::storage::adapters::tokens;
        use larder_core::resource::{ApiTokenInput, Scope, GLOBAL_ACCOUNT};

        let store = Arc::new(MemoryStore::new());
        let repo = tokens::repository(store);
        for (owner, name) in [("acct-a", "ci"), ("acct-a", "backup"), ("acct-b", "other")] {
            repo.create(
                GLOBAL_ACCOUNT,
                ApiTokenInput {
                    name: Some(name.to_string()),
                    account_id: Some(owner.to_string()),
                    scopes: Some(vec![Scope::RecipeRead]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        // Tokens all live in the global partition; the index partitions them
        // by owning account.
        let global = repo
            .list(GLOBAL_ACCOUNT, QueryParams::default())
            .await
            .unwrap();
        assert_eq!(global.items.len(), 3);
        let owned = repo
            .list_by_index("acct-a", "GS1", QueryParams::default())
            .await
            .unwrap();
        assert_eq!(owned.items.len(), 2);
        assert!(owned.items.iter().all(|token| token.account_id == "acct-a"));
    }

    #[tokio::test]
    async fn test_accounts_do_not_see_each_other() {
        let repo = repository();
        repo.create("acct-a", recipe_input("Mine")).await.unwrap();
        let listed = repo.list("acct-b", QueryParams::default()).await.unwrap();
        assert!(listed.items.is_empty());
    }
}
