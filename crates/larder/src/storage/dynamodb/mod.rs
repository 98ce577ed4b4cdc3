//! DynamoDB store implementation.
//!
//! Implements [`StoreClient`](super::store::StoreClient) against one shared
//! table, compiling typed preconditions to condition expressions and update
//! plans to update expressions.

mod error;

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;

use super::store::{
    Item, Key, Precondition, QueryOutput, QueryRequest, StoreClient, StoreError, UpdatePlan,
    ATTR_INDEX, ATTR_PARTITION,
};
use error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_query_error,
    map_update_item_error,
};

const CONDITION_EXISTS: &str = "attribute_exists(PK) AND attribute_exists(SK)";
const CONDITION_NOT_EXISTS: &str = "attribute_not_exists(PK) AND attribute_not_exists(SK)";

/// DynamoDB-backed single-table store.
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    /// Creates a new store with the given client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a new store from environment configuration.
    ///
    /// Uses the AWS SDK default credential chain and reads the table name
    /// from `TABLE_NAME` (defaults to "larder").
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        let table_name = std::env::var("TABLE_NAME").unwrap_or_else(|_| "larder".to_string());
        Self::new(client, table_name)
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

fn condition_expression(precondition: Precondition) -> Option<&'static str> {
    match precondition {
        Precondition::None => None,
        Precondition::MustExist => Some(CONDITION_EXISTS),
        Precondition::MustNotExist => Some(CONDITION_NOT_EXISTS),
    }
}

/// Compile an update plan into an update expression with placeholder maps.
///
/// Attribute names go through `#n` placeholders so reserved words like
/// `name` stay legal in the expression.
fn compile_update_plan(
    plan: &UpdatePlan,
) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    let mut expression = String::new();

    if !plan.assignments().is_empty() {
        let mut clauses = Vec::with_capacity(plan.assignments().len());
        for (position, (name, value)) in plan.assignments().iter().enumerate() {
            let name_placeholder = format!("#s{position}");
            let value_placeholder = format!(":s{position}");
            names.insert(name_placeholder.clone(), name.clone());
            values.insert(value_placeholder.clone(), value.clone());
            clauses.push(format!("{name_placeholder} = {value_placeholder}"));
        }
        expression.push_str("SET ");
        expression.push_str(&clauses.join(", "));
    }

    if !plan.removals().is_empty() {
        let mut clauses = Vec::with_capacity(plan.removals().len());
        for (position, name) in plan.removals().iter().enumerate() {
            let name_placeholder = format!("#r{position}");
            names.insert(name_placeholder.clone(), name.clone());
            clauses.push(name_placeholder);
        }
        if !expression.is_empty() {
            expression.push(' ');
        }
        expression.push_str("REMOVE ");
        expression.push_str(&clauses.join(", "));
    }

    (expression, names, values)
}

#[async_trait]
impl StoreClient for DynamoStore {
    async fn get_item(&self, key: Key) -> Result<Option<Item>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(map_get_item_error)?;
        Ok(result.item)
    }

    async fn put_item(&self, item: Item, precondition: Precondition) -> Result<(), StoreError> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item));
        if let Some(condition) = condition_expression(precondition) {
            request = request.condition_expression(condition);
        }
        request.send().await.map_err(map_put_item_error)?;
        Ok(())
    }

    async fn update_item(
        &self,
        key: Key,
        plan: UpdatePlan,
        precondition: Precondition,
    ) -> Result<Item, StoreError> {
        let (expression, names, values) = compile_update_plan(&plan);
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .return_values(ReturnValue::AllNew);
        if !expression.is_empty() {
            request = request
                .update_expression(expression)
                .set_expression_attribute_names(Some(names));
        }
        if !values.is_empty() {
            request = request.set_expression_attribute_values(Some(values));
        }
        if let Some(condition) = condition_expression(precondition) {
            request = request.condition_expression(condition);
        }
        let result = request.send().await.map_err(map_update_item_error)?;
        Ok(result.attributes.unwrap_or_default())
    }

    async fn delete_item(&self, key: Key) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(map_delete_item_error)?;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryOutput, StoreError> {
        let key_attribute = match request.index_name {
            Some(_) => ATTR_INDEX,
            None => ATTR_PARTITION,
        };
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_index_name(request.index_name)
            .key_condition_expression("#pk = :pk")
            .expression_attribute_names("#pk", key_attribute)
            .expression_attribute_values(":pk", AttributeValue::S(request.partition))
            .limit(request.limit)
            .scan_index_forward(request.scan_forward)
            .set_exclusive_start_key(request.exclusive_start_key)
            .send()
            .await
            .map_err(map_query_error)?;
        Ok(QueryOutput {
            items: result.items.unwrap_or_default(),
            last_evaluated_key: result.last_evaluated_key,
        })
    }
}
