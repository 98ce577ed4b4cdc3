//! Stored-record shapes for every resource kind.
//!
//! Field names mirror the table's attribute names (camelCase, with the key
//! attributes `PK`/`SK`/`GS1-PK`), so a record serializes straight into the
//! stored item shape. Timestamps are RFC 3339 strings; TTL fields are epoch
//! milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item id of the per-account settings singleton.
pub const SETTINGS_ITEM_ID: &str = "Global";

/// One ingredient line on a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub measurement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// A per-account recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub name: String,
    pub instructions: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub recipe_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare_time_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_servings: Option<i64>,
    /// Rotated by callers to signal a material change worth replicating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,
    /// True only on copies written by the replication engine.
    pub shared: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// One line item on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub completed: bool,
}

/// A per-account shopping list, optionally expiring via store-native TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub name: String,
    pub items: Vec<ShoppingListItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,
    pub shared: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Per-account sharing preferences, stored as a singleton item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub auto_share_recipes: bool,
    pub auto_share_lists: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Lifecycle state of a share relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Requested,
    Approved,
    Rejected,
}

/// A share relationship between two accounts.
///
/// While pending, the record lives in the requester's partition with a
/// secondary index entry under the approver so the approver can find it.
/// Approval clears the index entry and the TTL, records the approver's
/// account, and an identical copy is mirrored into the approver's partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequestRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "GS1-PK", skip_serializing_if = "Option::is_none")]
    pub first_index: Option<String>,
    pub requester: String,
    pub requester_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_id: Option<String>,
    pub approval_status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// An append-only audit entry derived from one committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "GS1-PK")]
    pub first_index: String,
    pub resource_id: String,
    pub resource_type: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_values: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_values: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Access scopes grantable to an API token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "recipes.readonly")]
    RecipeRead,
    #[serde(rename = "recipes")]
    RecipeWrite,
    #[serde(rename = "lists.readonly")]
    ListRead,
    #[serde(rename = "lists")]
    ListWrite,
    #[serde(rename = "settings.readonly")]
    SettingsRead,
    #[serde(rename = "settings")]
    SettingsWrite,
    #[serde(rename = "shares.readonly")]
    ShareRead,
    #[serde(rename = "shares")]
    ShareWrite,
    #[serde(rename = "audits.readonly")]
    AuditRead,
    #[serde(rename = "audits")]
    AuditWrite,
    #[serde(rename = "subscriptions.readonly")]
    SubscriptionRead,
    #[serde(rename = "subscriptions")]
    SubscriptionWrite,
    #[serde(rename = "tokens.readonly")]
    TokenRead,
    #[serde(rename = "tokens")]
    TokenWrite,
}

/// An API token.
///
/// Tokens live in the global partition so authentication lookups are not
/// keyed by the mutating account; the owning account is carried in a regular
/// field and in the secondary index entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTokenRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "GS1-PK")]
    pub first_index: String,
    pub account_id: String,
    pub name: String,
    pub scopes: Vec<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<std::collections::HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// An outbound notification subscription owned by one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub endpoint: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_arn: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// A site-wide user link, keyed by subscription endpoint under the global
/// account, resolving an endpoint back to its owning account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub account_id: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}
