//! Resource kinds and the composite partition key.
//!
//! The table groups every record under a partition of the form
//! `"{accountId}:{kind}"`. Internal code passes the typed pair around and
//! flattens it to the string form only at the store boundary; nothing outside
//! this module splits the string back apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account literal owning resources that are not keyed by the mutating
/// account (API tokens, site-wide user links).
pub const GLOBAL_ACCOUNT: &str = "Global";

/// Every resource type stored in the shared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Recipe,
    ShoppingList,
    Settings,
    ShareRequest,
    Audit,
    ApiToken,
    Subscription,
    User,
}

impl ResourceKind {
    /// Stable wire name used inside partition and index keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Recipe => "Recipe",
            ResourceKind::ShoppingList => "ShoppingList",
            ResourceKind::Settings => "Settings",
            ResourceKind::ShareRequest => "ShareRequest",
            ResourceKind::Audit => "Audit",
            ResourceKind::ApiToken => "ApiToken",
            ResourceKind::Subscription => "Subscription",
            ResourceKind::User => "User",
        }
    }

    /// Parses a wire name back into a kind.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Recipe" => Some(ResourceKind::Recipe),
            "ShoppingList" => Some(ResourceKind::ShoppingList),
            "Settings" => Some(ResourceKind::Settings),
            "ShareRequest" => Some(ResourceKind::ShareRequest),
            "Audit" => Some(ResourceKind::Audit),
            "ApiToken" => Some(ResourceKind::ApiToken),
            "Subscription" => Some(ResourceKind::Subscription),
            "User" => Some(ResourceKind::User),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed form of the table's composite partition key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKey {
    pub account_id: String,
    pub kind: ResourceKind,
}

impl PartitionKey {
    pub fn new(account_id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            account_id: account_id.into(),
            kind,
        }
    }

    /// Flattens to the stored `"{accountId}:{kind}"` form.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.account_id, self.kind.as_str())
    }

    /// Splits a stored partition key on the first separator.
    pub fn parse(encoded: &str) -> Option<Self> {
        let (account_id, kind) = encoded.split_once(':')?;
        Some(Self {
            account_id: account_id.to_string(),
            kind: ResourceKind::parse(kind)?,
        })
    }
}
