//! Resource kinds, partition keys, and record/input shapes.

mod inputs;
mod kind;
mod types;

pub use inputs::{
    ApiTokenInput, AuditInput, RecipeInput, SettingsInput, ShareRequestInput, ShoppingListInput,
    SubscriptionInput, UserInput,
};
pub use kind::{PartitionKey, ResourceKind, GLOBAL_ACCOUNT};
pub use types::{
    ApiTokenRecord, ApprovalStatus, AuditRecord, Ingredient, RecipeRecord, Scope, SettingsRecord,
    ShareRequestRecord, ShoppingListItem, ShoppingListRecord, SubscriptionRecord, UserRecord,
    SETTINGS_ITEM_ID,
};
