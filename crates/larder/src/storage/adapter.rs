//! Resource adapter seam.
//!
//! The generic repository owns storage mechanics; adapters own
//! interpretation: which input fields are required at creation, how a
//! partial update merges, and which records carry a secondary index entry.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use larder_core::resource::ResourceKind;
use larder_core::storage::Result;

use super::attrs::json_to_attr;
use super::store::UpdatePlan;

/// Shape-specific construction and merge behavior for one resource kind.
pub trait ResourceAdapter: Send + Sync {
    type Record: Serialize + DeserializeOwned + Send + Sync;
    type Input: Send + Sync;

    fn kind(&self) -> ResourceKind;

    /// Build the full record for a conditioned create.
    ///
    /// `account_id` is the partition owner; the adapter validates required
    /// input fields and returns `InvalidInput` when they are missing.
    fn on_create(
        &self,
        input: Self::Input,
        now: DateTime<Utc>,
        account_id: &str,
        item_id: &str,
    ) -> Result<Self::Record>;

    /// Append per-field assignments for the non-absent input fields.
    ///
    /// The repository adds the unconditional `updateTime` bump itself.
    fn on_update(&self, _input: &Self::Input, _plan: &mut UpdatePlan) -> Result<()> {
        Ok(())
    }
}

/// Serialize one field value for an update assignment.
pub fn attr_of<T: Serialize>(value: &T) -> Result<AttributeValue> {
    let json = serde_json::to_value(value)
        .map_err(|err| larder_core::storage::RepositoryError::Serialization(err.to_string()))?;
    Ok(json_to_attr(&json))
}
