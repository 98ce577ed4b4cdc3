//! Change-data-capture pipeline.
//!
//! Consumes the table's before/after change records and drives the derived
//! side effects: audit projection, cross-account replication, share
//! lifecycle maintenance, and site-wide user links.

pub mod audit;
pub mod dispatcher;
pub mod record;
pub mod replicate;
pub mod shares;
pub mod users;

use std::sync::Arc;

use crate::config::Config;
use crate::storage::store::StoreClient;

pub use audit::AuditProjector;
pub use dispatcher::{ChangeHandler, Dispatcher};
pub use record::{ChangeRecord, EventKind, StreamAttribute, StreamImage};
pub use replicate::{ReplicateOnCreate, ReplicateOnUpdate};
pub use shares::{CopyApprovedShare, DeleteMirroredShare};
pub use users::SubscriptionAccounts;

/// The standard handler set, in its fixed registration order.
pub fn default_dispatcher(store: Arc<dyn StoreClient>, config: &Config) -> Dispatcher {
    Dispatcher::new()
        .register(SubscriptionAccounts::new(store.clone()))
        .register(AuditProjector::new(
            store.clone(),
            config.audit_retention_years,
        ))
        .register(DeleteMirroredShare::new(store.clone()))
        .register(CopyApprovedShare::new(store.clone()))
        .register(ReplicateOnCreate::new(
            store.clone(),
            config.replication_page_size,
        ))
        .register(ReplicateOnUpdate::new(store, config.replication_page_size))
}
