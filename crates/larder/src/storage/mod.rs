//! Storage-access engine.
//!
//! Layering: the [`store`] seam abstracts the shared table at the item
//! level; [`dynamodb`] and [`memory`] implement it; [`repository`] maps
//! typed records onto it through the key codec and the [`cursor`] codec;
//! [`adapters`] supply per-resource construction and merge behavior.

pub mod adapter;
pub mod adapters;
pub mod attrs;
pub mod cursor;
pub mod dynamodb;
pub mod memory;
pub mod repository;
pub mod store;

pub use adapter::ResourceAdapter;
pub use cursor::CursorError;
pub use dynamodb::DynamoStore;
pub use memory::MemoryStore;
pub use repository::Repository;
pub use store::{
    item_key, Item, Key, Precondition, QueryOutput, QueryRequest, StoreClient, StoreError,
    UpdatePlan, ATTR_INDEX, ATTR_PARTITION, ATTR_SORT,
};
