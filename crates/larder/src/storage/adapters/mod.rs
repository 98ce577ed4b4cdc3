//! One adapter per resource kind.
//!
//! Each module supplies the shape-specific construction and merge logic for
//! its kind and a constructor wiring the adapter to a store.

pub mod audits;
pub mod recipes;
pub mod settings;
pub mod shares;
pub mod shopping;
pub mod subscriptions;
pub mod tokens;
pub mod users;
