//! Domain core for larder.
//!
//! Pure data types shared by the storage engine and the change-stream
//! pipeline: resource kinds, typed partition keys, stored-record and input
//! shapes, query parameters, and the repository error enum. No I/O and no
//! store types live here.

pub mod resource;
pub mod storage;
