//! Known upstream pools.

pub mod registry;

pub use registry::{PoolEntry, PoolOverride, PoolRegistry, pool_keys};
