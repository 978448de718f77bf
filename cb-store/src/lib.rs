//! Persistence drivers for circuit breaker state: an in-process `DashMap`
//! driver, a Redis cache driver, and a transactional Postgres durable
//! driver, all implementing the same `cb_model::Store` contract.

pub mod cache;
pub mod durable;
pub mod factory;
pub mod memory;

pub use cache::CacheStore;
pub use durable::DurableStore;
pub use factory::{DriverFactory, DriverRegistry, StoreConfig};
pub use memory::MemoryStore;
