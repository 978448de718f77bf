use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cb_errors::CircuitBreakerError;
use cb_model::Store;

use crate::cache::CacheStore;
use crate::durable::DurableStore;
use crate::memory::MemoryStore;

/// Driver-specific connection parameters for one configured store. Mirrors
/// the per-backend sub-config shape of `BackendConfig` in the teacher's
/// `memory::backends::factory`, collapsed to three variants since the
/// spec names exactly three drivers.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Cache {
        redis_url: String,
    },
    Durable {
        database_url: String,
        primary_key_type: cb_config::PrimaryKeyType,
    },
}

impl StoreConfig {
    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Cache { .. } => "cache",
            StoreConfig::Durable { .. } => "durable",
        }
    }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A driver constructor, keyed by driver name in a [`DriverRegistry`].
/// Generalizes the teacher's `create_backend` match-on-type dispatch into a
/// registry open to `Manager::register_driver`, since embedders may add
/// their own drivers — something the teacher's fixed match statement never
/// needed to support.
pub type DriverFactory =
    Arc<dyn Fn(StoreConfig) -> BoxFuture<Result<Arc<dyn Store>, CircuitBreakerError>> + Send + Sync>;

/// Pre-seeded with the three built-in drivers; `register` extends it with
/// custom ones.
#[derive(Clone)]
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("memory", Arc::new(|config| Box::pin(create_memory(config))));
        registry.register("cache", Arc::new(|config| Box::pin(create_cache(config))));
        registry.register("durable", Arc::new(|config| Box::pin(create_durable(config))));
        registry
    }

    pub fn register(&mut self, driver: &'static str, factory: DriverFactory) {
        self.factories.insert(driver, factory);
    }

    #[must_use]
    pub fn get(&self, driver: &str) -> Option<DriverFactory> {
        self.factories.get(driver).cloned()
    }

    pub async fn create(
        &self,
        store_name: &str,
        config: StoreConfig,
    ) -> Result<Arc<dyn Store>, CircuitBreakerError> {
        let driver = config.driver_name();
        let factory = self
            .factories
            .get(driver)
            .ok_or_else(|| CircuitBreakerError::UnsupportedDriver {
                store: store_name.to_string(),
                driver: driver.to_string(),
            })?
            .clone();
        factory(config).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn create_memory(config: StoreConfig) -> Result<Arc<dyn Store>, CircuitBreakerError> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        other => Err(CircuitBreakerError::UnsupportedDriver {
            store: String::new(),
            driver: other.driver_name().to_string(),
        }),
    }
}

async fn create_cache(config: StoreConfig) -> Result<Arc<dyn Store>, CircuitBreakerError> {
    match config {
        StoreConfig::Cache { redis_url } => {
            let store = CacheStore::connect(&redis_url).await?;
            Ok(Arc::new(store))
        }
        other => Err(CircuitBreakerError::UnsupportedDriver {
            store: String::new(),
            driver: other.driver_name().to_string(),
        }),
    }
}

async fn create_durable(config: StoreConfig) -> Result<Arc<dyn Store>, CircuitBreakerError> {
    match config {
        StoreConfig::Durable {
            database_url,
            primary_key_type,
        } => {
            let store = DurableStore::connect(&database_url, primary_key_type).await?;
            store.initialize_schema().await?;
            Ok(Arc::new(store))
        }
        other => Err(CircuitBreakerError::UnsupportedDriver {
            store: String::new(),
            driver: other.driver_name().to_string(),
        }),
    }
}
