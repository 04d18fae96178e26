use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{Destination, ForceError, PoolKey, Result};
use crate::pool::{ConnectionPool, PoolConfig};

/// Routes each request to the pool responsible for its (scheme, host, port)
/// and injects the forced-IP value into any pool it creates.
///
/// Pools are keyed by the logical destination, so all requests to the same
/// hostname share a pool (and therefore the same override) regardless of
/// which concrete IP serves them.
pub struct PoolManager {
    forced_ip: Option<String>,
    config: PoolConfig,
    pools: Mutex<HashMap<PoolKey, Arc<ConnectionPool>>>,
}

impl PoolManager {
    pub fn new(forced_ip: Option<String>, config: PoolConfig) -> Self {
        Self {
            forced_ip: forced_ip.filter(|ip| !ip.is_empty()),
            config,
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn forced_ip(&self) -> Option<&str> {
        self.forced_ip.as_deref()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get the pool for a destination, creating and registering one if none
    /// exists. An existing pool is returned unchanged; the override was
    /// embedded when it was created.
    ///
    /// Requesting an override for a non-HTTPS destination is a configuration
    /// error, not a silent no-op.
    pub fn pool_for(&self, dest: &Destination) -> Result<Arc<ConnectionPool>> {
        let key = dest.key();
        let mut pools = self.pools.lock().unwrap();
        if let Some(pool) = pools.get(&key) {
            return Ok(pool.clone());
        }

        if self.forced_ip.is_some() && !dest.is_https() {
            return Err(ForceError::UnsupportedScheme(dest.scheme.clone()));
        }

        let pool = Arc::new(ConnectionPool::new(
            dest.clone(),
            self.forced_ip.clone(),
            self.config.clone(),
        ));
        log::debug!("created {} for {}", pool, dest);
        pools.insert(key, pool.clone());
        Ok(pool)
    }
}
