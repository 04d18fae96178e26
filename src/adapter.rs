use std::sync::Arc;

use crate::connector::ForcedIpConnector;
use crate::domain::{ForceError, MountPoint, Result};
use crate::manager::PoolManager;
use crate::pool::PoolConfig;

/// Client-facing entry point: binds a single forced-IP value to a URL prefix
/// and produces the pool manager used for every request matching that prefix.
///
/// With no forced IP this behaves as a standard HTTPS adapter. With one, the
/// IP is the dial target for matching requests while TLS (SNI, certificate
/// checks) and the Host header keep operating on the original hostname.
///
/// ```no_run
/// # use forcedip::{ForcedIpAdapter, PoolConfig};
/// let adapter = ForcedIpAdapter::new("https://example.test", Some("203.0.113.5"))?;
/// let connector = adapter.into_connector(PoolConfig::default());
/// # Ok::<(), forcedip::ForceError>(())
/// ```
///
/// The adapter performs no network I/O; it is purely a configuration and
/// factory boundary.
#[derive(Debug, Clone)]
pub struct ForcedIpAdapter {
    mount: MountPoint,
    forced_ip: Option<String>,
}

impl ForcedIpAdapter {
    /// Bind `forced_ip` to the given URL prefix. Mounting an override on a
    /// non-HTTPS prefix is rejected: only HTTPS forcing is SNI-safe, and the
    /// plain-HTTP substitution technique belongs to the calling application.
    pub fn new(prefix: &str, forced_ip: Option<&str>) -> Result<Self> {
        let mount = MountPoint::parse(prefix)?;
        let forced_ip = forced_ip.filter(|ip| !ip.is_empty()).map(str::to_string);

        if forced_ip.is_some() && !mount.is_https() {
            return Err(ForceError::UnsupportedScheme(mount.scheme().to_string()));
        }

        Ok(Self { mount, forced_ip })
    }

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }

    pub fn forced_ip(&self) -> Option<&str> {
        self.forced_ip.as_deref()
    }

    /// Build the pool manager for this adapter, forwarding the forced-IP
    /// value into its configuration.
    pub fn build_pool_manager(&self, config: PoolConfig) -> PoolManager {
        PoolManager::new(self.forced_ip.clone(), config)
    }

    /// Build a hyper-compatible connector driving the full chain
    /// (manager, pool, connection, TLS wrap) for this mount.
    pub fn into_connector(self, config: PoolConfig) -> ForcedIpConnector {
        let manager = Arc::new(self.build_pool_manager(config));
        ForcedIpConnector::new(self.mount, manager)
    }
}
