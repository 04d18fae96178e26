use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::connection::{self, TransportConnection};
use crate::domain::{Destination, ProxyAddr, Result};

/// Configuration shared by every pool a manager creates. All values are set
/// once at construction and read-only afterwards.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// How long a single connect attempt may take before it fails with a
    /// Connect-Timeout error.
    pub connect_timeout: Duration,
    /// Maximum idle connections kept per pool; released connections beyond
    /// this are dropped.
    pub max_idle: usize,
    /// Local address to bind before connecting.
    pub source_address: Option<IpAddr>,
    /// Set TCP_NODELAY on new connections.
    pub nodelay: bool,
    /// Upstream proxy. When set, the proxy is the concrete dial target and
    /// the forced IP override does not apply beyond the proxy hop.
    pub proxy: Option<ProxyAddr>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_idle: 8,
            source_address: None,
            nodelay: true,
            proxy: None,
        }
    }
}

/// Owns and recycles transport connections for one logical destination.
///
/// This is the single place where the forced-IP value is handed to a freshly
/// created connection: `create_connection` picks the dial target (proxy,
/// forced IP, or hostname, in that order of precedence) and binds the
/// original hostname into the connection for the TLS layer above.
#[derive(Debug)]
pub struct ConnectionPool {
    dest: Destination,
    forced_ip: Option<String>,
    config: PoolConfig,
    idle: Mutex<Vec<TransportConnection>>,
    num_connections: AtomicUsize,
}

impl ConnectionPool {
    pub(crate) fn new(dest: Destination, forced_ip: Option<String>, config: PoolConfig) -> Self {
        Self {
            dest,
            forced_ip,
            config,
            idle: Mutex::new(Vec::new()),
            num_connections: AtomicUsize::new(0),
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.dest
    }

    pub fn forced_ip(&self) -> Option<&str> {
        self.forced_ip.as_deref()
    }

    /// Connections created by this pool since it was built. Idle reuse does
    /// not increment this.
    pub fn num_connections(&self) -> usize {
        self.num_connections.load(Ordering::Relaxed)
    }

    /// Return an idle connection if one is still usable, else create a new
    /// one.
    pub async fn acquire(&self) -> Result<TransportConnection> {
        loop {
            let candidate = self.idle.lock().unwrap().pop();
            match candidate {
                Some(conn) if conn.is_usable() => {
                    log::debug!("reusing idle connection from {}", self);
                    return Ok(conn);
                }
                Some(_) => continue, // broken while idle, drop it
                None => break,
            }
        }
        self.create_connection().await
    }

    /// Dial a new connection for this pool's destination.
    pub async fn create_connection(&self) -> Result<TransportConnection> {
        self.num_connections.fetch_add(1, Ordering::Relaxed);

        let forced = self
            .forced_ip
            .as_deref()
            .filter(|ip| !ip.is_empty());

        let (dial_host, dial_port, is_forced) = match (&self.config.proxy, forced) {
            (Some(proxy), _) => (proxy.host.as_str(), proxy.port, false),
            (None, Some(ip)) => (ip, self.dest.port, true),
            (None, None) => (self.dest.host.as_str(), self.dest.port, false),
        };

        log::debug!("{} dialing {}:{}", self, dial_host, dial_port);
        let stream = connection::open(dial_host, dial_port, &self.dest.host, &self.config).await?;
        Ok(TransportConnection::new(
            stream,
            self.dest.host.clone(),
            is_forced,
            self.config.proxy.is_some(),
        ))
    }

    /// Return a still-healthy connection to the idle set; broken ones are
    /// discarded.
    pub fn release(&self, conn: TransportConnection) {
        if !conn.is_usable() {
            log::debug!("discarding broken connection for {}", self);
            return;
        }
        let mut idle = self.idle.lock().unwrap();
        if idle.len() < self.config.max_idle {
            idle.push(conn);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_len(&self) -> usize {
        self.idle.lock().unwrap().len()
    }
}

impl fmt::Display for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConnectionPool(host={:?}, port={}, forced_ip={})",
            self.dest.host,
            self.dest.port,
            self.forced_ip.as_deref().unwrap_or("none"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_the_forced_ip() {
        let pool = ConnectionPool::new(
            Destination::https("example.test", 443),
            Some("203.0.113.5".to_string()),
            PoolConfig::default(),
        );
        let text = pool.to_string();
        assert!(text.contains("example.test"), "{}", text);
        assert!(text.contains("443"), "{}", text);
        assert!(text.contains("203.0.113.5"), "{}", text);
    }

    #[test]
    fn display_without_override() {
        let pool = ConnectionPool::new(
            Destination::https("example.test", 443),
            None,
            PoolConfig::default(),
        );
        assert!(pool.to_string().contains("forced_ip=none"));
    }
}
