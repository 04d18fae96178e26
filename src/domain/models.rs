use std::fmt;

use hyper::Uri;
use url::Url;

use super::{ForceError, Result};

/// Logical (scheme, hostname, port) identity of an endpoint, independent of
/// which concrete address actually serves it. Immutable for the life of a
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into().to_ascii_lowercase(),
            port,
        }
    }

    pub fn https(host: impl Into<String>, port: u16) -> Self {
        Self::new("https", host, port)
    }

    pub fn from_uri(uri: &Uri) -> Result<Self> {
        let scheme = uri
            .scheme_str()
            .ok_or_else(|| ForceError::InvalidUri(format!("missing scheme in {}", uri)))?;
        let authority = uri
            .authority()
            .ok_or_else(|| ForceError::InvalidUri(format!("missing authority in {}", uri)))?;
        let port = authority
            .port_u16()
            .unwrap_or_else(|| default_port(scheme));
        Ok(Self::new(scheme, authority.host(), port))
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    pub fn key(&self) -> PoolKey {
        PoolKey {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Lookup key used to find/reuse a connection pool. Pools are keyed by the
/// logical destination, never by the forced IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

/// The URL prefix an adapter is bound to. Only requests whose destination
/// matches the prefix use the forced-IP override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    scheme: String,
    host: String,
    port: u16,
}

impl MountPoint {
    /// Parse a prefix such as `https://example.test` or
    /// `https://example.test:8443`. Paths, queries and fragments are not part
    /// of the mount surface and are rejected.
    pub fn parse(prefix: &str) -> Result<Self> {
        let url = Url::parse(prefix)
            .map_err(|e| ForceError::InvalidMount(format!("{}: {}", prefix, e)))?;

        if url.path() != "/" && !url.path().is_empty() {
            return Err(ForceError::InvalidMount(format!(
                "{}: mount prefix must not include a path",
                prefix
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ForceError::InvalidMount(format!(
                "{}: mount prefix must not include a query or fragment",
                prefix
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ForceError::InvalidMount(format!("{}: missing host", prefix)))?
            .to_ascii_lowercase();
        let port = url
            .port_or_known_default()
            .unwrap_or_else(|| default_port(url.scheme()));

        Ok(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host,
            port,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    pub fn matches(&self, dest: &Destination) -> bool {
        self.scheme == dest.scheme && self.host == dest.host && self.port == dest.port
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Concrete dial target of an upstream proxy hop. When a pool has one, the
/// proxy is what gets dialed and the forced IP does not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddr {
    pub host: String,
    pub port: u16,
}

impl ProxyAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "https" => 443,
        _ => 80,
    }
}
