//! Connect to a specific IP address for a given hostname without breaking
//! SNI or the Host header.
//!
//! The usual way to hit one specific backend behind a DNS-load-balanced name
//! is to put the IP in the URL and set the Host header by hand. That stops
//! working for HTTPS the moment SNI is involved: the IP from the URL is sent
//! as the requested server name and the TLS-terminating endpoint rejects the
//! mismatch.
//!
//! This crate forces the IP at the lowest possible level instead, the point
//! where a hostname becomes a TCP connection. The rest of the stack is given
//! the actual hostname, so the sequence is:
//!
//! 1. open a socket to the forced IP;
//! 2. TLS-wrap that socket using the hostname;
//! 3. do the rest of the HTTPS traffic, headers and all, over it.
//!
//! The override value is threaded through a fixed chain of layers, each
//! handing it down to the one it constructs:
//! [`ForcedIpAdapter`] → [`PoolManager`] → [`ConnectionPool`] →
//! [`TransportConnection`]. [`ForcedIpConnector`] packages the chain as a
//! `tower_service::Service<Uri>` so any hyper-based client can use it:
//!
//! ```no_run
//! use forcedip::{ForcedIpAdapter, PoolConfig};
//!
//! let adapter = ForcedIpAdapter::new("https://example.test", Some("203.0.113.5"))?;
//! let connector = adapter.into_connector(PoolConfig::default());
//! // hyper_util::client::legacy::Client::builder(..).build(connector)
//! # Ok::<(), forcedip::ForceError>(())
//! ```
//!
//! Only HTTPS is handled; requesting an override for another scheme is a
//! configuration error. Certificate validation policy, retries and HTTP
//! semantics are out of scope.

pub mod adapter;
pub mod connection;
pub mod connector;
pub mod domain;
pub mod manager;
pub mod pool;
pub mod stream;
pub mod tls;

pub use adapter::ForcedIpAdapter;
pub use connection::TransportConnection;
pub use connector::ForcedIpConnector;
pub use domain::{Destination, ForceError, MountPoint, PoolKey, ProxyAddr, Result};
pub use manager::PoolManager;
pub use pool::{ConnectionPool, PoolConfig};
pub use stream::ForcedStream;
