use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::time::timeout;

use crate::domain::{ForceError, Result};
use crate::pool::PoolConfig;

/// A live socket-level connection bound to one concrete remote address,
/// carrying the original hostname for the TLS layer above. The socket is
/// open but untouched by TLS; SNI and certificate checks are performed by
/// the caller against [`tls_host`](Self::tls_host), never against the
/// address that was dialed.
#[derive(Debug)]
pub struct TransportConnection {
    stream: TcpStream,
    tls_host: String,
    forced: bool,
    proxied: bool,
}

impl TransportConnection {
    pub(crate) fn new(stream: TcpStream, tls_host: String, forced: bool, proxied: bool) -> Self {
        Self {
            stream,
            tls_host,
            forced,
            proxied,
        }
    }

    /// The original hostname, to be presented during the TLS handshake.
    pub fn tls_host(&self) -> &str {
        &self.tls_host
    }

    /// Whether the dial target was a forced IP rather than the hostname.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Whether the concrete dial target was an upstream proxy.
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Non-blocking probe for a connection that died while idle. A socket
    /// the server closed reads EOF immediately; a healthy idle socket has
    /// nothing to read and reports WouldBlock. Unsolicited data also makes
    /// the connection unfit for reuse.
    pub(crate) fn is_usable(&self) -> bool {
        let mut buf = [0u8; 1];
        match self.stream.try_read(&mut buf) {
            Ok(_) => false,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        }
    }

    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

/// Open a TCP connection to (`dial_host`, `port`), honoring the configured
/// connect timeout, local bind address and socket options.
///
/// Errors carry `original_host` (the hostname the request was addressed to),
/// not the dial target, so timeout and refusal messages stay debuggable when
/// an override is in play.
pub(crate) async fn open(
    dial_host: &str,
    port: u16,
    original_host: &str,
    config: &PoolConfig,
) -> Result<TcpStream> {
    match timeout(config.connect_timeout, dial(dial_host, port, config)).await {
        Ok(Ok(stream)) => {
            if config.nodelay {
                stream
                    .set_nodelay(true)
                    .map_err(|source| ForceError::ConnectionFailed {
                        host: original_host.to_string(),
                        source,
                    })?;
            }
            Ok(stream)
        }
        Ok(Err(source)) => Err(ForceError::ConnectionFailed {
            host: original_host.to_string(),
            source,
        }),
        Err(_) => Err(ForceError::ConnectTimeout {
            host: original_host.to_string(),
            timeout: config.connect_timeout,
        }),
    }
}

async fn dial(dial_host: &str, port: u16, config: &PoolConfig) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = match literal_ip(dial_host) {
        Some(ip) => vec![SocketAddr::new(ip, port)],
        None => lookup_host((dial_host, port)).await?.collect(),
    };

    let mut last_err = None;
    for addr in addrs {
        match connect_one(addr, config).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses to dial")))
}

async fn connect_one(addr: SocketAddr, config: &PoolConfig) -> io::Result<TcpStream> {
    match config.source_address {
        Some(local) => {
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            socket.bind(SocketAddr::new(local, 0))?;
            socket.connect(addr).await
        }
        None => TcpStream::connect(addr).await,
    }
}

/// Parse an address literal, accepting bracketed IPv6 (`[::1]`) as it
/// appears in URL authorities.
fn literal_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}
