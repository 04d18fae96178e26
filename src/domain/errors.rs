use std::fmt;
use std::io;
use std::time::Duration;

#[derive(Debug)]
pub enum ForceError {
    InvalidMount(String),
    InvalidUri(String),
    UnsupportedScheme(String),
    ConnectTimeout { host: String, timeout: Duration },
    ConnectionFailed { host: String, source: io::Error },
    TlsIdentity(String),
    Handshake { host: String, message: String },
}

impl fmt::Display for ForceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceError::InvalidMount(msg) => write!(f, "Invalid mount prefix: {}", msg),
            ForceError::InvalidUri(msg) => write!(f, "Invalid URI: {}", msg),
            ForceError::UnsupportedScheme(scheme) => {
                write!(f, "Forced IP override is only supported for https, got {}", scheme)
            }
            ForceError::ConnectTimeout { host, timeout } => {
                write!(f, "Connection to {} timed out (connect timeout={:?})", host, timeout)
            }
            ForceError::ConnectionFailed { host, source } => {
                write!(f, "Failed to establish a new connection to {}: {}", host, source)
            }
            ForceError::TlsIdentity(host) => {
                write!(f, "Hostname {} is not a valid TLS server name", host)
            }
            ForceError::Handshake { host, message } => {
                write!(f, "TLS handshake with {} failed: {}", host, message)
            }
        }
    }
}

impl std::error::Error for ForceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForceError::ConnectionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForceError>;
