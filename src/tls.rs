use std::sync::Arc;

use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::domain::{ForceError, Result};

/// Shared rustls client configuration: webpki root store, no client auth.
/// Certificate validation policy beyond that is not this crate's concern.
pub fn client_config() -> Arc<ClientConfig> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    )
}

pub fn connector() -> TlsConnector {
    TlsConnector::from(client_config())
}

/// The identity presented during the handshake (SNI and certificate
/// verification). Always derived from the original hostname; the forced IP
/// never appears here.
pub fn identity(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|_| ForceError::TlsIdentity(host.to_string()))
}
