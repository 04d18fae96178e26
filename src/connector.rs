use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Future;
use hyper::Uri;
use hyper_util::rt::TokioIo;
use tokio_rustls::TlsConnector;
use tower_service::Service;

use crate::connection::{self, TransportConnection};
use crate::domain::{Destination, ForceError, MountPoint, Result};
use crate::manager::PoolManager;
use crate::stream::ForcedStream;
use crate::tls;

/// Connector for the hyper client, driving the full chain: destination
/// parsing, mount matching, pool acquisition and the TLS wrap.
///
/// URIs matching the mount go through the forced pool; everything else is a
/// plain unforced dial. In both cases the TLS handshake uses the original
/// hostname, so SNI and certificate checks never see the substituted
/// address.
#[derive(Clone)]
pub struct ForcedIpConnector {
    mount: MountPoint,
    manager: Arc<PoolManager>,
    tls: TlsConnector,
}

impl ForcedIpConnector {
    pub fn new(mount: MountPoint, manager: Arc<PoolManager>) -> Self {
        Self {
            mount,
            manager,
            tls: tls::connector(),
        }
    }

    pub fn manager(&self) -> &Arc<PoolManager> {
        &self.manager
    }

    async fn establish(
        mount: MountPoint,
        manager: Arc<PoolManager>,
        tls: TlsConnector,
        uri: Uri,
    ) -> Result<TokioIo<ForcedStream>> {
        let dest = Destination::from_uri(&uri)?;

        let conn: TransportConnection = if mount.matches(&dest) {
            let pool = manager.pool_for(&dest)?;
            log::debug!("{} serving {}", pool, uri);
            pool.acquire().await?
        } else {
            // Outside the mount there is no override; behave as a normal
            // connector.
            let stream =
                connection::open(&dest.host, dest.port, &dest.host, manager.config()).await?;
            TransportConnection::new(stream, dest.host.clone(), false, false)
        };

        let proxied = conn.is_proxied();
        if dest.is_https() {
            let host = conn.tls_host().to_string();
            let name = tls::identity(&host)?;
            let tls_stream = tls
                .connect(name, conn.into_stream())
                .await
                .map_err(|e| ForceError::Handshake {
                    host,
                    message: e.to_string(),
                })?;
            Ok(TokioIo::new(ForcedStream::tls(tls_stream, proxied)))
        } else {
            Ok(TokioIo::new(ForcedStream::plain(conn.into_stream(), proxied)))
        }
    }
}

impl Service<Uri> for ForcedIpConnector {
    type Response = TokioIo<ForcedStream>;
    type Error = ForceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let mount = self.mount.clone();
        let manager = self.manager.clone();
        let tls = self.tls.clone();

        Box::pin(Self::establish(mount, manager, tls, uri))
    }
}
