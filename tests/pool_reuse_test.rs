use std::sync::Arc;
use std::time::Duration;

use forcedip::{Destination, ForceError, ForcedIpAdapter, PoolConfig, PoolManager, ProxyAddr};
use hyper::Uri;
use tokio::net::TcpListener;
use tower_service::Service;

#[tokio::test]
async fn sequential_requests_share_one_pool() {
    let adapter = ForcedIpAdapter::new("https://example.test", Some("203.0.113.5")).unwrap();
    let manager = adapter.build_pool_manager(PoolConfig::default());
    let dest = Destination::https("example.test", 443);

    let first = manager.pool_for(&dest).unwrap();
    let second = manager.pool_for(&dest).unwrap();

    assert!(Arc::ptr_eq(&first, &second), "same key must reuse the pool");
    assert_eq!(first.forced_ip(), Some("203.0.113.5"));
}

#[tokio::test]
async fn released_connection_is_reused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Keep the accepted side open so the idle connection stays healthy.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1];
        let _ = stream.try_read(&mut buf);
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        drop(stream);
    });

    let adapter = ForcedIpAdapter::new(
        &format!("https://reuse.example.test:{}", addr.port()),
        Some("127.0.0.1"),
    )
    .unwrap();
    let manager = adapter.build_pool_manager(PoolConfig::default());
    let pool = manager
        .pool_for(&Destination::https("reuse.example.test", addr.port()))
        .unwrap();

    let conn = pool.acquire().await.unwrap();
    assert_eq!(pool.num_connections(), 1);

    pool.release(conn);
    let again = pool.acquire().await.unwrap();
    assert_eq!(
        pool.num_connections(),
        1,
        "idle connection should be reused, not re-dialed"
    );
    assert_eq!(again.tls_host(), "reuse.example.test");

    server.abort();
}

#[tokio::test]
async fn remotely_closed_idle_connection_is_redialed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let adapter = ForcedIpAdapter::new(
        &format!("https://stale.example.test:{}", addr.port()),
        Some("127.0.0.1"),
    )
    .unwrap();
    let manager = adapter.build_pool_manager(PoolConfig::default());
    let pool = manager
        .pool_for(&Destination::https("stale.example.test", addr.port()))
        .unwrap();

    let conn = pool.acquire().await.unwrap();
    let (server_side, _) = listener.accept().await.unwrap();
    assert_eq!(pool.num_connections(), 1);

    pool.release(conn);

    // The server closes the connection while it sits idle. The close must
    // reach the socket before the next acquire probes it.
    drop(server_side);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let again = pool.acquire().await.unwrap();
    assert_eq!(
        pool.num_connections(),
        2,
        "a connection closed while idle must be re-dialed, not handed out"
    );
    assert_eq!(again.tls_host(), "stale.example.test");
}

#[tokio::test]
async fn proxy_takes_precedence_over_the_forced_ip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = tokio::spawn(async move { listener.accept().await.unwrap() });

    let config = PoolConfig {
        proxy: Some(ProxyAddr::new("127.0.0.1", addr.port())),
        ..PoolConfig::default()
    };
    let manager = PoolManager::new(Some("203.0.113.5".to_string()), config);
    let pool = manager
        .pool_for(&Destination::https("example.test", 443))
        .unwrap();

    let conn = pool.acquire().await.unwrap();
    assert!(conn.is_proxied());
    assert!(!conn.is_forced(), "the override stops at the proxy hop");
    assert_eq!(conn.peer_addr().unwrap(), addr);
    assert_eq!(conn.tls_host(), "example.test");
    accepted.await.unwrap();
}

#[tokio::test]
async fn connector_passes_through_uris_outside_the_mount() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let accepted = tokio::spawn(async move { listener.accept().await.unwrap() });

    let adapter = ForcedIpAdapter::new("https://example.test", Some("203.0.113.5")).unwrap();
    let mut connector = adapter.into_connector(PoolConfig::default());

    // An http URI to an unrelated host does not match the https mount, so it
    // is dialed as-is with no override and no TLS.
    let uri: Uri = format!("http://127.0.0.1:{}/", addr.port()).parse().unwrap();
    connector
        .call(uri)
        .await
        .expect("passthrough dial should succeed");

    accepted.await.unwrap();
}

#[tokio::test]
async fn connector_rejects_uris_without_a_scheme() {
    let adapter = ForcedIpAdapter::new("https://example.test", Some("203.0.113.5")).unwrap();
    let mut connector = adapter.into_connector(PoolConfig::default());

    let err = connector
        .call(Uri::from_static("/relative/only"))
        .await
        .unwrap_err();
    assert!(matches!(err, ForceError::InvalidUri(_)));
}
