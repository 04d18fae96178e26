use std::time::Duration;

use forcedip::{Destination, ForceError, ForcedIpAdapter, PoolConfig, PoolManager};
use tokio::net::TcpListener;

#[tokio::test]
async fn forced_dial_goes_to_the_ip_not_dns() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let accepted = tokio::spawn(async move {
        let (stream, peer) = listener.accept().await.unwrap();
        (stream, peer)
    });

    // The hostname is unresolvable, so a successful connect proves the dial
    // target was the forced IP.
    let adapter = ForcedIpAdapter::new(
        &format!("https://forced.example.test:{}", addr.port()),
        Some("127.0.0.1"),
    )
    .unwrap();
    let manager = adapter.build_pool_manager(PoolConfig::default());
    let pool = manager
        .pool_for(&Destination::https("forced.example.test", addr.port()))
        .unwrap();

    let conn = pool
        .acquire()
        .await
        .expect("forced dial should reach the local listener");

    assert!(conn.is_forced());
    assert_eq!(conn.tls_host(), "forced.example.test");
    assert_eq!(conn.peer_addr().unwrap(), addr);

    let (_server_side, peer) = accepted.await.unwrap();
    assert_eq!(peer, conn.into_stream().local_addr().unwrap());
}

#[tokio::test]
async fn unforced_dial_resolves_the_hostname() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let accepted = tokio::spawn(async move { listener.accept().await.unwrap() });

    let manager = PoolManager::new(None, PoolConfig::default());
    let pool = manager
        .pool_for(&Destination::https("localhost", addr.port()))
        .unwrap();

    let conn = pool
        .acquire()
        .await
        .expect("unforced dial should resolve localhost normally");

    assert!(!conn.is_forced());
    assert_eq!(conn.tls_host(), "localhost");
    accepted.await.unwrap();
}

#[tokio::test]
async fn connect_failure_names_the_hostname_not_the_ip() {
    // 203.0.113.1 is TEST-NET-3: depending on the environment the dial either
    // times out or is rejected as unreachable. Both failures must carry the
    // original hostname, never the forced IP.
    let config = PoolConfig {
        connect_timeout: Duration::from_millis(200),
        ..PoolConfig::default()
    };
    let manager = PoolManager::new(Some("203.0.113.1".to_string()), config);
    let pool = manager
        .pool_for(&Destination::https("slow.example.test", 443))
        .unwrap();

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(
        err,
        ForceError::ConnectTimeout { .. } | ForceError::ConnectionFailed { .. }
    ));

    let text = err.to_string();
    assert!(text.contains("slow.example.test"), "{}", text);
    assert!(!text.contains("203.0.113.1"), "{}", text);
}

#[tokio::test]
async fn connect_timeout_message_carries_the_timeout_value() {
    let timeout = Duration::from_secs(5);
    let err = ForceError::ConnectTimeout {
        host: "example.test".to_string(),
        timeout,
    };
    let text = err.to_string();
    assert!(text.contains("example.test"), "{}", text);
    assert!(text.contains("5s"), "{}", text);
}
