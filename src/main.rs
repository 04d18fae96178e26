use clap::Parser;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::HOST;
use hyper::Request;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use forcedip::{ForcedIpAdapter, ForcedIpConnector, PoolConfig};

#[derive(Parser, Debug)]
#[clap(version = env!("FORCEDIP_VERSION"))]
pub struct Opts {
    /// URL to test
    url: String,

    /// IP to use, instead of the one the URL resolves to
    #[clap(long)]
    forced_ip: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    let url = Url::parse(&opts.url)?;
    let hostname = url.host_str().ok_or("URL has no host")?.to_string();
    let host_header = host_header_value(&url);

    // The adapter only covers HTTPS. For plain HTTP the old technique still
    // applies: substitute the IP into the URL and set the Host header
    // explicitly.
    let (request_url, adapter_ip) = match (url.scheme(), opts.forced_ip.as_deref()) {
        ("https", ip) => (url.clone(), ip.map(str::to_string)),
        (_, Some(ip)) => {
            warn!("{} is not https; forcing the IP via URL substitution instead", url.scheme());
            (rewrite_authority(&url, ip)?, None)
        }
        _ => (url.clone(), None),
    };

    info!(
        "testing {} with hostname {} (forced IP: {})",
        request_url,
        hostname,
        opts.forced_ip.as_deref().unwrap_or("none")
    );

    let prefix = request_url.origin().ascii_serialization();
    let adapter = ForcedIpAdapter::new(&prefix, adapter_ip.as_deref())?;
    let connector = adapter.into_connector(PoolConfig::default());
    let client: Client<ForcedIpConnector, Empty<Bytes>> =
        Client::builder(TokioExecutor::new()).build(connector);

    let req = Request::builder()
        .uri(request_url.as_str())
        .header(HOST, host_header.as_str())
        .body(Empty::<Bytes>::new())?;

    let res = client.request(req).await?;
    println!("{}", res.status());

    let body = res.into_body().collect().await?.to_bytes();
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}

/// `host[:port]` as it should appear in the Host header, port only when the
/// URL carries an explicit one.
fn host_header_value(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Replace the URL authority with the forced IP, keeping scheme, port, path
/// and query intact.
fn rewrite_authority(url: &Url, ip: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut rewritten = url.clone();
    let bare = ip.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<std::net::IpAddr>() {
        Ok(addr) => rewritten
            .set_ip_host(addr)
            .map_err(|_| format!("cannot set IP host on {}", url))?,
        Err(_) => rewritten
            .set_host(Some(ip))
            .map_err(|e| format!("cannot set host {} on {}: {}", ip, url, e))?,
    }
    Ok(rewritten)
}
