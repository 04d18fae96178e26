use std::pin::Pin;
use std::task::{Context, Poll};

use hyper_util::client::legacy::connect::{Connected, Connection};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

#[derive(Debug)]
enum Inner {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

/// Stream handed to the HTTP client: plain TCP for http destinations, a TLS
/// client stream for https ones. Whether the dial target was forced is
/// invisible at this layer; whether it was an upstream proxy is reported via
/// [`Connection::connected`] so hyper sends absolute-form requests.
#[derive(Debug)]
pub struct ForcedStream {
    inner: Inner,
    proxied: bool,
}

impl ForcedStream {
    pub fn plain(stream: TcpStream, proxied: bool) -> Self {
        Self {
            inner: Inner::Plain(stream),
            proxied,
        }
    }

    pub fn tls(stream: TlsStream<TcpStream>, proxied: bool) -> Self {
        Self {
            inner: Inner::Tls(Box::new(stream)),
            proxied,
        }
    }

    pub fn is_proxied(&self) -> bool {
        self.proxied
    }
}

impl AsyncRead for ForcedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<tokio::io::Result<()>> {
        match &mut self.inner {
            Inner::Plain(inner) => Pin::new(inner).poll_read(cx, buf),
            Inner::Tls(inner) => Pin::new(inner).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ForcedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, tokio::io::Error>> {
        match &mut self.inner {
            Inner::Plain(inner) => Pin::new(inner).poll_write(cx, buf),
            Inner::Tls(inner) => Pin::new(inner).poll_write(cx, buf),
        }
    }

    fn poll_flush(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        match &mut self.inner {
            Inner::Plain(inner) => Pin::new(inner).poll_flush(cx),
            Inner::Tls(inner) => Pin::new(inner).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        match &mut self.inner {
            Inner::Plain(inner) => Pin::new(inner).poll_shutdown(cx),
            Inner::Tls(inner) => Pin::new(inner).poll_shutdown(cx),
        }
    }
}

impl Connection for ForcedStream {
    fn connected(&self) -> Connected {
        Connected::new().proxy(self.proxied)
    }
}
