//! Connected transport for one transfer.

use crate::tls::verifier::PeerCertificateMaterial;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// Plain TCP for `http`, BoringSSL session for `https`.
#[derive(Debug)]
pub enum TransferStream {
    Plain(TcpStream),
    Tls(SslStream<TcpStream>),
}

impl TransferStream {
    pub fn is_tls(&self) -> bool {
        matches!(self, TransferStream::Tls(_))
    }

    /// Leaf certificate of the negotiated session, if any.
    pub fn peer_material(&self) -> Option<PeerCertificateMaterial> {
        match self {
            TransferStream::Plain(_) => None,
            TransferStream::Tls(s) => s
                .ssl()
                .peer_certificate()
                .and_then(|cert| PeerCertificateMaterial::from_x509(&cert).ok()),
        }
    }

    /// ALPN protocol agreed with the server.
    pub fn alpn(&self) -> Option<String> {
        match self {
            TransferStream::Plain(_) => None,
            TransferStream::Tls(s) => s
                .ssl()
                .selected_alpn_protocol()
                .map(|p| String::from_utf8_lossy(p).into_owned()),
        }
    }
}

impl AsyncRead for TransferStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransferStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            TransferStream::Tls(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransferStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TransferStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            TransferStream::Tls(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransferStream::Plain(s) => Pin::new(s).poll_flush(cx),
            TransferStream::Tls(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransferStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            TransferStream::Tls(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}
