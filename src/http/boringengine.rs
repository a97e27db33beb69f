//! Bundled [`HttpEngine`]: HTTP/1.1 over tokio-boring.
//!
//! Each transfer gets its own current-thread runtime, so the caller blocks
//! until the transfer finishes and nothing outlives the call. The flow is
//! DNS -> TCP -> TLS (with the verification hook bound into the connector)
//! -> one HTTP/1.1 exchange.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::engine::{HttpEngine, TransferRequest, TransferResponse};
use crate::socket::client::TransferStream;
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::header::HOST;
use http::Request;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use url::{Host, Position, Url};

/// Default engine backed by hyper and BoringSSL.
#[derive(Debug, Clone)]
pub struct BoringEngine {
    tls: TlsConfig,
}

impl Default for BoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BoringEngine {
    pub fn new() -> Self {
        Self {
            tls: TlsConfig::http1(),
        }
    }

    /// Use a custom TLS configuration. Verification and CA settings are
    /// still taken from each transfer.
    pub fn with_tls_config(tls: TlsConfig) -> Self {
        Self { tls }
    }

    async fn transfer(&self, request: &TransferRequest<'_>) -> Result<TransferResponse, NetError> {
        let url = request.url;
        let (host, port) = host_and_port(url)?;

        let socket = with_timeout(request.connect_timeout, self.connect(request, &host, port)).await?;
        if let Some(material) = socket.peer_material() {
            let alpn = socket.alpn();
            tracing::debug!(
                host = %host,
                port,
                spki = %material.spki_digest(),
                alpn = alpn.as_deref(),
                "transfer TLS session established"
            );
        } else {
            tracing::debug!(host = %host, port, tls = socket.is_tls(), "transfer connected");
        }

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(socket))
            .await
            .map_err(|e| NetError::Transfer(format!("HTTP handshake failed: {}", e)))?;
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "HTTP connection closed with error");
            }
        });

        let body = match request.body {
            Some(bytes) => Full::new(Bytes::copy_from_slice(bytes)),
            None => Full::new(Bytes::new()),
        };
        let mut req = Request::builder()
            .method(request.method.clone())
            .uri(&url[Position::BeforePath..])
            .body(body)
            .map_err(|_| NetError::InvalidUrl)?;

        let mut headers = request.headers.clone();
        if headers.get(HOST.as_str()).is_none() {
            let authority = match url.port() {
                Some(p) => format!("{}:{}", url.host_str().unwrap_or(&host), p),
                None => url.host_str().unwrap_or(&host).to_string(),
            };
            headers.insert(HOST.as_str(), &authority)?;
        }
        *req.headers_mut() = headers.to_header_map();

        let response = sender
            .send_request(req)
            .await
            .map_err(|e| {
                if e.is_parse() {
                    NetError::InvalidResponse
                } else {
                    NetError::Transfer(format!("HTTP request failed: {}", e))
                }
            })?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "HTTP body read failed");
                NetError::HttpBodyError
            })?
            .to_bytes();

        driver.abort();
        Ok(TransferResponse::new(status, body.to_vec()))
    }

    async fn connect(
        &self,
        request: &TransferRequest<'_>,
        host: &str,
        port: u16,
    ) -> Result<TransferStream, NetError> {
        let addrs = tokio::net::lookup_host((host, port)).await.dns_context(host)?;

        let mut stream = None;
        // Stays NameNotResolved only if the lookup produced no addresses.
        let mut last_err = NetError::NameNotResolved;
        for addr in addrs {
            match TcpStream::connect(addr).await.connection_context(host, port) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = e,
            }
        }
        let stream = stream.ok_or(last_err)?;

        if request.url.scheme() != "https" {
            return Ok(TransferStream::Plain(stream));
        }

        let tls = self
            .tls
            .clone()
            .verify_peer(request.verify_peer)
            .ca_file(request.ca_info_path.map(|p| p.to_path_buf()));
        let connector = tls.connector(request.verification_hook.clone())?;
        let config = tls.configure(&connector, host)?;

        let tls_stream = tokio_boring::connect(config, host, stream)
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = %e, "SSL handshake failed");
                NetError::handshake_failed(host, e)
            })?;

        Ok(TransferStream::Tls(tls_stream))
    }
}

impl BoringEngine {
    fn perform_blocking(&self, request: &TransferRequest<'_>) -> Result<TransferResponse, NetError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| NetError::Transfer(format!("runtime setup failed: {}", e)))?;

        runtime.block_on(with_timeout(request.total_timeout, self.transfer(request)))
    }
}

impl HttpEngine for BoringEngine {
    /// Blocks the calling thread. Called from inside a tokio runtime, the
    /// transfer is moved to a scoped thread of its own, since a runtime
    /// cannot be blocked on from within another.
    fn perform(&self, request: TransferRequest<'_>) -> Result<TransferResponse, NetError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.perform_blocking(&request);
        }

        tracing::debug!("perform called inside a tokio runtime, using a dedicated thread");
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.perform_blocking(&request))
                .join()
                .unwrap_or_else(|_| Err(NetError::Transfer("transfer thread panicked".to_string())))
        })
    }
}

async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T, NetError>
where
    F: Future<Output = Result<T, NetError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| NetError::ConnectionTimedOut)?,
        None => fut.await,
    }
}

fn host_and_port(url: &Url) -> Result<(String, u16), NetError> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => return Err(NetError::InvalidUrl),
    };
    let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
    Ok((host, port))
}
