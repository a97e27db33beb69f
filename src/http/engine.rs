//! The HTTP transfer capability consumed by the request executor.
//!
//! The executor never speaks HTTP itself. It hands a [`TransferRequest`] to
//! an [`HttpEngine`], optionally carrying a [`VerificationHook`] that the
//! engine must run inside the transfer's TLS handshake. A hook rejection
//! must abort the handshake, and the engine reports it as an ordinary
//! transfer error.

use crate::base::neterror::NetError;
use crate::http::orderedheaders::OrderedHeaderMap;
pub use crate::tls::verifier::VerificationHook;
use http::Method;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// One transfer, borrowed from the request that produced it.
#[derive(Clone)]
pub struct TransferRequest<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub headers: &'a OrderedHeaderMap,
    /// Never set for GET or HEAD.
    pub body: Option<&'a [u8]>,
    pub connect_timeout: Option<Duration>,
    pub total_timeout: Option<Duration>,
    /// Standard CA chain and hostname verification.
    pub verify_peer: bool,
    pub ca_info_path: Option<&'a Path>,
    pub verification_hook: Option<VerificationHook>,
}

impl fmt::Debug for TransferRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("method", self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers.len())
            .field("body", &self.body.map(<[u8]>::len))
            .field("connect_timeout", &self.connect_timeout)
            .field("total_timeout", &self.total_timeout)
            .field("verify_peer", &self.verify_peer)
            .field("ca_info_path", &self.ca_info_path)
            .field("verification_hook", &self.verification_hook.is_some())
            .finish()
    }
}

/// A completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransferResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs HTTP transfers, blocking the calling thread.
pub trait HttpEngine: Send + Sync {
    fn perform(&self, request: TransferRequest<'_>) -> Result<TransferResponse, NetError>;
}

impl<E: HttpEngine + ?Sized> HttpEngine for std::sync::Arc<E> {
    fn perform(&self, request: TransferRequest<'_>) -> Result<TransferResponse, NetError> {
        (**self).perform(request)
    }
}
