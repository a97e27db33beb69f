use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Input Errors
    #[error("no url")]
    MissingUrl,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Method not supported")]
    MethodNotSupported,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Connection Errors
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved for {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("Connection timed out")]
    ConnectionTimedOut,

    // SSL Errors
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("SSL handshake with {host} failed: {reason}")]
    SslHandshakeFailed { host: String, reason: String },
    #[error("SSL peer presented no certificate")]
    SslNoPeerCertificate,
    #[error("SSL server cert bad format")]
    SslServerCertBadFormat,
    #[error("Invalid CA bundle: {path}")]
    InvalidCaBundle { path: String },
    #[error("Native TLS capability unavailable")]
    CapabilityUnavailable,

    // Pinning Errors
    #[error("SSL pinning mismatch")]
    SslPinnedKeyNotInCertChain,
    #[error("SSL pinning requires an https URL")]
    PinningRequiresHttps,

    // Transfer Errors
    #[error("{0}")]
    Transfer(String),
    #[error("Invalid response")]
    InvalidResponse,
    #[error("HTTP body error")]
    HttpBodyError,
}

impl NetError {
    /// Construct a DNS failure with the domain that failed to resolve.
    pub fn dns_failed(domain: impl Into<String>, source: std::io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            source: Arc::new(source),
        }
    }

    /// Construct a connect failure for `host:port`.
    pub fn connection_failed_to(host: impl Into<String>, port: u16, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::TimedOut {
            return NetError::ConnectionTimedOut;
        }
        NetError::ConnectionFailedTo {
            host: host.into(),
            port,
            source: Arc::new(source),
        }
    }

    /// Construct a handshake failure for `host`.
    pub fn handshake_failed(host: impl Into<String>, reason: impl ToString) -> Self {
        NetError::SslHandshakeFailed {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means verification could not be completed, as
    /// opposed to completing with a negative answer. Only these may be
    /// retried through the platform verifier.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved
                | NetError::NameNotResolvedFor { .. }
                | NetError::ConnectionFailed
                | NetError::ConnectionFailedTo { .. }
                | NetError::ConnectionTimedOut
                | NetError::SslProtocolError
                | NetError::SslHandshakeFailed { .. }
                | NetError::SslNoPeerCertificate
                | NetError::SslServerCertBadFormat
                | NetError::CapabilityUnavailable
        )
    }

    /// Whether this error was produced by pin verification.
    pub fn is_pinning_failure(&self) -> bool {
        matches!(
            self,
            NetError::SslPinnedKeyNotInCertChain | NetError::PinningRequiresHttps
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::ConnectionFailed => -104,
            NetError::ConnectionFailedTo { .. } => -104,
            NetError::SslProtocolError => -107,
            NetError::ConnectionTimedOut => -118,
            NetError::SslHandshakeFailed { .. } => -107,
            NetError::SslPinnedKeyNotInCertChain => -150,
            NetError::SslServerCertBadFormat => -167,
            NetError::InvalidUrl => -300,
            NetError::InvalidResponse => -320,
            NetError::MethodNotSupported => -322,
            NetError::HttpBodyError => -320,
            NetError::Transfer(_) => -370,
            // Custom codes (no Chromium equivalent) start at -1000
            NetError::MissingUrl => -1000,
            NetError::InvalidHeader => -1001,
            NetError::SslNoPeerCertificate => -1002,
            NetError::InvalidCaBundle { .. } => -1003,
            NetError::CapabilityUnavailable => -1004,
            NetError::PinningRequiresHttps => -1005,
            NetError::InvalidRequest(_) => -1006,
        }
    }
}
