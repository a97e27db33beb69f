//! # pinnet
//!
//! A blocking HTTP client core with TLS certificate pinning.
//!
//! Requests carry their pinning configuration alongside ordinary headers.
//! Before (or during) the real transfer, the peer's leaf certificate is
//! hashed and compared against the configured pins; a mismatch aborts the
//! request. Every outcome, success or failure, is reported as a JSON
//! response envelope.
//!
//! ## Features
//!
//! - **SPKI and certificate pins**: SHA-256, base64, `sha256/` prefix optional
//! - **Preflight verification**: a separate handshake before the transfer
//! - **Inline verification**: a hook inside the transfer's own TLS handshake
//! - **Platform fallback**: delegate to the host platform when BoringSSL is unavailable
//! - **Fail-closed**: anything short of a positive pin match is a rejection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pinnet::{Client, RawRequest};
//!
//! let client = Client::new();
//! let request = RawRequest::get("https://example.org")
//!     .header("X-Curl-SpkiPins", "sha256/AAAA...=")
//!     .header("X-Curl-Technique", "both");
//! let envelope = client.execute(&request);
//! println!("{}", envelope.to_json());
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy and IO error context
//! - [`tls`] - Pin model, digests, verification and technique selection
//! - [`socket`] - Handshake probe and BoringSSL configuration
//! - [`http`] - Transfer engine capability and response envelope
//! - [`urlrequest`] - Request parsing and the per-request executor

pub mod base;
pub mod client;
pub mod http;
pub mod socket;
pub mod tls;
pub mod urlrequest;

pub use crate::base::neterror::NetError;
pub use crate::client::{Client, ClientBuilder, RequestBuilder};
pub use crate::http::{HttpEngine, ResponseEnvelope, TransferRequest, TransferResponse};
pub use crate::tls::{PinKind, PinSet, PinningCapability, PlatformVerifier, VerificationTechnique};
pub use crate::urlrequest::{PinningConfig, RawRequest, RequestSpec};
