//! HTTP transfer layer.
//!
//! - [`engine`]: the transfer capability the executor drives
//! - [`boringengine`]: bundled engine, hyper HTTP/1.1 over BoringSSL
//! - [`envelope`]: the result document returned to callers
//! - [`orderedheaders`]: header multimap preserving insertion order

pub mod boringengine;
pub mod engine;
pub mod envelope;
pub mod orderedheaders;

// Re-exports for convenience
pub use boringengine::BoringEngine;
pub use engine::{HttpEngine, TransferRequest, TransferResponse};
pub use envelope::ResponseEnvelope;
pub use orderedheaders::OrderedHeaderMap;
