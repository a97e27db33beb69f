//! Request surface and execution.
//!
//! - [`request`]: raw request input, reserved configuration keys, parsing
//! - [`pinconfig`]: application-wide pinning settings
//! - [`job`]: the per-request executor

pub mod job;
pub mod pinconfig;
pub mod request;

pub use job::URLRequestJob;
pub use pinconfig::{PinMode, PinTechnique, PinningConfig};
pub use request::{RawRequest, RequestSpec};
