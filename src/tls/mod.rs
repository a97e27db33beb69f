//! Certificate pinning: pin model, digests, verification and technique
//! coordination.

pub mod capability;
pub mod coordinator;
pub mod digest;
pub mod pinning;
pub mod verifier;

pub use capability::{PinningCapability, PlatformVerifier};
pub use coordinator::{Coordinator, VerificationPlan, VerificationTechnique};
pub use digest::{digest, sha256, Sha256Hash};
pub use pinning::{Pin, PinKind, PinSet};
pub use verifier::{pin_hook, verify, PeerCertificateMaterial, VerificationHook, VerificationOutcome};
