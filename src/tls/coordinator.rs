//! Per-request choice of pin verification technique.
//!
//! | pins | technique       | preflight | inline hook |
//! |------|-----------------|-----------|-------------|
//! | no   | any             | no        | no          |
//! | yes  | `Preflight`     | yes       | no          |
//! | yes  | `InlineCallback`| no        | yes         |
//! | yes  | `Both`          | yes       | yes         |
//!
//! The preflight probe and the transfer negotiate separate TLS sessions.
//! They are independent checks: a pass in one says nothing about the other.

use crate::base::neterror::NetError;
use crate::socket::tls::TlsConfig;
use crate::tls::capability::{PinningCapability, PreflightTarget};
use crate::tls::verifier::{pin_hook, VerificationHook};
use crate::urlrequest::request::RequestSpec;
use std::fmt;
use std::time::Duration;
use url::{Host, Url};

const DEFAULT_TLS_PORT: u16 = 443;

/// How pins are enforced for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationTechnique {
    /// Separate handshake before the transfer.
    Preflight,
    /// Hook inside the transfer's own handshake.
    InlineCallback,
    /// Both of the above.
    #[default]
    Both,
}

impl VerificationTechnique {
    /// Parse a technique selector (`preflight`, `sslctx`, `both`).
    /// Anything else selects [`Both`](Self::Both).
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "preflight" => VerificationTechnique::Preflight,
            "sslctx" => VerificationTechnique::InlineCallback,
            "both" => VerificationTechnique::Both,
            other => {
                tracing::debug!(selector = %other, "unknown technique selector, using both");
                VerificationTechnique::Both
            }
        }
    }

    pub fn as_selector(&self) -> &'static str {
        match self {
            VerificationTechnique::Preflight => "preflight",
            VerificationTechnique::InlineCallback => "sslctx",
            VerificationTechnique::Both => "both",
        }
    }

    pub fn runs_preflight(&self) -> bool {
        matches!(
            self,
            VerificationTechnique::Preflight | VerificationTechnique::Both
        )
    }

    pub fn installs_hook(&self) -> bool {
        matches!(
            self,
            VerificationTechnique::InlineCallback | VerificationTechnique::Both
        )
    }
}

impl fmt::Display for VerificationTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_selector())
    }
}

/// Host and port the preflight probe connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightHost {
    pub host: String,
    pub port: u16,
}

impl PreflightHost {
    /// Derive the probe endpoint from the URL authority. An explicit port
    /// wins; otherwise 443.
    pub fn from_url(url: &Url) -> Result<Self, NetError> {
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(NetError::InvalidUrl),
        };
        let port = url.port().unwrap_or(DEFAULT_TLS_PORT);
        Ok(Self { host, port })
    }
}

/// What the executor must do for one request.
#[derive(Clone, Default)]
pub struct VerificationPlan {
    pub preflight: Option<PreflightHost>,
    pub inline_hook: Option<VerificationHook>,
}

impl fmt::Debug for VerificationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationPlan")
            .field("preflight", &self.preflight)
            .field("inline_hook", &self.inline_hook.is_some())
            .finish()
    }
}

impl VerificationPlan {
    /// True when pinning plays no part in this request.
    pub fn is_unpinned(&self) -> bool {
        self.preflight.is_none() && self.inline_hook.is_none()
    }
}

/// Decides and runs pin verification for requests.
#[derive(Debug, Clone)]
pub struct Coordinator {
    capability: PinningCapability,
}

impl Coordinator {
    pub fn new(capability: PinningCapability) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> &PinningCapability {
        &self.capability
    }

    /// Build the plan for `spec`.
    ///
    /// Pins on a non-https URL are rejected, since there is no TLS session
    /// to check.
    pub fn plan(&self, spec: &RequestSpec) -> Result<VerificationPlan, NetError> {
        if spec.pins.is_empty() {
            return Ok(VerificationPlan::default());
        }
        if spec.url.scheme() != "https" {
            return Err(NetError::PinningRequiresHttps);
        }

        let preflight = if spec.technique.runs_preflight() {
            Some(PreflightHost::from_url(&spec.url)?)
        } else {
            None
        };
        let inline_hook = if spec.technique.installs_hook() {
            Some(pin_hook(spec.pins.clone()))
        } else {
            None
        };

        tracing::debug!(
            technique = %spec.technique,
            pins = spec.pins.len(),
            preflight = preflight.is_some(),
            inline = inline_hook.is_some(),
            "verification plan"
        );
        Ok(VerificationPlan {
            preflight,
            inline_hook,
        })
    }

    /// Run the preflight check against `endpoint` using the request's trust
    /// settings.
    pub fn preflight(
        &self,
        spec: &RequestSpec,
        endpoint: &PreflightHost,
        timeout: Option<Duration>,
    ) -> Result<(), NetError> {
        let tls = TlsConfig::probe()
            .verify_peer(!spec.insecure)
            .ca_file(spec.ca_info_path.clone());
        let target = PreflightTarget {
            host: &endpoint.host,
            port: endpoint.port,
            pins: &spec.pins,
            tls: &tls,
            timeout,
        };
        self.capability.verify_host(&target)
    }
}
