//! Application-level pinning settings.
//!
//! A host application usually keeps one pinning configuration and wants it
//! applied to every request. [`PinningConfig::apply`] stamps it onto a
//! [`RawRequest`] through the reserved keys, leaving per-request pins alone.

use crate::base::neterror::NetError;
use crate::urlrequest::request::{RawRequest, CERT_PINS_KEY, SPKI_PINS_KEY, TECHNIQUE_KEY};
use serde::{Deserialize, Serialize};

/// Which pin list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinMode {
    #[default]
    PublicKey,
    CertHash,
}

/// Technique as named by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinTechnique {
    None,
    CurlPreflight,
    CurlSslCtx,
    CurlBoth,
    #[default]
    Auto,
}

impl PinTechnique {
    /// Selector written to the technique key, if any.
    pub fn selector(&self) -> Option<&'static str> {
        match self {
            PinTechnique::None => None,
            PinTechnique::CurlPreflight => Some("preflight"),
            PinTechnique::CurlSslCtx => Some("sslctx"),
            PinTechnique::CurlBoth | PinTechnique::Auto => Some("both"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PinningConfig {
    pub enabled: bool,
    pub mode: PinMode,
    pub spki_pins: Vec<String>,
    #[serde(alias = "certSha256Pins")]
    pub cert_pins: Vec<String>,
    pub technique: PinTechnique,
}

impl PinningConfig {
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::InvalidRequest(e.to_string()))
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.technique != PinTechnique::None
    }

    /// Add this configuration's pins and technique to `request`.
    ///
    /// Pins already present on the request win. The technique key is
    /// always written when the configuration is active.
    pub fn apply(&self, request: &mut RawRequest) {
        if !self.is_active() {
            return;
        }

        let (key, pins) = match self.mode {
            PinMode::PublicKey => (SPKI_PINS_KEY, &self.spki_pins),
            PinMode::CertHash => (CERT_PINS_KEY, &self.cert_pins),
        };
        if !pins.is_empty() && !request.has_header(key) {
            request.headers.push((key.to_string(), pins.join(",")));
        }

        if let Some(selector) = self.technique.selector() {
            request
                .headers
                .retain(|(k, _)| !k.eq_ignore_ascii_case(TECHNIQUE_KEY));
            request
                .headers
                .push((TECHNIQUE_KEY.to_string(), selector.to_string()));
        }
    }
}
