//! Request input surface and its parsed form.
//!
//! Callers hand over a loosely typed [`RawRequest`]. A handful of reserved
//! header names carry configuration rather than HTTP headers: they are
//! consumed while building the [`RequestSpec`] and never sent.

use crate::base::neterror::NetError;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::tls::coordinator::VerificationTechnique;
use crate::tls::pinning::{PinKind, PinSet};
use http::Method;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Disables CA chain and hostname verification (`true`, `TRUE` or `1`).
pub const INSECURE_KEY: &str = "X-Curl-Insecure";
/// Path of a CA bundle replacing the default trust store.
pub const CA_INFO_KEY: &str = "X-Curl-CaInfo";
/// Comma-separated SPKI pins.
pub const SPKI_PINS_KEY: &str = "X-Curl-SpkiPins";
/// Comma-separated certificate pins.
pub const CERT_PINS_KEY: &str = "X-Curl-CertPins";
/// Technique selector: `preflight`, `sslctx` or `both`.
pub const TECHNIQUE_KEY: &str = "X-Curl-Technique";

pub const RESERVED_KEYS: [&str; 5] = [
    INSECURE_KEY,
    CA_INFO_KEY,
    SPKI_PINS_KEY,
    CERT_PINS_KEY,
    TECHNIQUE_KEY,
];

/// Whether `name` is one of the reserved configuration keys.
pub fn is_reserved_key(name: &str) -> bool {
    RESERVED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(name.trim()))
}

/// A request as supplied by the calling application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Ordered key/value pairs; keys may repeat.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<i64>,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Whether a header with this name is present (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Parse from the JSON request document.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::InvalidRequest(e.to_string()))
    }
}

/// Fully parsed request. Immutable for the life of the request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    /// Real HTTP headers only; reserved keys are stripped.
    pub headers: OrderedHeaderMap,
    pub body: Option<Vec<u8>>,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
    pub insecure: bool,
    pub ca_info_path: Option<PathBuf>,
    pub pins: PinSet,
    pub technique: VerificationTechnique,
}

impl RequestSpec {
    /// A GET of `url` with no headers, body or pins.
    pub fn new(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: OrderedHeaderMap::new(),
            body: None,
            timeout: None,
            insecure: false,
            ca_info_path: None,
            pins: PinSet::new(),
            technique: VerificationTechnique::default(),
        }
    }

    /// Parse a raw request.
    ///
    /// A missing or blank URL is [`NetError::MissingUrl`]; nothing else is
    /// looked at in that case.
    pub fn parse(raw: &RawRequest) -> Result<Self, NetError> {
        let url_str = raw
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(NetError::MissingUrl)?;
        let url = Url::parse(url_str).map_err(|_| NetError::InvalidUrl)?;

        let method = match raw.method.as_deref().map(str::trim) {
            None | Some("") => Method::GET,
            Some(m) => Method::from_bytes(m.as_bytes()).map_err(|_| NetError::MethodNotSupported)?,
        };

        let mut spec = Self::new(url);
        spec.method = method;
        spec.body = raw.body.as_ref().map(|b| b.as_bytes().to_vec());
        spec.timeout = raw
            .timeout_ms
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64));

        let mut technique = None;
        for (name, value) in &raw.headers {
            let key = name.trim();
            if key.eq_ignore_ascii_case(INSECURE_KEY) {
                spec.insecure = matches!(value.trim(), "true" | "TRUE" | "1");
            } else if key.eq_ignore_ascii_case(CA_INFO_KEY) {
                let path = value.trim();
                spec.ca_info_path = (!path.is_empty()).then(|| PathBuf::from(path));
            } else if key.eq_ignore_ascii_case(SPKI_PINS_KEY) {
                spec.pins.add_csv(PinKind::Spki, value);
            } else if key.eq_ignore_ascii_case(CERT_PINS_KEY) {
                spec.pins.add_csv(PinKind::Certificate, value);
            } else if key.eq_ignore_ascii_case(TECHNIQUE_KEY) {
                technique = Some(VerificationTechnique::from_selector(value));
            } else {
                spec.headers.append(key, value)?;
            }
        }
        spec.technique = technique.unwrap_or_default();

        Ok(spec)
    }

    /// Host part of the URL, for logging.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    /// Whether this method may carry a body.
    pub fn sends_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD
    }
}
