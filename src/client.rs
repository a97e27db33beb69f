//! Blocking HTTP client with certificate pinning.
//!
//! # Example
//!
//! ```rust,ignore
//! use pinnet::Client;
//!
//! let client = Client::builder()
//!     .default_timeout(std::time::Duration::from_secs(20))
//!     .build();
//!
//! let envelope = client
//!     .get("https://example.org")
//!     .spki_pins("sha256/AAAA...=")
//!     .send();
//! println!("{}", envelope.to_json());
//! ```

use crate::http::boringengine::BoringEngine;
use crate::http::engine::HttpEngine;
use crate::http::envelope::ResponseEnvelope;
use crate::tls::capability::{PinningCapability, PlatformVerifier};
use crate::tls::coordinator::{Coordinator, VerificationTechnique};
use crate::urlrequest::job::URLRequestJob;
use crate::urlrequest::pinconfig::PinningConfig;
use crate::urlrequest::request::{
    RawRequest, CA_INFO_KEY, CERT_PINS_KEY, INSECURE_KEY, SPKI_PINS_KEY, TECHNIQUE_KEY,
};
use http::Method;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Pinning-aware HTTP client.
///
/// Cheap to clone. Every request runs synchronously on the calling thread
/// and carries its own pin context, so one client can serve many threads.
#[derive(Clone)]
pub struct Client {
    engine: Arc<dyn HttpEngine>,
    coordinator: Arc<Coordinator>,
    default_timeout: Option<Duration>,
    ca_bundle: Option<PathBuf>,
    pinning: Option<PinningConfig>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("capability", self.coordinator.capability())
            .field("default_timeout", &self.default_timeout)
            .field("ca_bundle", &self.ca_bundle)
            .field("pinning", &self.pinning)
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        ClientBuilder::default().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The preflight backend selected when this client was built.
    pub fn capability(&self) -> &PinningCapability {
        self.coordinator.capability()
    }

    /// Execute a request. Failures are reported in the envelope.
    ///
    /// Blocks the calling thread until the request finishes. From async
    /// code, call it through `tokio::task::spawn_blocking`; the bundled
    /// engine still completes if called on a runtime thread, but stalls
    /// that thread for the duration.
    pub fn execute(&self, request: &RawRequest) -> ResponseEnvelope {
        let request = self.prepare(request);
        let mut job = URLRequestJob::new(&request, &self.coordinator, self.engine.as_ref());
        job.set_default_timeout(self.default_timeout);
        job.run()
    }

    /// Execute a JSON request document, returning the JSON envelope.
    pub fn execute_json(&self, request_json: &str) -> String {
        match RawRequest::from_json(request_json) {
            Ok(request) => self.execute(&request).to_json(),
            Err(e) => ResponseEnvelope::from_error(&e, Duration::ZERO).to_json(),
        }
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::PUT, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::DELETE, url)
    }

    /// Start building a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::HEAD, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            raw: RawRequest::new(method.as_str(), url.as_ref()),
        }
    }

    /// Apply client-wide settings the request does not override.
    fn prepare(&self, request: &RawRequest) -> RawRequest {
        let mut request = request.clone();
        if let Some(pinning) = &self.pinning {
            pinning.apply(&mut request);
        }
        if let Some(path) = &self.ca_bundle {
            if !request.has_header(CA_INFO_KEY) {
                request
                    .headers
                    .push((CA_INFO_KEY.to_string(), path.display().to_string()));
            }
        }
        request
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    engine: Option<Arc<dyn HttpEngine>>,
    platform_verifier: Option<Arc<dyn PlatformVerifier>>,
    native_disabled: bool,
    default_timeout: Option<Duration>,
    ca_bundle: Option<PathBuf>,
    pinning: Option<PinningConfig>,
}

impl ClientBuilder {
    /// Replace the bundled HTTP engine.
    pub fn engine(mut self, engine: Arc<dyn HttpEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Register the platform verifier used when the native stack cannot
    /// complete a check.
    pub fn platform_verifier(mut self, verifier: Arc<dyn PlatformVerifier>) -> Self {
        self.platform_verifier = Some(verifier);
        self
    }

    /// Allow or forbid the native BoringSSL preflight. Enabled by default.
    pub fn native_tls(mut self, enabled: bool) -> Self {
        self.native_disabled = !enabled;
        self
    }

    /// Timeout for requests that carry no positive timeout of their own.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// CA bundle used when a request names none.
    pub fn ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Pinning settings applied to every request.
    pub fn pinning(mut self, config: PinningConfig) -> Self {
        self.pinning = Some(config);
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let capability = PinningCapability::detect(!self.native_disabled, self.platform_verifier);
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(BoringEngine::new()));

        Client {
            engine,
            coordinator: Arc::new(Coordinator::new(capability)),
            default_timeout: self.default_timeout,
            ca_bundle: self.ca_bundle,
            pinning: self.pinning,
        }
    }
}

/// Builder for a single request.
pub struct RequestBuilder<'a> {
    client: &'a Client,
    raw: RawRequest,
}

impl RequestBuilder<'_> {
    /// Add a header. Repeated names are sent in order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw.headers.push((name.into(), value.into()));
        self
    }

    /// Set request body. Ignored for GET and HEAD.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.raw.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.raw.timeout_ms = Some(i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX));
        self
    }

    /// Skip CA chain and hostname verification. Pins are still checked.
    pub fn insecure(self) -> Self {
        self.header(INSECURE_KEY, "true")
    }

    pub fn ca_info(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.header(CA_INFO_KEY, path.display().to_string())
    }

    /// Comma-separated SPKI pins, with or without `sha256/`.
    pub fn spki_pins(self, csv: impl Into<String>) -> Self {
        self.header(SPKI_PINS_KEY, csv)
    }

    /// Comma-separated certificate pins, with or without `sha256/`.
    pub fn cert_pins(self, csv: impl Into<String>) -> Self {
        self.header(CERT_PINS_KEY, csv)
    }

    pub fn technique(self, technique: VerificationTechnique) -> Self {
        self.header(TECHNIQUE_KEY, technique.as_selector())
    }

    /// The raw request built so far.
    pub fn build(self) -> RawRequest {
        self.raw
    }

    /// Send the request.
    pub fn send(self) -> ResponseEnvelope {
        self.client.execute(&self.raw)
    }
}
