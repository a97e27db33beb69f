use crate::base::neterror::NetError;
use crate::http::engine::{HttpEngine, TransferRequest, TransferResponse};
use crate::http::envelope::ResponseEnvelope;
use crate::tls::coordinator::{Coordinator, VerificationPlan};
use crate::urlrequest::request::{RawRequest, RequestSpec};
use std::time::{Duration, Instant};

/// Internal state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    ParseRequest,
    PreflightCheck,
    Transfer,
    BuildEnvelope,
    Done,
}

/// Executes one request: parse, optional preflight pin check, transfer,
/// envelope. Runs entirely on the calling thread.
pub struct URLRequestJob<'a> {
    raw: &'a RawRequest,
    coordinator: &'a Coordinator,
    engine: &'a dyn HttpEngine,
    default_timeout: Option<Duration>,
    state: State,
    started: Instant,
    spec: Option<RequestSpec>,
    plan: VerificationPlan,
    outcome: Option<Result<TransferResponse, NetError>>,
    envelope: Option<ResponseEnvelope>,
}

impl<'a> URLRequestJob<'a> {
    pub fn new(
        raw: &'a RawRequest,
        coordinator: &'a Coordinator,
        engine: &'a dyn HttpEngine,
    ) -> Self {
        Self {
            raw,
            coordinator,
            engine,
            default_timeout: None,
            state: State::Init,
            started: Instant::now(),
            spec: None,
            plan: VerificationPlan::default(),
            outcome: None,
            envelope: None,
        }
    }

    /// Timeout used when the request carries no positive timeout.
    pub fn set_default_timeout(&mut self, timeout: Option<Duration>) {
        self.default_timeout = timeout;
    }

    /// Run the job to completion. Never fails: every error is folded into
    /// the envelope.
    pub fn run(mut self) -> ResponseEnvelope {
        self.started = Instant::now();
        self.state = State::ParseRequest;

        while self.state != State::Done {
            self.state = match self.state {
                State::Init => State::ParseRequest,
                State::ParseRequest => self.do_parse_request(),
                State::PreflightCheck => self.do_preflight_check(),
                State::Transfer => self.do_transfer(),
                State::BuildEnvelope => self.do_build_envelope(),
                State::Done => State::Done,
            };
        }

        self.envelope.unwrap_or_else(|| {
            ResponseEnvelope::failure("request did not complete", self.started.elapsed())
        })
    }

    fn do_parse_request(&mut self) -> State {
        match RequestSpec::parse(self.raw) {
            Ok(spec) => {
                match self.coordinator.plan(&spec) {
                    Ok(plan) => self.plan = plan,
                    Err(e) => {
                        tracing::warn!(host = %spec.host(), error = %e, "pinned request rejected");
                        self.spec = Some(spec);
                        self.outcome = Some(Err(e));
                        return State::BuildEnvelope;
                    }
                }
                self.spec = Some(spec);
                if self.plan.preflight.is_some() {
                    State::PreflightCheck
                } else {
                    State::Transfer
                }
            }
            Err(NetError::MissingUrl) => {
                // Terminal before any work; reported with zero duration.
                self.envelope = Some(ResponseEnvelope::from_error(
                    &NetError::MissingUrl,
                    Duration::ZERO,
                ));
                State::Done
            }
            Err(e) => {
                self.outcome = Some(Err(e));
                State::BuildEnvelope
            }
        }
    }

    fn do_preflight_check(&mut self) -> State {
        let (Some(spec), Some(endpoint)) = (self.spec.as_ref(), self.plan.preflight.as_ref()) else {
            return State::Transfer;
        };

        match self
            .coordinator
            .preflight(spec, endpoint, self.effective_timeout())
        {
            Ok(()) => {
                tracing::debug!(host = %endpoint.host, port = endpoint.port, "preflight pin check passed");
                State::Transfer
            }
            Err(e) => {
                tracing::warn!(
                    host = %endpoint.host,
                    port = endpoint.port,
                    error = %e,
                    "preflight pin check failed, aborting before transfer"
                );
                self.outcome = Some(Err(e));
                State::BuildEnvelope
            }
        }
    }

    fn do_transfer(&mut self) -> State {
        let Some(spec) = self.spec.as_ref() else {
            self.outcome = Some(Err(NetError::InvalidUrl));
            return State::BuildEnvelope;
        };

        let timeout = self.effective_timeout();
        let body = if spec.sends_body() {
            spec.body.as_deref()
        } else {
            None
        };

        let request = TransferRequest {
            method: &spec.method,
            url: &spec.url,
            headers: &spec.headers,
            body,
            connect_timeout: timeout,
            total_timeout: timeout,
            verify_peer: !spec.insecure,
            ca_info_path: spec.ca_info_path.as_deref(),
            verification_hook: self.plan.inline_hook.clone(),
        };
        tracing::debug!(?request, "starting transfer");

        let result = self.engine.perform(request).map_err(|e| {
            // Inline hook rejections surface here as ordinary transfer errors.
            NetError::Transfer(e.to_string())
        });
        self.outcome = Some(result);
        State::BuildEnvelope
    }

    fn do_build_envelope(&mut self) -> State {
        let elapsed = self.started.elapsed();
        let envelope = match self.outcome.take() {
            Some(Ok(response)) => ResponseEnvelope::success(response.status, response.text(), elapsed),
            Some(Err(e)) => ResponseEnvelope::failure(error_text(&e), elapsed),
            None => ResponseEnvelope::failure("request did not complete", elapsed),
        };

        if let Some(spec) = &self.spec {
            tracing::info!(
                method = %spec.method,
                host = %spec.host(),
                status = envelope.status,
                duration_ms = envelope.duration_ms,
                error = envelope.error.as_deref(),
                "request finished"
            );
        }

        self.envelope = Some(envelope);
        State::Done
    }

    fn effective_timeout(&self) -> Option<Duration> {
        self.spec
            .as_ref()
            .and_then(|s| s.timeout)
            .or(self.default_timeout)
    }
}

/// Envelope text for a failed request.
///
/// A mismatch is always the bare mismatch text. Preflight failures that
/// could not reach a verdict name their cause.
fn error_text(error: &NetError) -> String {
    match error {
        e if e.is_pinning_failure() => e.to_string(),
        NetError::Transfer(_) => error.to_string(),
        e if e.allows_fallback() => format!("SSL pinning verification failed: {}", e),
        e => e.to_string(),
    }
}
