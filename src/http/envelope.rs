//! Result document handed back to the caller.

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one request.
///
/// Either a completed transfer (`status` set, `error` null) or a failure
/// (`status` null, `error` set). Serialized as exactly
/// `{"status", "body", "durationMs", "error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: Option<u16>,
    pub body: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(status: u16, body: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
            duration_ms: millis(elapsed),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: None,
            body: String::new(),
            duration_ms: millis(elapsed),
            error: Some(error.into()),
        }
    }

    /// Failure envelope carrying the error's display text.
    pub fn from_error(error: &NetError, elapsed: Duration) -> Self {
        Self::failure(error.to_string(), elapsed)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some() && self.error.is_none()
    }

    /// JSON text of the envelope. String fields are escaped for embedding.
    pub fn to_json(&self) -> String {
        // Only strings, integers and nulls; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"status":null,"body":"","durationMs":{},"error":"envelope encoding failed"}}"#,
                self.duration_ms
            )
        })
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_envelope_exact() {
        let env = ResponseEnvelope::from_error(&NetError::MissingUrl, Duration::ZERO);
        assert_eq!(
            env.to_json(),
            r#"{"status":null,"body":"","durationMs":0,"error":"no url"}"#
        );
    }

    #[test]
    fn test_success_shape() {
        let env = ResponseEnvelope::success(200, "ok", Duration::from_millis(42));
        assert!(env.is_success());
        assert_eq!(
            env.to_json(),
            r#"{"status":200,"body":"ok","durationMs":42,"error":null}"#
        );
    }

    #[test]
    fn test_escaping() {
        let env = ResponseEnvelope::success(200, "a\\b\"c\nd\re\tf", Duration::ZERO);
        assert_eq!(
            env.to_json(),
            r#"{"status":200,"body":"a\\b\"c\nd\re\tf","durationMs":0,"error":null}"#
        );

        let back: ResponseEnvelope = serde_json::from_str(&env.to_json()).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_pinning_mismatch_text() {
        let env = ResponseEnvelope::from_error(
            &NetError::SslPinnedKeyNotInCertChain,
            Duration::from_millis(7),
        );
        assert_eq!(env.error.as_deref(), Some("SSL pinning mismatch"));
        assert_eq!(env.status, None);
        assert!(!env.is_success());
    }
}
