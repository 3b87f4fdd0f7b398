//! The response envelope and its mapping into the error taxonomy.
//!
//! Every endpoint of the service answers with the same wrapper:
//!
//! ```json
//! { "status": "OK" | "Error", "data": …, "error": …, "metrics": … }
//! ```
//!
//! [`parse_response`] is the single place where an HTTP status code plus a
//! raw body become either an [`Envelope`] or a typed [`DtcError`]. The
//! classification rules:
//!
//! | condition                         | result                                |
//! |-----------------------------------|---------------------------------------|
//! | 401                               | `Authentication` (terminal)           |
//! | 422                               | `Validation` (terminal)               |
//! | 429 or 5xx                        | `Network` (retryable)                 |
//! | other 4xx                         | `Api` (terminal)                      |
//! | 2xx, envelope `status != "OK"`    | `Api` with the envelope error message |
//! | 2xx, non-JSON body                | envelope with the body text as `data` |
//!
//! The non-JSON case is not hypothetical: `/version` answers with a bare
//! version string.

use crate::error::DtcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope-level status flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ResponseStatus {
    #[serde(rename = "OK")]
    Ok,
    #[default]
    #[serde(rename = "Error")]
    Error,
}

// Any value other than "OK" counts as an error, including values the
// service has not invented yet.
impl<'de> Deserialize<'de> for ResponseStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(if s == "OK" {
            ResponseStatus::Ok
        } else {
            ResponseStatus::Error
        })
    }
}

/// The `error` object of a failed envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    /// Service-defined error code; shape varies by endpoint.
    #[serde(default)]
    pub code: Option<Value>,
}

/// A successfully parsed response wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
    /// Opaque server-side timing/accounting block.
    #[serde(default)]
    pub metrics: Option<Value>,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// The envelope error message, if one was supplied.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref()?.message.as_deref()
    }

    /// Take the `data` payload, substituting `null` when absent.
    pub fn into_data(self) -> Value {
        self.data.unwrap_or(Value::Null)
    }
}

/// Parse a raw HTTP response into an [`Envelope`], or the typed error the
/// status code and envelope dictate.
pub fn parse_response(http_status: u16, body: &[u8]) -> Result<Envelope, DtcError> {
    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(env) => env,
        Err(_) => {
            let text = String::from_utf8_lossy(body).into_owned();
            if http_status >= 400 {
                return Err(classify_http(http_status, text));
            }
            // Plain-text 2xx answer: wrap the body as the data payload.
            return Ok(Envelope {
                status: ResponseStatus::Ok,
                data: Some(Value::String(text)),
                error: None,
                metrics: None,
            });
        }
    };

    if http_status >= 400 {
        let message = envelope
            .error_message()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP {http_status}"));
        return Err(classify_http(http_status, message));
    }

    if !envelope.is_ok() {
        let message = envelope
            .error_message()
            .map(str::to_owned)
            .unwrap_or_else(|| "unspecified error".to_owned());
        let code = envelope.error.as_ref().and_then(|e| e.code.clone());
        return Err(DtcError::Api {
            message: match code {
                Some(c) => format!("{message} (code {c})"),
                None => message,
            },
            status: None,
        });
    }

    Ok(envelope)
}

/// Map an HTTP error status onto the taxonomy.
fn classify_http(status: u16, message: String) -> DtcError {
    match status {
        401 => DtcError::Authentication { message },
        422 => DtcError::Validation { message },
        429 => DtcError::Network {
            message: format!("HTTP 429: {message}"),
        },
        s if s >= 500 => DtcError::Network {
            message: format!("HTTP {s}: {message}"),
        },
        s => DtcError::Api {
            message,
            status: Some(s),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn ok_envelope_passes_through() {
        let env = parse_response(
            200,
            &body(json!({ "status": "OK", "data": { "token": "t1" } })),
        )
        .unwrap();
        assert!(env.is_ok());
        assert_eq!(env.into_data()["token"], "t1");
    }

    #[test]
    fn metrics_are_preserved() {
        let env = parse_response(
            200,
            &body(json!({ "status": "OK", "data": {}, "metrics": { "total_time": 812 } })),
        )
        .unwrap();
        assert_eq!(env.metrics.unwrap()["total_time"], 812);
    }

    #[test]
    fn http_401_maps_to_authentication() {
        let err = parse_response(
            401,
            &body(json!({ "status": "Error", "error": { "message": "bad key" } })),
        )
        .unwrap_err();
        assert!(matches!(err, DtcError::Authentication { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn http_422_maps_to_validation() {
        let err = parse_response(
            422,
            &body(json!({ "status": "Error", "error": { "message": "bad graph" } })),
        )
        .unwrap_err();
        assert!(matches!(err, DtcError::Validation { .. }));
    }

    #[test]
    fn http_5xx_is_retryable_network() {
        for status in [500, 502, 503, 504] {
            let err = parse_response(status, b"gateway unhappy").unwrap_err();
            assert!(
                matches!(err, DtcError::Network { .. }),
                "HTTP {status} must map to Network"
            );
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn http_429_is_retryable() {
        let err = parse_response(429, b"slow down").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn other_4xx_is_terminal_api_error() {
        let err = parse_response(404, b"no such endpoint").unwrap_err();
        match err {
            DtcError::Api { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("expected Api, got {other}"),
        }
    }

    #[test]
    fn envelope_error_on_2xx_is_terminal() {
        let err = parse_response(
            200,
            &body(json!({
                "status": "Error",
                "error": { "message": "parser crashed", "code": 17 }
            })),
        )
        .unwrap_err();
        match &err {
            DtcError::Api { message, status } => {
                assert!(message.contains("parser crashed"));
                assert!(message.contains("17"));
                assert_eq!(*status, None);
            }
            other => panic!("expected Api, got {other}"),
        }
        assert!(!err.is_retryable());
    }

    #[test]
    fn unknown_envelope_status_counts_as_error() {
        let err = parse_response(200, &body(json!({ "status": "Degraded" }))).unwrap_err();
        assert!(matches!(err, DtcError::Api { .. }));
    }

    #[test]
    fn plain_text_2xx_becomes_data() {
        let env = parse_response(200, b"1.4.2").unwrap();
        assert!(env.is_ok());
        assert_eq!(env.into_data(), Value::String("1.4.2".into()));
    }

    #[test]
    fn plain_text_error_still_classified() {
        let err = parse_response(503, b"upstream down").unwrap_err();
        assert!(err.is_retryable());
    }
}
