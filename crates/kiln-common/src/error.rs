//! Error types for kiln store and reconcile operations
//!
//! Every store error carries the operation ("get", "create", "update",
//! "list") and the resource kind it failed on, so a reconcile failure
//! for one child is attributable without a backtrace.
//!
//! "Not found" is deliberately absent here: a missing child is a normal
//! result (`Ok(None)` from a fetch), not an error.

use std::time::Duration;

use thiserror::Error;

/// Main error type for kiln operations
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent or no response was received
    /// (connection failure, timeout, TLS, auth plumbing).
    #[error("transport failure during {operation} {kind}: {message}")]
    Transport {
        /// Store operation that failed
        operation: &'static str,
        /// Resource kind the operation targeted
        kind: String,
        /// Description of the underlying failure
        message: String,
    },

    /// The API server answered, but with a status outside the expected
    /// set for the operation.
    #[error("unexpected status {code} during {operation} {kind}: {message}")]
    UnexpectedStatus {
        /// Store operation that failed
        operation: &'static str,
        /// Resource kind the operation targeted
        kind: String,
        /// HTTP status code returned by the server
        code: u16,
        /// Server-provided error message
        message: String,
    },

    /// A response body could not be parsed into the expected type.
    #[error("failed to decode {kind}: {message}")]
    Decode {
        /// Resource kind being decoded
        kind: String,
        /// Description of the parse failure
        message: String,
    },

    /// An outgoing representation could not be serialized.
    #[error("failed to encode {kind}: {message}")]
    Encode {
        /// Resource kind being encoded
        kind: String,
        /// Description of the serialization failure
        message: String,
    },

    /// A source object is malformed (e.g. missing name or namespace).
    #[error("invalid app {app}: {message}")]
    Validation {
        /// Name of the offending App, or "<unnamed>"
        app: String,
        /// Description of what is invalid
        message: String,
    },
}

impl Error {
    /// Classify a `kube::Error` from a store call into the kiln taxonomy.
    ///
    /// API errors (the server answered with a non-success status) become
    /// [`Error::UnexpectedStatus`]; serde failures become
    /// [`Error::Encode`] on writes and [`Error::Decode`] otherwise;
    /// everything else is a transport failure.
    pub fn store(operation: &'static str, kind: impl Into<String>, err: kube::Error) -> Self {
        let kind = kind.into();
        match err {
            kube::Error::Api(ae) => Error::UnexpectedStatus {
                operation,
                kind,
                code: ae.code,
                message: ae.message,
            },
            kube::Error::SerdeError(e) if matches!(operation, "create" | "update") => {
                Error::Encode {
                    kind,
                    message: e.to_string(),
                }
            }
            kube::Error::SerdeError(e) => Error::Decode {
                kind,
                message: e.to_string(),
            },
            other => Error::Transport {
                operation,
                kind,
                message: other.to_string(),
            },
        }
    }

    /// Create a transport error for a call that produced no response
    /// within the configured per-call timeout.
    pub fn timeout(operation: &'static str, kind: impl Into<String>, after: Duration) -> Self {
        Error::Transport {
            operation,
            kind: kind.into(),
            message: format!("no response after {after:?}"),
        }
    }

    /// Create a transport error with an explicit message.
    pub fn transport(
        operation: &'static str,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Transport {
            operation,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for a malformed App.
    pub fn validation(app: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            app: app.into(),
            message: message.into(),
        }
    }

    /// The resource kind this error is about, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Error::Transport { kind, .. }
            | Error::UnexpectedStatus { kind, .. }
            | Error::Decode { kind, .. }
            | Error::Encode { kind, .. } => Some(kind),
            Error::Validation { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, message: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: "Conflict".to_string(),
            code,
        })
    }

    #[test]
    fn api_errors_become_unexpected_status() {
        let err = Error::store("update", "Deployment", api_error(409, "resourceVersion is stale"));
        match &err {
            Error::UnexpectedStatus {
                operation,
                kind,
                code,
                message,
            } => {
                assert_eq!(*operation, "update");
                assert_eq!(kind, "Deployment");
                assert_eq!(*code, 409);
                assert!(message.contains("stale"));
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("Deployment"));
    }

    #[test]
    fn serde_errors_classify_by_operation() {
        let bad: Result<serde_json::Value, _> = serde_json::from_str("{");
        let decode = Error::store(
            "get",
            "Service",
            kube::Error::SerdeError(bad.unwrap_err()),
        );
        assert!(matches!(decode, Error::Decode { .. }));

        let bad: Result<serde_json::Value, _> = serde_json::from_str("{");
        let encode = Error::store(
            "create",
            "Service",
            kube::Error::SerdeError(bad.unwrap_err()),
        );
        assert!(matches!(encode, Error::Encode { .. }));
    }

    #[test]
    fn timeout_is_a_transport_failure() {
        let err = Error::timeout("get", "Ingress", Duration::from_secs(30));
        match &err {
            Error::Transport { message, .. } => assert!(message.contains("30s")),
            other => panic!("expected Transport, got {other:?}"),
        }
        assert_eq!(err.kind(), Some("Ingress"));
    }

    #[test]
    fn validation_errors_name_the_app() {
        let err = Error::validation("web", "source has no namespace");
        assert!(err.to_string().contains("web"));
        assert!(err.to_string().contains("no namespace"));
        assert_eq!(err.kind(), None);
    }
}
