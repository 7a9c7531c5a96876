// ── Core error types ──
//
// Errors surfaced by leadkit-core. Every public operation of the cache,
// the mutation coordinator and the workflows returns one of these instead
// of panicking. `CoreError` is `Clone` so a single shared fetch can hand
// the same failure to every reader that joined it.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    /// The request never produced a response (connection refused, DNS,
    /// timeout, TLS setup).
    #[error("Cannot reach backend: {message}")]
    Transport { message: String },

    // ── Backend ──────────────────────────────────────────────────────
    /// The backend answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// The backend answered with a body of an unexpected shape.
    #[error("Unexpected response from backend: {message}")]
    Decode { message: String },

    // ── Client-side ──────────────────────────────────────────────────
    /// A workflow operation was invoked in a state that does not allow it.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// HTTP status for backend rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401/403 from the backend. Reported to the caller; the session is
    /// left untouched.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Worth one more attempt for an idempotent read.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The server-provided message for rejections, the display text
    /// otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Logical misuse of a workflow state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Unknown id, or a candidate that was already promoted.
    #[error("Candidate {id} is not available for promotion")]
    UnknownCandidate { id: u64 },

    #[error("Candidate {id} is already being promoted")]
    PromotionInProgress { id: u64 },

    /// The workflow was closed or restarted while a request was pending;
    /// its response was not applied.
    #[error("Workflow was closed before the response arrived")]
    Superseded,
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<leadkit_api::Error> for CoreError {
    fn from(err: leadkit_api::Error) -> Self {
        match err {
            leadkit_api::Error::Transport(ref e) => match e.status() {
                Some(status) => CoreError::Api {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None if e.is_decode() => CoreError::Decode {
                    message: e.to_string(),
                },
                None => CoreError::Transport {
                    message: if e.is_timeout() {
                        "request timed out".into()
                    } else {
                        e.to_string()
                    },
                },
            },
            leadkit_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            leadkit_api::Error::Tls(message) => CoreError::Transport { message },
            leadkit_api::Error::Api { status, message } => CoreError::Api { status, message },
            leadkit_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_status_and_message() {
        let err: CoreError = leadkit_api::Error::Api {
            status: 401,
            message: "Invalid token".into(),
        }
        .into();

        assert_eq!(
            err,
            CoreError::Api {
                status: 401,
                message: "Invalid token".into()
            }
        );
        assert!(err.is_auth_failure());
        assert_eq!(err.user_message(), "Invalid token");
    }

    #[test]
    fn deserialization_maps_to_decode() {
        let err: CoreError = leadkit_api::Error::Deserialization {
            message: "missing field `leads`".into(),
            body: "{}".into(),
        }
        .into();

        assert!(matches!(err, CoreError::Decode { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = CoreError::Api {
            status: 502,
            message: "Bad Gateway".into(),
        };
        assert!(err.is_transient());
        assert!(
            CoreError::Transport {
                message: "refused".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn workflow_error_wraps_transparently() {
        let err: CoreError = WorkflowError::UnknownCandidate { id: 3 }.into();
        assert_eq!(err.to_string(), "Candidate 3 is not available for promotion");
    }
}
