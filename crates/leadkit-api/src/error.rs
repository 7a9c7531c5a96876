use thiserror::Error;

/// Top-level error type for the `leadkit-api` crate.
///
/// Every call made by [`ApiClient`](crate::ApiClient) fails with exactly one
/// of these classes: the request never reached the backend, the backend
/// rejected it, or the backend answered with a body we could not decode.
/// `leadkit-core` maps these into its own clonable error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response. `message` is the server-provided `error` /
    /// `message` field when present, the status text otherwise.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status of a rejected request, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for 401/403 responses.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_classification() {
        let unauthorized = Error::Api {
            status: 401,
            message: "Invalid token".into(),
        };
        assert!(unauthorized.is_auth_failure());
        assert!(!unauthorized.is_transient());

        let unavailable = Error::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(unavailable.is_transient());
        assert!(!unavailable.is_not_found());

        let missing = Error::Api {
            status: 404,
            message: "Form not found".into(),
        };
        assert!(missing.is_not_found());
    }

    #[test]
    fn decode_error_is_not_transient() {
        let err = Error::Deserialization {
            message: "missing field `websites`".into(),
            body: "{}".into(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.status(), None);
    }
}
