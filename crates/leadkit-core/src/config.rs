// ── Runtime dashboard configuration ──
//
// Describes where the backend lives and how reads are tuned. Never touches
// disk: the CLI (via leadkit-config) builds a `DashboardConfig` and hands
// it in.

use std::time::Duration;

use leadkit_api::{TlsMode, TransportConfig};
use url::Url;

/// Backend root used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5002";

/// Configuration for a [`Dashboard`](crate::Dashboard).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend root. Requests go to `{api_url}/api/...`.
    pub api_url: Url,
    pub tls: TlsMode,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    /// Extra attempts for a read that failed transiently.
    pub read_retries: u32,
    /// Optional age after which a cached entry counts as stale even
    /// without an explicit invalidation. `None` keeps entries valid until
    /// invalidated.
    pub max_age: Option<Duration>,
}

impl DashboardConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            read_retries: 1,
            max_age: None,
        }
    }

    /// Parse `api_url` and apply defaults for everything else.
    pub fn from_url(api_url: &str) -> Result<Self, crate::CoreError> {
        let url = Url::parse(api_url).map_err(|e| crate::CoreError::Config {
            message: format!("invalid api_url '{api_url}': {e}"),
        })?;
        Ok(Self::new(url))
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_one_retry_and_no_expiry() {
        let config = DashboardConfig::from_url(DEFAULT_API_URL).unwrap();
        assert_eq!(config.read_retries, 1);
        assert!(config.max_age.is_none());
        assert_eq!(config.api_url.as_str(), "http://localhost:5002/");
    }

    #[test]
    fn rejects_relative_url() {
        let err = DashboardConfig::from_url("localhost").unwrap_err();
        assert!(matches!(err, crate::CoreError::Config { .. }));
    }
}
