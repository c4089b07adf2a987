//! Reachability probing
//!
//! A probe is a HEAD request against a direct media link. Probers never
//! fail: transport errors and timeouts come back as "unreachable".

use crate::utils::short_url;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// User agent sent with probes; some CDNs reject requests without one
const PROBE_USER_AGENT: &str = concat!("linkpick/", env!("CARGO_PKG_VERSION"));

/// Outcome of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStatus {
    /// Whether the link answered with a 2xx status
    pub reachable: bool,
    /// HTTP status, when a response was received at all
    pub status: Option<u16>,
}

impl ProbeStatus {
    /// Probe that never got a response
    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            reachable: false,
            status: None,
        }
    }

    /// Probe that got a response with `status`
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        Self {
            reachable: status >= 200 && status < 300,
            status: Some(status),
        }
    }
}

/// Checks whether a URL currently answers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReachabilityProber: Send + Sync {
    /// Probe `url` without fetching its body.
    async fn probe(&self, url: &str) -> ProbeStatus;
}

/// HEAD-request prober backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Create a prober whose requests give up after `timeout`.
    ///
    /// Redirects are followed (reqwest default policy); the final response
    /// decides reachability.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend init).
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(PROBE_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityProber for HttpProber {
    async fn probe(&self, url: &str) -> ProbeStatus {
        match self.client.head(url).send().await {
            Ok(response) => ProbeStatus::from_status(response.status().as_u16()),
            Err(e) => {
                debug!(url = %short_url(url), timeout = e.is_timeout(), "Probe request failed: {e}");
                ProbeStatus::unreachable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_status_classification() {
        assert!(ProbeStatus::from_status(200).reachable);
        assert!(ProbeStatus::from_status(206).reachable);
        assert!(!ProbeStatus::from_status(302).reachable);
        assert!(!ProbeStatus::from_status(403).reachable);
        assert_eq!(ProbeStatus::unreachable().status, None);
    }

    #[tokio::test]
    async fn test_head_probe_against_live_server() -> Result<(), reqwest::Error> {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok.mp4"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/expired.mp4"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5))?;

        let ok = prober.probe(&format!("{}/ok.mp4", server.uri())).await;
        assert_eq!(ok, ProbeStatus::from_status(200));

        let expired = prober.probe(&format!("{}/expired.mp4", server.uri())).await;
        assert!(!expired.reachable);
        assert_eq!(expired.status, Some(403));
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_server_times_out_as_unreachable() -> Result<(), reqwest::Error> {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_millis(200))?;
        let status = prober.probe(&format!("{}/slow.mp4", server.uri())).await;
        assert_eq!(status, ProbeStatus::unreachable());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_url_is_unreachable() -> Result<(), reqwest::Error> {
        let prober = HttpProber::new(Duration::from_secs(1))?;
        assert_eq!(prober.probe("not a url").await, ProbeStatus::unreachable());
        Ok(())
    }
}
